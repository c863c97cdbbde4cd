use anyhow::Context;
use std::path::PathBuf;
use std::sync::Arc;

use hearth_core::{
    on_device, Configuration, DeviceType, DocumentQaTask, FoundryClient, ModelRequest,
    OcrFailurePolicy, OpenAiChatClient, Orchestrator, PageRange, PdftoppmRenderer, TesseractOcr,
    TextExtractor, TranscriptionTask,
};

use crate::progress;

pub async fn list_models(config: Configuration) -> anyhow::Result<()> {
    let service = FoundryClient::new(&config)?;
    let catalog = Orchestrator::new(&service, &config).catalog().await?;

    println!("Models available: {}", catalog.len());
    for model in catalog.list_models() {
        let devices: Vec<String> = model
            .variants
            .iter()
            .map(|v| {
                v.device_type()
                    .map_or_else(|| "unknown".to_string(), |d| d.to_string())
            })
            .collect();
        println!("  {:<24} {}", model.alias, devices.join(", "));
    }
    Ok(())
}

pub async fn transcribe(
    config: Configuration,
    model: &str,
    device: DeviceType,
    audio: PathBuf,
) -> anyhow::Result<()> {
    let service = Arc::new(FoundryClient::new(&config)?);
    let task = TranscriptionTask::new(&audio, service.clone());
    let request = ModelRequest::new(model, on_device(device));

    let (tx, reporter) = progress::spawn_reporter(model);
    let result = Orchestrator::new(service.as_ref(), &config)
        .run(&request, &task, Some(tx))
        .await;
    let _ = reporter.await;

    let text = result.with_context(|| format!("transcribing {}", audio.display()))?;
    println!("{text}");
    Ok(())
}

pub struct AskArgs {
    pub pdf: PathBuf,
    pub first_page: u32,
    pub last_page: u32,
    pub question: String,
    pub model: String,
    pub device: DeviceType,
    pub policy: OcrFailurePolicy,
}

pub async fn ask(config: Configuration, args: AskArgs) -> anyhow::Result<()> {
    let pages = PageRange::new(args.first_page, args.last_page)?;
    let web = config
        .web
        .clone()
        .context("web service address is required for document questions")?;

    let service = FoundryClient::new(&config)?;
    let chat = OpenAiChatClient::new(web.api_base(), config.service.request_timeout())?;
    let extractor = TextExtractor::new(
        Box::new(PdftoppmRenderer::new(&config.pdf)),
        Box::new(TesseractOcr::new(&config.ocr)),
    )
    .with_policy(args.policy);

    let task = DocumentQaTask::new(&args.pdf, pages, &args.question, extractor, Box::new(chat));
    let request = ModelRequest::new(&args.model, on_device(args.device));

    let (tx, reporter) = progress::spawn_reporter(&args.model);
    let result = Orchestrator::new(&service, &config)
        .run(&request, &task, Some(tx))
        .await;
    let _ = reporter.await;

    let answer = result.with_context(|| format!("answering from {}", args.pdf.display()))?;
    println!("Answer:\n=======\n{answer}");
    Ok(())
}
