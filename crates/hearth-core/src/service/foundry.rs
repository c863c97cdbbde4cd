//! HTTP client for the local model service's management API

use async_stream::try_stream;
use async_trait::async_trait;
use bytes::{Buf, BytesMut};
use futures::{pin_mut, Stream, StreamExt};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::catalog::{Catalog, ModelVariant};
use crate::config::{Configuration, WebServiceConfig};
use crate::error::{Error, Result};
use crate::model::{parse_progress_line, DownloadOutcome, DownloadProgress};
use crate::service::web::LocalWebService;
use crate::service::{AudioClient, ModelService, ProgressSender, Transcription};

/// Seconds an idle loaded model stays resident on the service
const LOAD_TTL_SECS: u64 = 600;

/// Download request body understood by the service
#[derive(Debug, Serialize)]
struct DownloadRequest<'a> {
    model: DownloadModel<'a>,
    #[serde(rename = "IgnorePipeReport")]
    ignore_pipe_report: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct DownloadModel<'a> {
    name: &'a str,
    uri: Option<&'a str>,
    publisher: Option<&'a str>,
    provider_type: Option<&'a str>,
    prompt_template: Option<&'a serde_json::Value>,
}

/// Talks to the model service over its REST endpoint
pub struct FoundryClient {
    http: Client,
    endpoint: String,
    app_name: String,
    web: LocalWebService,
}

impl FoundryClient {
    pub fn new(config: &Configuration) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.service.request_timeout())
            .user_agent(format!("{}/{}", config.app_name, env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::ServiceError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            web: LocalWebService::new(&config.service, http.clone()),
            http,
            endpoint: config.service.endpoint.trim_end_matches('/').to_string(),
            app_name: config.app_name.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.http.get(self.url(path)).send().await?;
        let response = ensure_success(response)
            .await
            .map_err(Error::ServiceError)?;
        Ok(response.json().await?)
    }

    /// Ids of variants already present in the local cache
    pub async fn cached_models(&self) -> Result<Vec<String>> {
        self.get_json("/openai/models").await
    }
}

#[async_trait]
impl ModelService for FoundryClient {
    async fn catalog(&self) -> Result<Catalog> {
        debug!("Fetching catalog for {}", self.app_name);
        let mut variants: Vec<ModelVariant> = self.get_json("/foundry/list").await?;

        let cached = self.cached_models().await?;
        for variant in &mut variants {
            variant.cached = cached.iter().any(|id| id.eq_ignore_ascii_case(&variant.id));
        }

        Ok(Catalog::from_variants(variants))
    }

    async fn download(&self, variant: &ModelVariant, progress: ProgressSender) -> Result<()> {
        info!("Downloading {}", variant.id);

        let body = DownloadRequest {
            model: DownloadModel {
                name: &variant.id,
                uri: variant.uri.as_deref(),
                publisher: variant.publisher.as_deref(),
                provider_type: variant.provider_type.as_deref(),
                prompt_template: variant.prompt_template.as_ref(),
            },
            ignore_pipe_report: true,
        };

        let response = self
            .http
            .post(self.url("/openai/download"))
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::DownloadError(e.to_string()))?;
        let response = ensure_success(response)
            .await
            .map_err(Error::DownloadError)?;

        let mut outcome = None;
        let lines = body_lines(response);
        pin_mut!(lines);
        while let Some(line) = lines.next().await {
            let line = line.map_err(|e| Error::DownloadError(e.to_string()))?;

            if let Some(status) = DownloadOutcome::from_line(&line) {
                outcome = Some(status);
            } else if let Some(percent) = parse_progress_line(&line) {
                // Receiver may have gone away; the download itself still counts.
                let _ = progress.send(DownloadProgress { percent });
            }
        }

        match outcome {
            Some(status) if !status.success => Err(Error::DownloadError(
                status
                    .error_message
                    .unwrap_or_else(|| format!("service rejected download of {}", variant.id)),
            )),
            Some(_) => Ok(()),
            None => {
                warn!("Download of {} finished without a status report", variant.id);
                Ok(())
            }
        }
    }

    async fn load(&self, variant: &ModelVariant) -> Result<()> {
        info!("Loading model {}", variant.id);

        let mut request = self
            .http
            .get(self.url(&format!("/openai/load/{}", variant.id)))
            .query(&[("ttl", LOAD_TTL_SECS.to_string())]);
        if let Some(ep) = variant
            .runtime
            .as_ref()
            .and_then(|r| r.execution_provider.as_deref())
        {
            request = request.query(&[("ep", ep)]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::LoadError(e.to_string()))?;
        ensure_success(response).await.map_err(Error::LoadError)?;

        info!("Model {} loaded successfully", variant.id);
        Ok(())
    }

    async fn unload(&self, variant: &ModelVariant) -> Result<()> {
        let response = self
            .http
            .get(self.url(&format!("/openai/unload/{}", variant.id)))
            .query(&[("force", "true")])
            .send()
            .await?;
        ensure_success(response)
            .await
            .map_err(Error::ServiceError)?;
        Ok(())
    }

    async fn start_web_service(&self, web: &WebServiceConfig) -> Result<bool> {
        self.web.start(web).await
    }

    async fn stop_web_service(&self) -> Result<()> {
        self.web.stop().await
    }
}

#[async_trait]
impl AudioClient for FoundryClient {
    async fn transcribe(
        &self,
        model_id: &str,
        file_name: &str,
        audio: Vec<u8>,
    ) -> Result<Transcription> {
        let part = Part::bytes(audio).file_name(file_name.to_string());
        let form = Form::new()
            .text("model", model_id.to_string())
            .part("file", part);

        let response = self
            .http
            .post(self.url("/v1/audio/transcriptions"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::TranscriptionError(e.to_string()))?;
        let response = ensure_success(response)
            .await
            .map_err(Error::TranscriptionError)?;

        response
            .json()
            .await
            .map_err(|e| Error::TranscriptionError(format!("Invalid response: {}", e)))
    }
}

/// Pass through successful responses, otherwise describe the failure
async fn ensure_success(response: Response) -> std::result::Result<Response, String> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let url = response.url().to_string();
    let body = response.text().await.unwrap_or_default();
    Err(format!("HTTP {} for {}: {}", status, url, body.trim()))
}

/// Split a streamed response body into trimmed, non-empty lines.
///
/// Progress updates end in `\r` as often as `\n`, so both count as breaks.
fn body_lines(response: Response) -> impl Stream<Item = reqwest::Result<String>> {
    try_stream! {
        let mut buffer = BytesMut::new();
        let chunks = response.bytes_stream();
        pin_mut!(chunks);

        while let Some(chunk) = chunks.next().await {
            buffer.extend_from_slice(&chunk?);
            while let Some(pos) = buffer.iter().position(|b| *b == b'\n' || *b == b'\r') {
                let line = buffer.split_to(pos);
                buffer.advance(1);
                let text = String::from_utf8_lossy(&line).trim().to_string();
                if !text.is_empty() {
                    yield text;
                }
            }
        }

        let rest = String::from_utf8_lossy(&buffer).trim().to_string();
        if !rest.is_empty() {
            yield rest;
        }
    }
}
