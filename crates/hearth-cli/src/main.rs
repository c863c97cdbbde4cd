//! Hearth CLI - run one task on a locally hosted model
//!
//! Examples:
//!   hearth models                          # List catalog aliases
//!   hearth transcribe one-sheep.wav        # Speech to text with whisper-tiny
//!   hearth ask --pdf manual.pdf            # OCR pages 13-15 and ask phi-4 about them

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use hearth_core::{Configuration, DeviceType, LogLevel, OcrFailurePolicy};

/// Web service bind address used when neither the flag nor the config sets one
const DEFAULT_WEB_URL: &str = "http://127.0.0.1:55588";

mod commands;
mod logging;
mod progress;

#[derive(Parser)]
#[command(
    name = "hearth",
    about = "Run one inference task on a locally hosted model",
    version = env!("CARGO_PKG_VERSION"),
    arg_required_else_help = true,
    propagate_version = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Management endpoint of the local model service
    #[arg(long, global = true, value_name = "URL", env = "HEARTH_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Log level (overridden by RUST_LOG)
    #[arg(long, global = true, value_enum)]
    pub log_level: Option<LogLevelArg>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the models offered by the catalog
    #[command(name = "models", visible_alias = "list-models")]
    Models,

    /// Transcribe an audio file
    #[command(name = "transcribe")]
    Transcribe {
        /// Audio file to transcribe
        #[arg(default_value = "one-sheep-converted.wav")]
        audio: PathBuf,

        /// Model alias
        #[arg(short, long, default_value = "whisper-tiny")]
        model: String,

        /// Hardware variant to use
        #[arg(short, long, value_enum, default_value = "cpu")]
        device: DeviceArg,
    },

    /// Answer a question about pages of a PDF using OCR and a chat model
    #[command(name = "ask")]
    Ask {
        /// PDF to read
        #[arg(long, default_value = "epsonManual.pdf")]
        pdf: PathBuf,

        /// First page (1-based, inclusive)
        #[arg(long, default_value = "13")]
        first_page: u32,

        /// Last page (1-based, inclusive)
        #[arg(long, default_value = "15")]
        last_page: u32,

        /// Question to ask about the pages
        #[arg(
            short,
            long,
            default_value = "Tell me about each control panel button and light?"
        )]
        question: String,

        /// Model alias
        #[arg(short, long, default_value = "phi-4")]
        model: String,

        /// Hardware variant to use
        #[arg(short, long, value_enum, default_value = "cpu")]
        device: DeviceArg,

        /// Bind address for the OpenAI-compatible web service
        /// [default: `web.urls` from config, else http://127.0.0.1:55588]
        #[arg(long, value_name = "URL")]
        web_url: Option<String>,

        /// What to do when OCR fails on a page
        #[arg(long, value_enum, default_value = "skip")]
        on_ocr_error: OcrPolicyArg,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DeviceArg {
    Cpu,
    Gpu,
    Npu,
}

impl From<DeviceArg> for DeviceType {
    fn from(arg: DeviceArg) -> Self {
        match arg {
            DeviceArg::Cpu => DeviceType::Cpu,
            DeviceArg::Gpu => DeviceType::Gpu,
            DeviceArg::Npu => DeviceType::Npu,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OcrPolicyArg {
    Skip,
    Abort,
}

impl From<OcrPolicyArg> for OcrFailurePolicy {
    fn from(arg: OcrPolicyArg) -> Self {
        match arg {
            OcrPolicyArg::Skip => OcrFailurePolicy::Skip,
            OcrPolicyArg::Abort => OcrFailurePolicy::Abort,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevelArg> for LogLevel {
    fn from(arg: LogLevelArg) -> Self {
        match arg {
            LogLevelArg::Trace => LogLevel::Trace,
            LogLevelArg::Debug => LogLevel::Debug,
            LogLevelArg::Info => LogLevel::Information,
            LogLevelArg::Warn => LogLevel::Warning,
            LogLevelArg::Error => LogLevel::Error,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let app_name = match &cli.command {
        Commands::Models => "hearth-models",
        Commands::Transcribe { .. } => "hearth-transcribe",
        Commands::Ask { .. } => "hearth-ocr",
    };

    let mut config = Configuration::load(cli.config.as_deref())?.with_app_name(app_name);
    if let Some(level) = cli.log_level {
        config = config.with_log_level(level.into());
    }
    if let Some(endpoint) = cli.endpoint {
        config.service.endpoint = endpoint;
    }

    logging::init(&config);

    match cli.command {
        Commands::Models => commands::list_models(config).await,
        Commands::Transcribe {
            audio,
            model,
            device,
        } => commands::transcribe(config, &model, device.into(), audio).await,
        Commands::Ask {
            pdf,
            first_page,
            last_page,
            question,
            model,
            device,
            web_url,
            on_ocr_error,
        } => {
            let config = with_web_url(config, web_url);
            commands::ask(
                config,
                commands::AskArgs {
                    pdf,
                    first_page,
                    last_page,
                    question,
                    model,
                    device: device.into(),
                    policy: on_ocr_error.into(),
                },
            )
            .await
        }
    }
}

/// Flag first, then the configured `[web] urls`, then the built-in address
fn with_web_url(config: Configuration, flag: Option<String>) -> Configuration {
    if let Some(urls) = flag {
        return config.with_web_service(urls);
    }
    if config.web.is_some() {
        config
    } else {
        config.with_web_service(DEFAULT_WEB_URL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_ask_defaults() {
        let cli = Cli::try_parse_from(["hearth", "ask"]).unwrap();
        match cli.command {
            Commands::Ask {
                first_page,
                last_page,
                model,
                web_url,
                ..
            } => {
                assert_eq!((first_page, last_page), (13, 15));
                assert_eq!(model, "phi-4");
                assert_eq!(web_url, None);
            }
            _ => panic!("expected ask"),
        }
    }

    #[test]
    fn test_web_url_precedence() {
        let configured = Configuration::default().with_web_service("http://127.0.0.1:6000");

        let kept = with_web_url(configured.clone(), None);
        assert_eq!(kept.web.unwrap().urls, "http://127.0.0.1:6000");

        let flagged = with_web_url(configured, Some("http://127.0.0.1:7000".to_string()));
        assert_eq!(flagged.web.unwrap().urls, "http://127.0.0.1:7000");

        let fallback = with_web_url(Configuration::default(), None);
        assert_eq!(fallback.web.unwrap().urls, DEFAULT_WEB_URL);
    }

    #[test]
    fn test_list_models_alias() {
        let cli = Cli::try_parse_from(["hearth", "list-models"]).unwrap();
        assert!(matches!(cli.command, Commands::Models));
    }

    #[test]
    fn test_transcribe_flags() {
        let cli =
            Cli::try_parse_from(["hearth", "transcribe", "clip.wav", "--device", "gpu"]).unwrap();
        match cli.command {
            Commands::Transcribe { audio, device, .. } => {
                assert_eq!(audio, PathBuf::from("clip.wav"));
                assert_eq!(DeviceType::from(device), DeviceType::Gpu);
            }
            _ => panic!("expected transcribe"),
        }
    }
}
