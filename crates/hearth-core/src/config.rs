//! Run configuration
//!
//! A [`Configuration`] is assembled once at startup from built-in defaults, an
//! optional `hearth.toml` and `HEARTH__*` environment variables, and is then
//! treated as read-only for the rest of the run.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Result;

/// Verbosity requested for the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    #[serde(alias = "info")]
    Information,
    #[serde(alias = "warn")]
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    /// Directive understood by `tracing_subscriber::EnvFilter`
    pub fn as_filter(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Information => "info",
            Self::Warning => "warn",
            Self::Error | Self::Critical => "error",
        }
    }
}

/// Main run configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// Name reported to the model service and used in log output
    pub app_name: String,

    pub log_level: LogLevel,

    /// OpenAI-compatible web service; only started when present
    pub web: Option<WebServiceConfig>,

    pub service: ServiceConfig,

    pub ocr: OcrConfig,

    pub pdf: PdfConfig,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            app_name: default_app_name(),
            log_level: LogLevel::default(),
            web: None,
            service: ServiceConfig::default(),
            ocr: OcrConfig::default(),
            pdf: PdfConfig::default(),
        }
    }
}

impl Configuration {
    /// Load configuration layers.
    ///
    /// `path` overrides the default `hearth.toml` location; when given, the
    /// file must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        builder = match path {
            Some(p) => builder.add_source(config::File::from(p).required(true)),
            None => match default_config_path() {
                Some(p) => builder.add_source(config::File::from(p).required(false)),
                None => builder,
            },
        };

        let settings = builder
            .add_source(config::Environment::with_prefix("HEARTH").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn with_app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = app_name.into();
        self
    }

    pub fn with_log_level(mut self, log_level: LogLevel) -> Self {
        self.log_level = log_level;
        self
    }

    pub fn with_web_service(mut self, urls: impl Into<String>) -> Self {
        self.web = Some(WebServiceConfig { urls: urls.into() });
        self
    }
}

/// Bind address of the OpenAI-compatible web service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebServiceConfig {
    pub urls: String,
}

impl WebServiceConfig {
    /// Base URL for OpenAI-style routes
    pub fn api_base(&self) -> String {
        format!("{}/v1", self.urls.trim_end_matches('/'))
    }
}

/// Model management service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Management REST endpoint of the local model service
    pub endpoint: String,

    /// Per-request timeout; downloads of large variants can take a while
    pub request_timeout_secs: u64,

    /// Program and arguments that start the web service; `{urls}` becomes the bind address
    pub start_command: Vec<String>,

    /// Run when the start command returned before the service it launched
    pub stop_command: Vec<String>,

    /// How long to wait for a freshly started web service to answer
    pub startup_timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:5273".to_string(),
            request_timeout_secs: 3600,
            start_command: vec![
                "foundry".to_string(),
                "service".to_string(),
                "start".to_string(),
                "--urls".to_string(),
                "{urls}".to_string(),
            ],
            stop_command: vec![
                "foundry".to_string(),
                "service".to_string(),
                "stop".to_string(),
            ],
            startup_timeout_secs: 30,
        }
    }
}

impl ServiceConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn startup_timeout(&self) -> Duration {
        Duration::from_secs(self.startup_timeout_secs)
    }
}

/// External OCR binary
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    pub binary: PathBuf,
    pub language: String,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("tesseract"),
            language: "eng".to_string(),
        }
    }
}

/// External PDF page renderer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    pub binary: PathBuf,
    pub dpi: u32,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("pdftoppm"),
            dpi: 300,
        }
    }
}

fn default_app_name() -> String {
    "hearth".to_string()
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("hearth").join("hearth.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Configuration::default();
        assert_eq!(config.app_name, "hearth");
        assert_eq!(config.log_level, LogLevel::Information);
        assert!(config.web.is_none());
        assert_eq!(config.ocr.language, "eng");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
app_name = "ocr-run"
log_level = "debug"

[web]
urls = "http://127.0.0.1:55588"

[ocr]
language = "deu"
"#
        )
        .unwrap();

        let config = Configuration::load(Some(file.path())).unwrap();
        assert_eq!(config.app_name, "ocr-run");
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(
            config.web.as_ref().map(|w| w.api_base()),
            Some("http://127.0.0.1:55588/v1".to_string())
        );
        assert_eq!(config.ocr.language, "deu");
        assert_eq!(config.pdf.dpi, 300);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        assert!(Configuration::load(Some(&missing)).is_err());
    }

    #[test]
    fn test_log_level_filters() {
        assert_eq!(LogLevel::Information.as_filter(), "info");
        assert_eq!(LogLevel::Critical.as_filter(), "error");
    }
}
