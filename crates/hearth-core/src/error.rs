//! Error types for Hearth model tasks

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("No variant of {0} matches the requested hardware")]
    NoMatchingVariant(String),

    #[error("Download failed: {0}")]
    DownloadError(String),

    #[error("Model loading failed: {0}")]
    LoadError(String),

    #[error("Transcription failed: {0}")]
    TranscriptionError(String),

    #[error("OCR failed for page {page}: {message}")]
    OcrError { page: u32, message: String },

    #[error("Chat completion failed: {0}")]
    ChatCompletionError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Local service error: {0}")]
    ServiceError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn ocr(page: u32, message: impl Into<String>) -> Self {
        Error::OcrError {
            page,
            message: message.into(),
        }
    }
}

impl From<config::ConfigError> for Error {
    fn from(e: config::ConfigError) -> Self {
        Error::ConfigError(e.to_string())
    }
}
