//! Local model service interfaces
//!
//! [`ModelService`] covers catalog, download and load lifecycle plus the
//! OpenAI-compatible web service; [`AudioClient`] covers transcription. Both
//! are implemented over HTTP by [`FoundryClient`] and can be replaced by
//! in-memory fakes in tests.

mod foundry;
mod web;

pub use foundry::FoundryClient;
pub use web::LocalWebService;

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedSender;

use crate::catalog::{Catalog, ModelVariant};
use crate::config::WebServiceConfig;
use crate::error::Result;
use crate::model::DownloadProgress;

/// Sink for raw progress values reported while a download runs
pub type ProgressSender = UnboundedSender<DownloadProgress>;

#[async_trait]
pub trait ModelService: Send + Sync {
    /// Fetch the current catalog, with `cached` set on downloaded variants.
    async fn catalog(&self) -> Result<Catalog>;

    /// Download a variant. Raw progress goes to `progress`; callers must not
    /// assume it is ordered or that it reaches 100.
    async fn download(&self, variant: &ModelVariant, progress: ProgressSender) -> Result<()>;

    async fn load(&self, variant: &ModelVariant) -> Result<()>;

    async fn unload(&self, variant: &ModelVariant) -> Result<()>;

    /// Make the web service reachable at `web.urls`.
    ///
    /// Returns `true` when this call started it, meaning the caller owns it
    /// and must stop it.
    async fn start_web_service(&self, web: &WebServiceConfig) -> Result<bool>;

    async fn stop_web_service(&self) -> Result<()>;
}

/// Recognised speech for one audio file
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct Transcription {
    pub text: String,
}

#[async_trait]
pub trait AudioClient: Send + Sync {
    async fn transcribe(
        &self,
        model_id: &str,
        file_name: &str,
        audio: Vec<u8>,
    ) -> Result<Transcription>;
}
