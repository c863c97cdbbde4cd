//! Inference tasks run against a loaded model

pub mod chat;
mod document_qa;
mod transcription;

pub use chat::{ChatClient, ChatMessage, OpenAiChatClient, Role};
pub use document_qa::{build_messages, DocumentQaTask};
pub use transcription::{probe_wav, TranscriptionTask, WavInfo};

use async_trait::async_trait;

use crate::config::WebServiceConfig;
use crate::error::Result;
use crate::model::LoadedModel;

/// What a task may use while it runs
pub struct TaskContext<'a> {
    pub model: &'a LoadedModel,
    /// Present when the web service is up for this run
    pub web: Option<&'a WebServiceConfig>,
}

/// A single capability invoked on a loaded model
#[async_trait]
pub trait InferenceTask: Send + Sync {
    fn name(&self) -> &str;

    async fn run(&self, ctx: &TaskContext<'_>) -> Result<String>;
}
