//! Hearth Core - one-shot tasks on locally hosted models
//!
//! Drives a local model service through a fixed sequence: resolve a model in
//! the catalog, pick a hardware variant, download and load it, run exactly one
//! inference task, then unload it and stop anything the run started.
//!
//! # Example
//!
//! ```ignore
//! use hearth_core::{
//!     on_device, Configuration, DeviceType, FoundryClient, ModelRequest, Orchestrator,
//!     TranscriptionTask,
//! };
//! use std::sync::Arc;
//!
//! let config = Configuration::load(None)?;
//! let service = Arc::new(FoundryClient::new(&config)?);
//! let task = TranscriptionTask::new("one-sheep.wav", service.clone());
//! let request = ModelRequest::new("whisper-tiny", on_device(DeviceType::Cpu));
//!
//! let text = Orchestrator::new(service.as_ref(), &config)
//!     .run(&request, &task, None)
//!     .await?;
//! ```

pub mod catalog;
pub mod config;
pub mod document;
pub mod error;
pub mod inference;
pub mod model;
pub mod orchestrator;
pub mod service;

pub use catalog::{any_variant, on_device, Catalog, DeviceType, ModelDescriptor, ModelVariant};
pub use config::{Configuration, LogLevel, WebServiceConfig};
pub use document::{OcrFailurePolicy, PageRange, PdftoppmRenderer, TesseractOcr, TextExtractor};
pub use error::{Error, Result};
pub use inference::{
    ChatClient, ChatMessage, DocumentQaTask, InferenceTask, OpenAiChatClient, TaskContext,
    TranscriptionTask,
};
pub use model::{DownloadProgress, LoadedModel};
pub use orchestrator::{ModelRequest, Orchestrator};
pub use service::{AudioClient, FoundryClient, ModelService, ProgressSender};
