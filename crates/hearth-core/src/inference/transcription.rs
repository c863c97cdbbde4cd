//! Audio transcription task

use async_trait::async_trait;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::inference::{InferenceTask, TaskContext};
use crate::service::AudioClient;

/// Basic facts about a WAV file
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WavInfo {
    pub sample_rate: u32,
    pub channels: u16,
    pub duration: Duration,
}

/// Read a WAV header, rejecting files the recogniser could not decode.
pub fn probe_wav(bytes: &[u8]) -> Result<WavInfo> {
    let reader = hound::WavReader::new(Cursor::new(bytes))
        .map_err(|e| Error::TranscriptionError(format!("Failed to parse WAV: {}", e)))?;

    let spec = reader.spec();
    let frames = reader.duration();
    let duration = if spec.sample_rate > 0 {
        Duration::from_secs_f64(frames as f64 / spec.sample_rate as f64)
    } else {
        Duration::ZERO
    };

    Ok(WavInfo {
        sample_rate: spec.sample_rate,
        channels: spec.channels,
        duration,
    })
}

/// Transcribe one audio file with the loaded speech model
pub struct TranscriptionTask {
    audio_path: PathBuf,
    client: Arc<dyn AudioClient>,
}

impl TranscriptionTask {
    pub fn new(audio_path: impl Into<PathBuf>, client: Arc<dyn AudioClient>) -> Self {
        Self {
            audio_path: audio_path.into(),
            client,
        }
    }

    pub fn audio_path(&self) -> &Path {
        &self.audio_path
    }
}

#[async_trait]
impl InferenceTask for TranscriptionTask {
    fn name(&self) -> &str {
        "transcription"
    }

    async fn run(&self, ctx: &TaskContext<'_>) -> Result<String> {
        let audio = tokio::fs::read(&self.audio_path).await.map_err(|e| {
            Error::TranscriptionError(format!("Failed to read {:?}: {}", self.audio_path, e))
        })?;

        let is_wav = self
            .audio_path
            .extension()
            .map(|e| e.eq_ignore_ascii_case("wav"))
            .unwrap_or(false);
        if is_wav {
            let info = probe_wav(&audio)?;
            debug!(
                "Audio: {} Hz, {} channel(s), {:.2}s",
                info.sample_rate,
                info.channels,
                info.duration.as_secs_f64()
            );
        }

        let file_name = self
            .audio_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "audio".to_string());

        info!("Starting transcription of {}", file_name);
        let transcription = self
            .client
            .transcribe(ctx.model.id(), &file_name, audio)
            .await?;

        Ok(transcription.text)
    }
}
