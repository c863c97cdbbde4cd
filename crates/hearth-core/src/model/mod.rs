//! Model download progress and loaded-model lifecycle

mod download;
mod handle;

pub use download::{parse_progress_line, DownloadOutcome, DownloadProgress, ProgressTracker};
pub use handle::LoadedModel;
