use hearth_core::DownloadProgress;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::StreamExt;

/// Download progress bar fed from the orchestrator's progress channel.
///
/// Dropping the sender ends the reporter task.
pub fn spawn_reporter(
    model: &str,
) -> (mpsc::UnboundedSender<DownloadProgress>, JoinHandle<()>) {
    let (tx, rx) = mpsc::unbounded_channel::<DownloadProgress>();

    let pb = ProgressBar::new(100);
    if let Ok(style) =
        ProgressStyle::default_bar().template("{msg} [{bar:40.green/white}] {pos:>3}%")
    {
        pb.set_style(style.progress_chars("=> "));
    }
    pb.set_message(format!("Downloading {model}"));

    let handle = tokio::spawn(async move {
        let mut events = UnboundedReceiverStream::new(rx);
        while let Some(event) = events.next().await {
            pb.set_position(event.percent.round() as u64);
            if event.is_complete() {
                pb.finish_with_message("Download complete");
            }
        }
        if !pb.is_finished() {
            pb.abandon();
        }
    });

    (tx, handle)
}
