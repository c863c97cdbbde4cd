//! Download progress events
//!
//! The service reports progress as free-form text. [`ProgressTracker`] turns
//! raw percentages into a well-behaved sequence: clamped to `0..=100`, never
//! decreasing, and always ending at exactly `100`.

use serde::Deserialize;

/// Progress update for a model download
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DownloadProgress {
    pub percent: f32,
}

impl DownloadProgress {
    pub fn is_complete(&self) -> bool {
        self.percent >= 100.0
    }
}

/// Normalises raw percentages reported during a download
#[derive(Debug, Default)]
pub struct ProgressTracker {
    last: Option<f32>,
    finished: bool,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept a raw value. Returns an event only when progress moved forward.
    pub fn observe(&mut self, raw: f32) -> Option<DownloadProgress> {
        if self.finished || raw.is_nan() {
            return None;
        }

        let percent = raw.clamp(0.0, 100.0);
        if let Some(last) = self.last {
            if percent <= last {
                return None;
            }
        }

        self.last = Some(percent);
        if percent >= 100.0 {
            self.finished = true;
        }
        Some(DownloadProgress { percent })
    }

    /// Terminal event, unless `100` was already emitted.
    pub fn finish(&mut self) -> Option<DownloadProgress> {
        if self.finished {
            return None;
        }
        self.finished = true;
        self.last = Some(100.0);
        Some(DownloadProgress { percent: 100.0 })
    }

    pub fn last(&self) -> Option<f32> {
        self.last
    }
}

/// Pull the last `NN.NN%` figure out of a progress line.
pub fn parse_progress_line(line: &str) -> Option<f32> {
    line.match_indices('%')
        .filter_map(|(idx, _)| {
            let head = &line[..idx];
            let start = head
                .char_indices()
                .rev()
                .find(|(_, c)| !(c.is_ascii_digit() || *c == '.'))
                .map(|(i, c)| i + c.len_utf8())
                .unwrap_or(0);
            head[start..].parse::<f32>().ok()
        })
        .last()
}

/// Final status object the service writes after the progress lines
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadOutcome {
    pub success: bool,
    #[serde(default)]
    pub error_message: Option<String>,
}

impl DownloadOutcome {
    /// Try to read a status object from a (possibly noisy) line.
    pub fn from_line(line: &str) -> Option<Self> {
        let start = line.find('{')?;
        serde_json::from_str(&line[start..]).ok()
    }
}
