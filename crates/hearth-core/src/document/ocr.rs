//! OCR bridge
//! Runs the external tesseract binary on one page image at a time

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use crate::config::OcrConfig;
use crate::error::{Error, Result};

#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Recognise the text of a single page image.
    async fn recognize(&self, image: &Path, page: u32) -> Result<String>;
}

/// Tesseract command-line OCR
pub struct TesseractOcr {
    binary: PathBuf,
    language: String,
}

impl TesseractOcr {
    pub fn new(config: &OcrConfig) -> Self {
        Self {
            binary: config.binary.clone(),
            language: config.language.clone(),
        }
    }
}

#[async_trait]
impl OcrEngine for TesseractOcr {
    async fn recognize(&self, image: &Path, page: u32) -> Result<String> {
        // tesseract appends ".txt" to the output stem itself
        let stem = image.with_extension("");
        let text_file = stem.with_extension("txt");

        debug!("Running OCR on {:?}", image);

        let output = Command::new(&self.binary)
            .arg(image)
            .arg(&stem)
            .arg("-l")
            .arg(&self.language)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| Error::ocr(page, format!("Failed to start tesseract: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::ocr(page, format!("tesseract error: {}", stderr.trim())));
        }

        tokio::fs::read_to_string(&text_file)
            .await
            .map_err(|e| Error::ocr(page, format!("No OCR output at {:?}: {}", text_file, e)))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    /// `/bin/sh` reads the "image" as a script, so `$1` is the output stem.
    fn scripted_page(dir: &Path, name: &str, script: &str) -> (TesseractOcr, PathBuf) {
        let image = dir.join(name);
        std::fs::write(&image, script).unwrap();
        let ocr = TesseractOcr::new(&OcrConfig {
            binary: PathBuf::from("/bin/sh"),
            language: "eng".to_string(),
        });
        (ocr, image)
    }

    #[tokio::test]
    async fn test_reads_output_text_file() {
        let dir = tempfile::tempdir().unwrap();
        let (ocr, image) = scripted_page(
            dir.path(),
            "page-13.png",
            r#"printf 'POWER button\n' > "$1.txt""#,
        );

        let text = ocr.recognize(&image, 13).await.unwrap();
        assert_eq!(text, "POWER button\n");
    }

    #[tokio::test]
    async fn test_failed_run_is_ocr_error() {
        let dir = tempfile::tempdir().unwrap();
        let (ocr, image) = scripted_page(
            dir.path(),
            "page-2.png",
            "echo 'cannot read image' >&2; exit 1",
        );

        let err = ocr.recognize(&image, 2).await.unwrap_err();
        assert!(matches!(
            err,
            Error::OcrError { page: 2, ref message } if message.contains("cannot read image")
        ));
    }

    #[tokio::test]
    async fn test_missing_output_is_ocr_error() {
        let dir = tempfile::tempdir().unwrap();
        let (ocr, image) = scripted_page(dir.path(), "page-7.png", "exit 0");

        assert!(matches!(
            ocr.recognize(&image, 7).await,
            Err(Error::OcrError { page: 7, .. })
        ));
    }
}
