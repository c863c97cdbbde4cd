//! Document text extraction: render PDF pages, OCR each one.
//!
//! All intermediate files live in a per-run `ocr_*` scratch directory that is
//! removed when extraction returns, whether it succeeded or not.

mod ocr;
mod render;

pub use ocr::{OcrEngine, TesseractOcr};
pub use render::{PageRange, PageRenderer, PdftoppmRenderer, RenderedPage};

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::{Error, Result};

/// What to do when OCR fails for a single page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OcrFailurePolicy {
    /// Log the failure and continue with the remaining pages
    #[default]
    Skip,
    /// Stop at the first failing page
    Abort,
}

/// Recognised text of one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    pub number: u32,
    pub text: String,
}

/// Text recovered from a page range
#[derive(Debug, Clone, Default)]
pub struct ExtractedText {
    pub pages: Vec<PageText>,
    /// Pages whose OCR failed under [`OcrFailurePolicy::Skip`]
    pub skipped: Vec<u32>,
}

impl ExtractedText {
    /// Concatenate pages under `--- Page N ---` headers
    pub fn to_manual(&self) -> String {
        let mut manual = String::new();
        for page in &self.pages {
            let _ = writeln!(manual, "\n--- Page {} ---", page.number);
            let _ = writeln!(manual, "{}", page.text);
        }
        manual
    }
}

/// Renders pages and runs OCR on them
pub struct TextExtractor {
    renderer: Box<dyn PageRenderer>,
    ocr: Box<dyn OcrEngine>,
    policy: OcrFailurePolicy,
    scratch_root: Option<PathBuf>,
}

impl TextExtractor {
    pub fn new(renderer: Box<dyn PageRenderer>, ocr: Box<dyn OcrEngine>) -> Self {
        Self {
            renderer,
            ocr,
            policy: OcrFailurePolicy::default(),
            scratch_root: None,
        }
    }

    pub fn with_policy(mut self, policy: OcrFailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Create scratch directories under `root` instead of the system temp dir
    pub fn with_scratch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.scratch_root = Some(root.into());
        self
    }

    pub async fn extract(&self, pdf: &Path, pages: PageRange) -> Result<ExtractedText> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("ocr_");
        let scratch = match &self.scratch_root {
            Some(root) => builder.tempdir_in(root)?,
            None => builder.tempdir()?,
        };

        // `scratch` is removed on drop if anything below bails out early
        let extracted = self.extract_into(pdf, pages, scratch.path()).await?;
        scratch.close()?;
        Ok(extracted)
    }

    async fn extract_into(&self, pdf: &Path, pages: PageRange, dir: &Path) -> Result<ExtractedText> {
        let rendered = self.renderer.render(pdf, pages, dir).await?;
        let total = rendered.len();
        let mut extracted = ExtractedText::default();

        for (idx, page) in rendered.iter().enumerate() {
            info!("Processing page {} ({}/{})", page.number, idx + 1, total);

            match self.ocr.recognize(&page.path, page.number).await {
                Ok(text) => extracted.pages.push(PageText {
                    number: page.number,
                    text,
                }),
                Err(e) if self.policy == OcrFailurePolicy::Skip => {
                    warn!("Skipping page {}: {}", page.number, e);
                    extracted.skipped.push(page.number);
                }
                Err(e) => return Err(e),
            }
        }

        if extracted.pages.is_empty() {
            return Err(Error::ocr(
                pages.first,
                format!("no text recovered from pages {}", pages),
            ));
        }

        Ok(extracted)
    }
}
