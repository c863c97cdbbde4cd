//! PDF page rendering through an external rasterizer

use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use crate::config::PdfConfig;
use crate::error::{Error, Result};

/// File name prefix for rendered pages
const PAGE_PREFIX: &str = "page";

/// Inclusive, 1-based range of PDF pages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    pub first: u32,
    pub last: u32,
}

impl PageRange {
    pub fn new(first: u32, last: u32) -> Result<Self> {
        if first == 0 || last < first {
            return Err(Error::ConfigError(format!(
                "invalid page range {}-{}",
                first, last
            )));
        }
        Ok(Self { first, last })
    }

    pub fn page_count(&self) -> usize {
        (self.last - self.first + 1) as usize
    }

    pub fn pages(&self) -> impl Iterator<Item = u32> {
        self.first..=self.last
    }
}

impl fmt::Display for PageRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.first, self.last)
    }
}

/// One page written to disk as an image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    pub number: u32,
    pub path: PathBuf,
}

#[async_trait]
pub trait PageRenderer: Send + Sync {
    /// Render `pages` of `pdf` as images inside `out_dir`, ordered by page number.
    async fn render(&self, pdf: &Path, pages: PageRange, out_dir: &Path)
        -> Result<Vec<RenderedPage>>;
}

/// Renders pages with poppler's `pdftoppm`
pub struct PdftoppmRenderer {
    binary: PathBuf,
    dpi: u32,
}

impl PdftoppmRenderer {
    pub fn new(config: &PdfConfig) -> Self {
        Self {
            binary: config.binary.clone(),
            dpi: config.dpi,
        }
    }
}

#[async_trait]
impl PageRenderer for PdftoppmRenderer {
    async fn render(
        &self,
        pdf: &Path,
        pages: PageRange,
        out_dir: &Path,
    ) -> Result<Vec<RenderedPage>> {
        if !pdf.is_file() {
            return Err(Error::ocr(
                pages.first,
                format!("PDF not found: {}", pdf.display()),
            ));
        }

        debug!("Rendering pages {} of {:?}", pages, pdf);

        let output = Command::new(&self.binary)
            .arg("-f")
            .arg(pages.first.to_string())
            .arg("-l")
            .arg(pages.last.to_string())
            .arg("-r")
            .arg(self.dpi.to_string())
            .arg("-png")
            .arg(pdf)
            .arg(out_dir.join(PAGE_PREFIX))
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| Error::ocr(pages.first, format!("Failed to start renderer: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::ocr(
                pages.first,
                format!("Renderer error: {}", stderr.trim()),
            ));
        }

        collect_pages(out_dir)
    }
}

/// Find `page-<n>.png` files; the renderer zero-pads `<n>` to the document's page count width.
pub(crate) fn collect_pages(dir: &Path) -> Result<Vec<RenderedPage>> {
    let mut pages = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().map(|e| e != "png").unwrap_or(true) {
            continue;
        }
        let number = path
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(|s| s.strip_prefix(PAGE_PREFIX))
            .and_then(|s| s.strip_prefix('-'))
            .and_then(|n| n.parse::<u32>().ok());
        if let Some(number) = number {
            pages.push(RenderedPage { number, path });
        }
    }

    pages.sort_by_key(|p| p.number);
    Ok(pages)
}
