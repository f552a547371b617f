// src/pdf_extract.rs

use pdfplumber::{Page, Pdf, TableSettings};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Share of image-only pages at which a document counts as scanned.
const SCANNED_RATIO: f64 = 0.8;

/// One cell of a detected table; `None` where the cell has no text.
pub type Cell = Option<String>;

/// Rows of cells as laid out by the table finder.
pub type RawTable = Vec<Vec<Cell>>;

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: pdfplumber::PdfError,
    },

    #[error("page {page}: {source}")]
    Page {
        page: usize,
        #[source]
        source: pdfplumber::PdfError,
    },
}

pub struct PdfDocument {
    pdf: Pdf,
}

impl PdfDocument {
    pub fn open(path: &Path) -> Result<Self, PdfError> {
        let pdf = Pdf::open_file(path, None).map_err(|source| PdfError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self { pdf })
    }

    #[cfg(test)]
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PdfError> {
        let pdf = Pdf::open(bytes, None).map_err(|source| PdfError::Open {
            path: PathBuf::from("<memory>"),
            source,
        })?;
        Ok(Self { pdf })
    }

    pub fn page_count(&self) -> usize {
        self.pdf.page_count()
    }

    /// Interpret every page. Any page failing fails the whole document.
    pub fn pages(&self) -> Result<Vec<Page>, PdfError> {
        self.pdf
            .pages_iter()
            .enumerate()
            .map(|(index, page)| {
                page.map_err(|source| PdfError::Page {
                    page: index + 1,
                    source,
                })
            })
            .collect()
    }
}

/// Tables found on `page` with the default (ruling-line) settings.
pub fn page_tables(page: &Page) -> Vec<RawTable> {
    let tables = page.find_tables(&TableSettings::default());
    debug!(
        page = page.page_number() + 1,
        chars = page.chars().len(),
        tables = tables.len(),
        "Detected tables"
    );
    tables
        .iter()
        .map(|table| {
            table
                .rows
                .iter()
                .map(|row| row.iter().map(|cell| cell.text.clone()).collect())
                .collect()
        })
        .collect()
}

/// A page that draws images but no text is almost certainly a scan.
fn is_image_only(page: &Page) -> bool {
    !page.images().is_empty() && page.chars().is_empty()
}

/// Heuristic: if ≥80% of pages are image-only the whole document is
/// treated as scanned and no text tables can be expected.
pub fn looks_like_scanned(pages: &[Page]) -> bool {
    if pages.is_empty() {
        return false;
    }

    let image_only_pages = pages.iter().filter(|p| is_image_only(p)).count();
    let total = pages.len();
    let ratio = image_only_pages as f64 / total as f64;
    info!(
        total_pages = total,
        image_only = image_only_pages,
        ratio = format!("{ratio:.2}"),
        "Scanned-page analysis"
    );

    ratio >= SCANNED_RATIO
}
