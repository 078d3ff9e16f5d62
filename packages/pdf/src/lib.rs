#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Bulletin document loading.
//!
//! Weather bulletins arrive as text-bearing PDFs, scanned PDFs, or page
//! images. This crate turns any of those into a [`Document`]: the full
//! extractable text, any pre-detected table grids, and a fallback date for
//! when the text itself does not state one.
//!
//! Text comes from pure-Rust extraction ([`pdf_extract`]); scanned pages go
//! through external OCR tools ([`ocr`]) that are treated as black boxes.

pub mod ocr;
pub mod tables;
pub mod text;

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

pub use crate::ocr::OcrConfig;
pub use crate::tables::TableGrid;

/// Trailing `YYYY-MM-DD` in a file stem (e.g. `weather-2025-06-20`).
static STEM_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{4}-\d{2}-\d{2})$").expect("valid regex"));

/// Errors specific to document loading.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// PDF text extraction failed.
    #[error("PDF extraction error: {0}")]
    Extraction(String),

    /// An external OCR tool failed or is missing.
    #[error("OCR error: {0}")]
    Ocr(String),

    /// A table sidecar file could not be parsed.
    #[error("Table sidecar error: {0}")]
    Tables(#[from] serde_json::Error),

    /// The file extension is not a supported document format.
    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),
}

/// The input to the extraction pipeline. Read-only.
#[derive(Debug, Clone, Default)]
pub struct Document {
    /// Short label for log and diagnostic messages (usually the file name).
    pub label: String,
    /// Full extracted text.
    pub text: String,
    /// Table grids detected by an upstream table finder, if any.
    pub tables: Vec<TableGrid>,
    /// Date to use when no date can be found in the text.
    pub fallback_date: NaiveDate,
}

impl Document {
    /// Creates a text-only document.
    #[must_use]
    pub fn from_text(label: &str, text: &str, fallback_date: NaiveDate) -> Self {
        Self {
            label: label.to_owned(),
            text: text.to_owned(),
            tables: Vec::new(),
            fallback_date,
        }
    }

    /// Attaches pre-detected table grids.
    #[must_use]
    pub fn with_tables(mut self, tables: Vec<TableGrid>) -> Self {
        self.tables = tables;
        self
    }

    /// Whether the document has nothing to extract from.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty() && self.tables.iter().all(TableGrid::is_empty)
    }
}

/// Options controlling how documents are read from disk.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// OCR settings; `None` disables OCR entirely.
    pub ocr: Option<OcrConfig>,
    /// PDFs with less extractable text than this are treated as scanned.
    pub min_text_length: usize,
    /// Date used when neither the directory nor the file name carries one.
    pub today: NaiveDate,
}

impl LoadOptions {
    /// Default options with OCR enabled.
    #[must_use]
    pub fn new(today: NaiveDate) -> Self {
        Self {
            ocr: Some(OcrConfig::default()),
            min_text_length: 20,
            today,
        }
    }

    /// Disables OCR.
    #[must_use]
    pub fn without_ocr(mut self) -> Self {
        self.ocr = None;
        self
    }
}

/// Document file extensions this crate can read.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["pdf", "txt", "png", "jpg", "jpeg", "tif", "tiff"];

/// Whether `path` has a supported document extension.
#[must_use]
pub fn is_supported(path: &Path) -> bool {
    extension_of(path).is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
}

/// Reads a document from disk.
///
/// # Errors
///
/// Returns [`DocumentError`] if the file cannot be read, its text cannot be
/// extracted and OCR is disabled, OCR fails on a scanned or unparseable
/// PDF, or a table sidecar is malformed.
pub fn load_document(path: &Path, options: &LoadOptions) -> Result<Document, DocumentError> {
    let ext = extension_of(path).unwrap_or_default();
    let label = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());

    let text = match ext.as_str() {
        "txt" => std::fs::read_to_string(path)?,
        "pdf" => {
            let bytes = std::fs::read(path)?;
            match (text::extract_pdf_text(&bytes), &options.ocr) {
                (Ok(extracted), _) if extracted.trim().len() >= options.min_text_length => {
                    extracted
                }
                (Ok(extracted), Some(ocr)) => {
                    log::info!(
                        "{label}: only {} chars of text, treating as scanned and running OCR",
                        extracted.trim().len()
                    );
                    ocr::ocr_pdf(path, ocr)?
                }
                (Ok(extracted), None) => {
                    log::warn!("{label}: PDF appears scanned and OCR is disabled");
                    extracted
                }
                (Err(e), Some(ocr)) => {
                    log::warn!("{label}: {e}; falling back to OCR");
                    ocr::ocr_pdf(path, ocr)?
                }
                (Err(e), None) => return Err(e),
            }
        }
        "png" | "jpg" | "jpeg" | "tif" | "tiff" => {
            let ocr = options.ocr.as_ref().ok_or_else(|| {
                DocumentError::Ocr(format!("{label}: image input requires OCR to be enabled"))
            })?;
            ocr::ocr_image(path, ocr)?
        }
        other => return Err(DocumentError::UnsupportedFormat(other.to_owned())),
    };

    let tables = match tables::sidecar_path(path) {
        Some(sidecar) if sidecar.is_file() => tables::load_tables(&sidecar)?,
        _ => Vec::new(),
    };

    log::debug!(
        "{label}: loaded {} chars of text and {} table grid(s)",
        text.len(),
        tables.len()
    );

    Ok(Document {
        label,
        text,
        tables,
        fallback_date: fallback_date_for(path, options.today),
    })
}

/// Derives a fallback date from where the document is stored: the parent
/// directory name (`reports/2025-06-20/…`), then a trailing date in the file
/// stem, then `today`.
#[must_use]
pub fn fallback_date_for(path: &Path, today: NaiveDate) -> NaiveDate {
    let from_dir = path
        .parent()
        .and_then(Path::file_name)
        .and_then(|n| n.to_str())
        .and_then(|n| NaiveDate::parse_from_str(n, "%Y-%m-%d").ok());
    if let Some(date) = from_dir {
        return date;
    }

    path.file_stem()
        .and_then(|s| s.to_str())
        .and_then(|s| STEM_DATE_RE.captures(s))
        .and_then(|caps| NaiveDate::parse_from_str(&caps[1], "%Y-%m-%d").ok())
        .unwrap_or(today)
}

/// Lists supported documents under `reports_dir`, one level of date
/// directories deep, sorted by path.
///
/// Text files are skipped when they are OCR debug dumps (`*debug*.txt`) or
/// sit next to a PDF or image with the same stem, since those are text
/// already derived from that document.
///
/// # Errors
///
/// Returns [`DocumentError::Io`] if the reports directory cannot be read.
pub fn discover_documents(reports_dir: &Path) -> Result<Vec<PathBuf>, DocumentError> {
    let mut found = Vec::new();

    for entry in std::fs::read_dir(reports_dir)? {
        let path = entry?.path();
        if path.is_dir() {
            for inner in std::fs::read_dir(&path)? {
                let inner = inner?.path();
                if inner.is_file() && is_supported(&inner) && !tables::is_sidecar(&inner) {
                    found.push(inner);
                }
            }
        } else if path.is_file() && is_supported(&path) && !tables::is_sidecar(&path) {
            found.push(path);
        }
    }

    found.sort();
    let originals: HashSet<PathBuf> = found
        .iter()
        .filter(|p| extension_of(p).is_some_and(|ext| ext != "txt"))
        .map(|p| p.with_extension(""))
        .collect();
    found.retain(|p| {
        let derived = extension_of(p).is_some_and(|ext| ext == "txt")
            && (is_debug_dump(p) || originals.contains(&p.with_extension("")));
        if derived {
            log::debug!("Skipping derived text file {}", p.display());
        }
        !derived
    });

    Ok(found)
}

fn is_debug_dump(path: &Path) -> bool {
    path.file_stem()
        .and_then(|s| s.to_str())
        .is_some_and(|s| s.to_ascii_lowercase().contains("debug"))
}
