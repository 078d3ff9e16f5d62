//! OCR for scanned bulletins.
//!
//! Both steps shell out to external tools: `pdftoppm` rasterizes PDF pages
//! and the `tesseract` CLI reads the page images. Neither tool's internals
//! are reimplemented here.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::DocumentError;

/// Settings for the external OCR tools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrConfig {
    /// Path to the `tesseract` binary.
    pub tesseract_path: String,
    /// Path to the `pdftoppm` binary.
    pub rasterizer_path: String,
    /// Tesseract language pack.
    pub language: String,
    /// Tesseract page segmentation mode (`6` = a single uniform block).
    pub page_segmentation_mode: u8,
    /// Rasterization resolution.
    pub dpi: u32,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            tesseract_path: "tesseract".to_string(),
            rasterizer_path: "pdftoppm".to_string(),
            language: "eng".to_string(),
            page_segmentation_mode: 6,
            dpi: 300,
        }
    }
}

/// Runs tesseract on a single image and returns its text.
///
/// # Errors
///
/// Returns [`DocumentError::Ocr`] if tesseract is missing or fails.
pub fn ocr_image(path: &Path, config: &OcrConfig) -> Result<String, DocumentError> {
    let output = Command::new(&config.tesseract_path)
        .arg(path.as_os_str())
        .arg("stdout")
        .arg("-l")
        .arg(&config.language)
        .arg("--psm")
        .arg(config.page_segmentation_mode.to_string())
        .output()
        .map_err(|e| {
            DocumentError::Ocr(format!(
                "failed to run tesseract (is it installed? path='{}'): {e}",
                config.tesseract_path
            ))
        })?;

    if !output.status.success() {
        return Err(DocumentError::Ocr(format!(
            "tesseract failed on {} (exit {}): {}",
            path.display(),
            output.status.code().unwrap_or(-1),
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    let text = String::from_utf8_lossy(&output.stdout).into_owned();
    log::debug!("OCR read {} chars from {}", text.len(), path.display());
    Ok(text)
}

/// Rasterizes every page of a PDF and OCRs each page in order.
///
/// # Errors
///
/// Returns [`DocumentError`] if rasterization or OCR of any page fails.
pub fn ocr_pdf(path: &Path, config: &OcrConfig) -> Result<String, DocumentError> {
    let scratch = tempfile::tempdir()?;
    let prefix = scratch.path().join("page");

    let status = Command::new(&config.rasterizer_path)
        .arg("-r")
        .arg(config.dpi.to_string())
        .arg("-png")
        .arg(path.as_os_str())
        .arg(prefix.as_os_str())
        .status()
        .map_err(|e| {
            DocumentError::Ocr(format!(
                "failed to run pdftoppm (is it installed? path='{}'): {e}",
                config.rasterizer_path
            ))
        })?;

    if !status.success() {
        return Err(DocumentError::Ocr(format!(
            "pdftoppm failed on {} (exit {})",
            path.display(),
            status.code().unwrap_or(-1)
        )));
    }

    let pages = page_images(scratch.path())?;
    log::info!("Rasterized {} page(s) from {}", pages.len(), path.display());

    let mut texts = Vec::with_capacity(pages.len());
    for page in &pages {
        texts.push(ocr_image(page, config)?);
    }

    Ok(texts.join("\n"))
}

/// Page images in `dir`, in page order.
fn page_images(dir: &Path) -> Result<Vec<PathBuf>, DocumentError> {
    let mut pages: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|p| p.extension().is_some_and(|e| e == "png"))
        .collect();
    // pdftoppm zero-pads page numbers
    pages.sort();
    Ok(pages)
}
