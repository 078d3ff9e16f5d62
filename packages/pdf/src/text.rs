//! PDF text extraction.

use crate::DocumentError;

/// Extracts the text layer of a PDF held in memory.
///
/// # Errors
///
/// Returns [`DocumentError::Extraction`] if the PDF cannot be parsed.
pub fn extract_pdf_text(bytes: &[u8]) -> Result<String, DocumentError> {
    let text = pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| DocumentError::Extraction(format!("failed to extract text from PDF: {e}")))?;

    log::debug!("Extracted {} characters of text from {} bytes", text.len(), bytes.len());

    Ok(clean_text(&text))
}

/// Normalizes line endings, turns form feeds into blank lines, and drops
/// other control characters. Line structure is preserved because the
/// line-based strategies depend on it.
#[must_use]
pub fn clean_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\r' => {}
            '\x0c' => out.push_str("\n\n"),
            '\t' => out.push(' '),
            '\n' => out.push('\n'),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_lines_and_drops_control_characters() {
        assert_eq!(
            clean_text("Colombo\t32.1\r\nGalle\x0cNext\x07"),
            "Colombo 32.1\nGalle\n\nNext"
        );
    }
}
