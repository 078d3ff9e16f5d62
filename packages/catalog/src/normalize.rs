//! Station-name normalization.
//!
//! Bulletins mix English names with Sinhala/Tamil script, stray digits, and
//! OCR punctuation. Matching happens on a letters-only lowercase key so that
//! "Nuwara-Eliya", "NUWARA ELIYA" and "Nuwara Eliya." collapse together.

use regex::Regex;
use std::sync::LazyLock;

/// Runs of characters that can belong to an English station name.
static ENGLISH_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z()\- ]+").expect("valid regex"));

/// Regex to collapse whitespace runs into a single space.
static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Keeps only the English-looking parts of `input` (letters, parentheses,
/// hyphens, spaces) and collapses whitespace.
#[must_use]
pub fn english_only(input: &str) -> String {
    let parts: Vec<&str> = ENGLISH_RUN_RE
        .find_iter(input)
        .map(|m| m.as_str())
        .collect();
    WHITESPACE_RE
        .replace_all(&parts.join(" "), " ")
        .trim()
        .to_string()
}

/// Builds the matching key: lowercase ASCII letters only.
#[must_use]
pub fn station_key(input: &str) -> String {
    input
        .chars()
        .filter(char::is_ascii_alphabetic)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}
