//! Value-token patterns shared by the extraction strategies.

use std::sync::LazyLock;

use regex::Regex;

/// A clean value token: `NA` (also `N/A`, `n.a.`), a trace code
/// (tolerating up to three punctuation/space characters between `T` and
/// `R`), a number, or a dash. Codes and numbers may carry up to two
/// trailing punctuation characters (`TR.`, `32.1,`).
pub const STRICT_TOKEN: &str = concat!(
    r"(?:(?i:N[^\w\n]{0,2}A|TRACE|T[^\w\n]{0,3}R)[^\w\s]{0,2}",
    r"|\d+(?:\.\d+)?[^\w\s]{0,2}|-{1,2})",
);

/// [`STRICT_TOKEN`] plus numbers carrying the OCR confusions the value
/// normalizer corrects (`O`/`o` for `0`, `I`/`l`/`|` for `1`). At least one
/// real digit is required.
pub const LOOSE_TOKEN: &str = concat!(
    r"(?:(?i:N[^\w\n]{0,2}A|TRACE|T[^\w\n]{0,3}R)[^\w\s]{0,2}",
    r"|[0-9OoIl|]*[0-9][0-9OoIl|]*(?:\.[0-9OoIl|]+)?[^\w\s]{0,2}|-{1,2})",
);

static VALUE_CELL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^(?:{STRICT_TOKEN})(?:\s*(?i:mm))?$")).expect("valid regex")
});

/// Whether a whole table cell (or word) is a single value token, optionally
/// suffixed with a `mm` unit.
#[must_use]
pub fn is_value_cell(cell: &str) -> bool {
    VALUE_CELL_RE.is_match(cell.trim())
}

/// Whether a table cell looks like a station name: not a value and at least
/// two letters.
#[must_use]
pub fn is_name_cell(cell: &str) -> bool {
    let cell = cell.trim();
    !is_value_cell(cell) && cell.chars().filter(char::is_ascii_alphabetic).count() >= 2
}

/// Splits a line into its leading name words and the value tokens that
/// directly follow them. Anything after the first non-token is ignored.
#[must_use]
pub fn split_name_and_values(line: &str) -> (String, Vec<&str>) {
    let mut words = line.split_whitespace().peekable();

    let mut name = Vec::new();
    while let Some(word) = words.next_if(|w| !is_value_cell(w)) {
        let word = word.trim_end_matches([':', '|']);
        if !word.is_empty() {
            name.push(word);
        }
    }

    let values = words.take_while(|w| is_value_cell(w)).collect();
    (name.join(" "), values)
}
