//! Pre-detected table grids.
//!
//! Table detection (lattice/stream segmentation) happens upstream of this
//! workspace. Its output is a sibling `<stem>.tables.json` file holding an
//! array of grids, each an array of rows of string cells.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::DocumentError;

const SIDECAR_SUFFIX: &str = ".tables.json";

/// A rows × columns grid of cell text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableGrid {
    /// Row-major cell text.
    pub rows: Vec<Vec<String>>,
}

impl TableGrid {
    /// Wraps row-major cells.
    #[must_use]
    pub const fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    /// Whether every cell is blank.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows
            .iter()
            .all(|row| row.iter().all(|cell| cell.trim().is_empty()))
    }
}

/// The sidecar path for `document` (`reports/x/weather.pdf` →
/// `reports/x/weather.tables.json`).
#[must_use]
pub fn sidecar_path(document: &Path) -> Option<PathBuf> {
    let stem = document.file_stem()?.to_str()?;
    Some(document.with_file_name(format!("{stem}{SIDECAR_SUFFIX}")))
}

/// Whether `path` is itself a table sidecar.
#[must_use]
pub fn is_sidecar(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(SIDECAR_SUFFIX))
}

/// Reads grids from a sidecar file.
///
/// # Errors
///
/// Returns [`DocumentError`] if the file cannot be read or is not an array
/// of string grids.
pub fn load_tables(path: &Path) -> Result<Vec<TableGrid>, DocumentError> {
    let raw = std::fs::read_to_string(path)?;
    let tables: Vec<TableGrid> = serde_json::from_str(&raw)?;
    Ok(tables)
}
