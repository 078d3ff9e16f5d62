//! Structured-table strategy.
//!
//! Walks the rows of pre-detected table grids. Orientation is not
//! consistent between bulletins, so each row is scanned for both
//! `name, values...` and `values..., name` runs.

use met_bulletin_observation_models::RawCandidate;

use super::{ExtractInput, Strategy, StrategyKind};
use crate::token::{is_name_cell, is_value_cell};

/// Extracts candidates from table grids.
#[derive(Debug, Clone)]
pub struct StructuredTable {
    columns: usize,
    header_keywords: Vec<String>,
}

impl StructuredTable {
    /// `columns` values are expected per station. Rows whose non-value
    /// cells contain any of `header_keywords` are skipped as headers.
    #[must_use]
    pub fn new(columns: usize, header_keywords: &[String]) -> Self {
        Self {
            columns,
            header_keywords: header_keywords
                .iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    fn is_header_row(&self, cells: &[&str]) -> bool {
        cells.iter().filter(|c| !is_value_cell(c)).any(|cell| {
            let lower = cell.to_lowercase();
            self.header_keywords.iter().any(|k| lower.contains(k))
        })
    }

    /// The `n` cells beside a name are taken positionally: none may look
    /// like a name and at least one must be a clean value. Damaged cells are
    /// passed through so the builder can report them.
    fn is_value_run(cells: &[&str]) -> bool {
        cells.iter().all(|c| !is_name_cell(c)) && cells.iter().any(|c| is_value_cell(c))
    }

    fn extract_row(&self, cells: &[&str], out: &mut Vec<RawCandidate>) {
        let n = self.columns;
        let source = cells.join(" | ");

        let mut i = 0;
        while i < cells.len() {
            let rest = &cells[i..];
            if rest.len() > n {
                if is_name_cell(rest[0]) && Self::is_value_run(&rest[1..=n]) {
                    out.push(RawCandidate::new(rest[0], &rest[1..=n], &source));
                    i += n + 1;
                    continue;
                }
                if Self::is_value_run(&rest[..n]) && is_name_cell(rest[n]) {
                    out.push(RawCandidate::new(rest[n], &rest[..n], &source));
                    i += n + 1;
                    continue;
                }
            }
            i += 1;
        }
    }
}

impl Strategy for StructuredTable {
    fn kind(&self) -> StrategyKind {
        StrategyKind::StructuredTable
    }

    fn extract(&self, input: &ExtractInput<'_>) -> Vec<RawCandidate> {
        let mut out = Vec::new();

        for table in input.tables {
            for row in &table.rows {
                let cells: Vec<&str> = row
                    .iter()
                    .map(|c| c.trim())
                    .filter(|c| !c.is_empty())
                    .collect();
                if cells.is_empty() {
                    continue;
                }
                if self.is_header_row(&cells) {
                    log::debug!("Skipping header row: {}", cells.join(" | "));
                    continue;
                }
                self.extract_row(&cells, &mut out);
            }
        }

        out
    }
}
