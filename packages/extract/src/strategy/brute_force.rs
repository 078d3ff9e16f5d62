//! Brute-force token strategy for badly degraded OCR text.
//!
//! Line structure is discarded: the region is flattened to single spaces
//! and scanned for any short name followed by one loose value token per
//! column. Matching is permissive, so candidates are resolved at the
//! loosest station threshold and garbage names end up as diagnostics.

use met_bulletin_observation_models::RawCandidate;
use regex::Regex;

use super::{ExtractInput, Strategy, StrategyKind};
use crate::token::LOOSE_TOKEN;

/// Scans flattened text for `name v1 ... vN` runs.
#[derive(Debug, Clone)]
pub struct BruteForce {
    columns: usize,
    record: Regex,
}

impl BruteForce {
    /// Creates the strategy for `columns` values per record.
    ///
    /// # Errors
    ///
    /// Returns [`regex::Error`] if the scan pattern fails to compile.
    pub fn new(columns: usize) -> Result<Self, regex::Error> {
        use std::fmt::Write as _;

        // Up to four name words, as few as possible so trace codes like
        // `T.R` are not swallowed into the name.
        let mut pattern = String::from(
            r"\b(?P<name>[A-Za-z][A-Za-z()'.\-]*(?:\s+[A-Za-z()'.\-]+){0,3}?)\s*[:|]?",
        );
        for idx in 0..columns {
            let _ = write!(pattern, r"\s+(?P<v{idx}>{LOOSE_TOKEN})");
        }
        pattern.push_str(r"(?:\s+(?i:mm))?(?:\s|$)");

        Ok(Self {
            columns,
            record: Regex::new(&pattern)?,
        })
    }
}

impl Strategy for BruteForce {
    fn kind(&self) -> StrategyKind {
        StrategyKind::BruteForce
    }

    fn extract(&self, input: &ExtractInput<'_>) -> Vec<RawCandidate> {
        let flat = input.region.split_whitespace().collect::<Vec<_>>().join(" ");

        self.record
            .captures_iter(&flat)
            .filter_map(|caps| {
                let name = caps.name("name")?.as_str();
                let values: Vec<&str> = (0..self.columns)
                    .map(|idx| caps.name(&format!("v{idx}")).map(|m| m.as_str()))
                    .collect::<Option<_>>()?;
                Some(RawCandidate::new(name, &values, caps.get(0)?.as_str()))
            })
            .collect()
    }
}
