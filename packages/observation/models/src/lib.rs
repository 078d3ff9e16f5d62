#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Observation types shared by every stage of the bulletin pipeline.
//!
//! Extraction strategies produce [`RawCandidate`]s, the observation builder
//! turns those into validated [`Observation`]s, and the row aggregator folds
//! observations into one [`ReadingRow`] per `(date, metric)` key.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// The kind of reading a bulletin column reports.
///
/// Variant order is the dataset's secondary sort order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum Metric {
    /// Daily maximum temperature.
    Max,
    /// Daily minimum temperature.
    Min,
    /// 24-hour rainfall total.
    Rainfall,
}

impl Metric {
    /// Every metric, in dataset order.
    pub const ALL: &[Self] = &[Self::Max, Self::Min, Self::Rainfall];

    /// Whether this metric is a rainfall amount (no upper plausibility bound,
    /// dashes may mean "no rain").
    #[must_use]
    pub const fn is_rainfall(self) -> bool {
        matches!(self, Self::Rainfall)
    }
}

/// A single cell of a reading row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CellValue {
    /// A parsed numeric reading.
    Number(f64),
    /// The source explicitly reported no observation (`NA`).
    NotAvailable,
    /// Nothing usable was found for this cell.
    Missing,
}

impl CellValue {
    /// Returns the numeric reading, if any.
    #[must_use]
    pub const fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            Self::NotAvailable | Self::Missing => None,
        }
    }

    /// Whether this cell carries a value worth emitting as an observation.
    #[must_use]
    pub const fn is_present(&self) -> bool {
        !matches!(self, Self::Missing)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(v) => f.write_str(&format_number(*v)),
            Self::NotAvailable => f.write_str("NA"),
            Self::Missing => Ok(()),
        }
    }
}

/// Error returned when a persisted cell is neither blank, `NA`, nor a number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseCellError(pub String);

impl fmt::Display for ParseCellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid cell value '{}'", self.0)
    }
}

impl std::error::Error for ParseCellError {}

impl FromStr for CellValue {
    type Err = ParseCellError;

    /// Parses the persisted (already canonical) form of a cell.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Ok(Self::Missing);
        }
        if trimmed.eq_ignore_ascii_case("NA") {
            return Ok(Self::NotAvailable);
        }
        trimmed
            .parse::<f64>()
            .map(Self::Number)
            .map_err(|_| ParseCellError(trimmed.to_owned()))
    }
}

/// Formats a reading the way the dataset stores it: whole numbers keep one
/// decimal place (`32.0`), everything else uses the shortest exact form.
#[must_use]
pub fn format_number(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{v:.1}")
    } else {
        format!("{v}")
    }
}

/// Rounds to one decimal place.
#[must_use]
pub fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// A `(station text, value texts)` tuple produced by one extraction
/// strategy. Transient; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCandidate {
    /// Noisy station name as it appeared in the document.
    pub station_text: String,
    /// Value tokens in metric column order.
    pub value_texts: Vec<String>,
    /// The document line (or joined lines / table row) the tuple came from.
    pub source_line: String,
}

impl RawCandidate {
    /// Creates a candidate from borrowed parts.
    #[must_use]
    pub fn new(station_text: &str, value_texts: &[&str], source_line: &str) -> Self {
        Self {
            station_text: station_text.trim().to_owned(),
            value_texts: value_texts.iter().map(|v| v.trim().to_owned()).collect(),
            source_line: source_line.trim().to_owned(),
        }
    }
}

/// A single validated reading for one station on one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    /// Observation date (the day the readings were taken).
    pub date: NaiveDate,
    /// Canonical station name.
    pub station: String,
    /// Which column this reading belongs to.
    pub metric: Metric,
    /// The normalized value.
    pub value: CellValue,
}

/// How catalog stations with no observation are written into a row.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AbsentPolicy {
    /// Leave the cell blank.
    #[default]
    Blank,
    /// Write the `NA` sentinel.
    Na,
}

impl AbsentPolicy {
    /// The cell value an absent station receives.
    #[must_use]
    pub const fn cell(self) -> CellValue {
        match self {
            Self::Blank => CellValue::Missing,
            Self::Na => CellValue::NotAvailable,
        }
    }
}

/// Unique key of a [`ReadingRow`] within a dataset.
pub type RowKey = (NaiveDate, Metric);

/// Summary statistics over the numeric cells of a row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RowStats {
    /// Sum of the numeric values.
    pub total: f64,
    /// Arithmetic mean of the numeric values.
    pub average: f64,
    /// Largest numeric value.
    pub max: f64,
    /// Smallest numeric value.
    pub min: f64,
}

impl RowStats {
    /// Computes rounded statistics over the numeric values, ignoring `NA`
    /// and missing cells. Returns `None` when no numeric value is present.
    #[must_use]
    pub fn compute<'a>(values: impl IntoIterator<Item = &'a CellValue>) -> Option<Self> {
        let nums: Vec<f64> = values.into_iter().filter_map(CellValue::as_number).collect();
        if nums.is_empty() {
            return None;
        }

        let total: f64 = nums.iter().sum();
        #[allow(clippy::cast_precision_loss)]
        let average = total / nums.len() as f64;
        let max = nums.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let min = nums.iter().copied().fold(f64::INFINITY, f64::min);

        Some(Self {
            total: round1(total),
            average: round1(average),
            max: round1(max),
            min: round1(min),
        })
    }
}

/// One dataset row: every station's reading for a `(date, metric)` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingRow {
    /// Observation date.
    pub date: NaiveDate,
    /// Metric reported by this row.
    pub metric: Metric,
    /// Station name to cell. Stations without an entry are blank.
    pub values: BTreeMap<String, CellValue>,
    /// Derived statistics; `None` when the row has no numeric cell.
    pub stats: Option<RowStats>,
}

impl ReadingRow {
    /// Builds a row and computes its statistics.
    #[must_use]
    pub fn new(date: NaiveDate, metric: Metric, values: BTreeMap<String, CellValue>) -> Self {
        let stats = RowStats::compute(values.values());
        Self {
            date,
            metric,
            values,
            stats,
        }
    }

    /// The row's unique dataset key.
    #[must_use]
    pub const fn key(&self) -> RowKey {
        (self.date, self.metric)
    }

    /// The cell for `station`, treating absent entries as missing.
    #[must_use]
    pub fn value(&self, station: &str) -> CellValue {
        self.values.get(station).copied().unwrap_or(CellValue::Missing)
    }

    /// Recomputes [`ReadingRow::stats`] from the current cells.
    pub fn refresh_stats(&mut self) {
        self.stats = RowStats::compute(self.values.values());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_parses_case_insensitively() {
        assert_eq!("rainfall".parse::<Metric>().unwrap(), Metric::Rainfall);
        assert_eq!("MAX".parse::<Metric>().unwrap(), Metric::Max);
        assert_eq!(Metric::Min.to_string(), "Min");
    }

    #[test]
    fn metric_order_matches_dataset_order() {
        let mut metrics = vec![Metric::Rainfall, Metric::Max, Metric::Min];
        metrics.sort();
        assert_eq!(metrics, Metric::ALL);
    }

    #[test]
    fn cell_display_uses_canonical_forms() {
        assert_eq!(CellValue::Number(32.0).to_string(), "32.0");
        assert_eq!(CellValue::Number(24.5).to_string(), "24.5");
        assert_eq!(CellValue::Number(0.01).to_string(), "0.01");
        assert_eq!(CellValue::NotAvailable.to_string(), "NA");
        assert_eq!(CellValue::Missing.to_string(), "");
    }

    #[test]
    fn cell_parses_persisted_forms() {
        assert_eq!("".parse::<CellValue>().unwrap(), CellValue::Missing);
        assert_eq!(" NA ".parse::<CellValue>().unwrap(), CellValue::NotAvailable);
        assert_eq!("12.5".parse::<CellValue>().unwrap(), CellValue::Number(12.5));
        assert!("TR".parse::<CellValue>().is_err());
    }

    #[test]
    fn stats_skip_sentinels() {
        let values = [
            CellValue::Number(30.0),
            CellValue::NotAvailable,
            CellValue::Number(25.25),
            CellValue::Missing,
        ];
        let stats = RowStats::compute(&values).unwrap();
        assert!((stats.total - 55.3).abs() < 1e-9);
        assert!((stats.average - 27.6).abs() < 1e-9);
        assert!((stats.max - 30.0).abs() < 1e-9);
        assert!((stats.min - 25.3).abs() < 1e-9);
    }

    #[test]
    fn stats_are_none_without_numbers() {
        let values = [CellValue::NotAvailable, CellValue::Missing];
        assert!(RowStats::compute(&values).is_none());
    }

    #[test]
    fn row_value_defaults_to_missing() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 19).unwrap();
        let mut values = BTreeMap::new();
        values.insert("Colombo".to_owned(), CellValue::Number(32.1));
        let row = ReadingRow::new(date, Metric::Max, values);
        assert_eq!(row.value("Colombo"), CellValue::Number(32.1));
        assert_eq!(row.value("Galle"), CellValue::Missing);
        assert_eq!(row.key(), (date, Metric::Max));
    }

    #[test]
    fn candidate_trims_parts() {
        let candidate = RawCandidate::new(" Colombo ", &["32.1 ", " TR"], "Colombo 32.1 TR\n");
        assert_eq!(candidate.station_text, "Colombo");
        assert_eq!(candidate.value_texts, vec!["32.1", "TR"]);
        assert_eq!(candidate.source_line, "Colombo 32.1 TR");
    }

    #[test]
    fn observation_serializes_camel_case() {
        let obs = Observation {
            date: NaiveDate::from_ymd_opt(2025, 6, 19).unwrap(),
            station: "Colombo".to_owned(),
            metric: Metric::Rainfall,
            value: CellValue::Number(0.01),
        };
        let json = serde_json::to_value(&obs).unwrap();
        assert_eq!(json["date"], "2025-06-19");
        assert_eq!(json["metric"], "Rainfall");
        assert_eq!(json["value"]["kind"], "number");
    }
}
