//! Value normalization.
//!
//! Turns a noisy cell token into a [`CellValue`]. Pure and stateless apart
//! from the configured [`ValuePolicy`]; never fails.

use met_bulletin_observation_models::{CellValue, Metric};
use serde::Deserialize;

/// What a lone dash means in a rainfall column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DashPolicy {
    /// No rain fell.
    #[default]
    Zero,
    /// Nothing was reported.
    Missing,
}

/// Plausibility and sentinel settings for value normalization.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValuePolicy {
    /// Lowest plausible non-rainfall reading.
    pub min: f64,
    /// Highest plausible non-rainfall reading.
    pub max: f64,
    /// Amount recorded for a trace of rainfall.
    pub trace: f64,
    /// Meaning of `-`/`--` in rainfall columns.
    pub dash_rainfall: DashPolicy,
}

impl Default for ValuePolicy {
    fn default() -> Self {
        Self {
            min: -10.0,
            max: 60.0,
            trace: 0.01,
            dash_rainfall: DashPolicy::Zero,
        }
    }
}

/// Normalizes noisy value tokens.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValueNormalizer {
    policy: ValuePolicy,
}

impl ValueNormalizer {
    /// Creates a normalizer with the given policy.
    #[must_use]
    pub const fn new(policy: ValuePolicy) -> Self {
        Self { policy }
    }

    /// The active policy.
    #[must_use]
    pub const fn policy(&self) -> &ValuePolicy {
        &self.policy
    }

    /// Normalizes a token without column context: `NA` → not available,
    /// trace codes → the trace constant, dashes → missing, otherwise an
    /// OCR-corrected number or missing.
    #[must_use]
    pub fn normalize(&self, raw: &str) -> CellValue {
        let raw = raw.trim();
        if raw.is_empty() {
            return CellValue::Missing;
        }

        let letters: String = raw
            .chars()
            .filter(char::is_ascii_alphabetic)
            .map(|c| c.to_ascii_uppercase())
            .collect();
        if letters == "NA" {
            return CellValue::NotAvailable;
        }
        if letters == "TR" || letters == "TRACE" {
            return CellValue::Number(self.policy.trace);
        }
        if is_dash(raw) {
            return CellValue::Missing;
        }

        let cleaned: String = raw
            .chars()
            .map(|c| match c {
                'O' | 'o' => '0',
                '|' | 'I' | 'l' => '1',
                other => other,
            })
            .filter(|c| c.is_ascii_digit() || *c == '.')
            .collect();
        let cleaned = cleaned.trim_end_matches('.');
        if cleaned.is_empty() {
            return CellValue::Missing;
        }

        cleaned
            .parse::<f64>()
            .map_or(CellValue::Missing, CellValue::Number)
    }

    /// Normalizes a token for a specific column: applies the rainfall dash
    /// policy and rejects implausible non-rainfall readings.
    #[must_use]
    pub fn normalize_for(&self, raw: &str, metric: Metric) -> CellValue {
        if metric.is_rainfall() && is_dash(raw.trim()) {
            return match self.policy.dash_rainfall {
                DashPolicy::Zero => CellValue::Number(0.0),
                DashPolicy::Missing => CellValue::Missing,
            };
        }

        match self.normalize(raw) {
            CellValue::Number(v)
                if !metric.is_rainfall() && (v < self.policy.min || v > self.policy.max) =>
            {
                log::debug!("Rejecting implausible {metric} reading {v} (from '{raw}')");
                CellValue::Missing
            }
            other => other,
        }
    }
}

/// A single or double dash (including the typographic dashes OCR emits).
fn is_dash(raw: &str) -> bool {
    let count = raw.chars().count();
    (1..=2).contains(&count) && raw.chars().all(|c| matches!(c, '-' | '–' | '—'))
}
