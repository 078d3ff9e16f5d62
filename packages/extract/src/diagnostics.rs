//! Per-document diagnostics.
//!
//! Problems that do not stop extraction (unmatched stations, rejected
//! values, documents nothing could be read from) are reported here instead
//! of being returned as errors. Where they end up is the caller's choice.

use std::fmt;
use std::io::Write;

use met_bulletin_observation_models::Metric;
use serde::{Deserialize, Serialize};

use crate::strategy::StrategyKind;

/// A recoverable extraction problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A candidate's station text did not resolve above the threshold.
    UnmatchedStation {
        document: String,
        strategy: StrategyKind,
        station_text: String,
        value_texts: Vec<String>,
        source_line: String,
        /// The closest station, if any was comparable.
        best_guess: Option<String>,
        score: Option<f64>,
    },
    /// A value token could not be parsed or was implausible.
    RejectedValue {
        document: String,
        station: String,
        metric: Metric,
        raw: String,
        source_line: String,
    },
    /// No strategy produced any candidate.
    NoCandidates {
        document: String,
        /// Whether the region's introductory phrase was found.
        region_anchored: bool,
    },
    /// The document could not be read at all.
    LoadFailed { document: String, error: String },
}

impl Diagnostic {
    /// The document the diagnostic concerns.
    #[must_use]
    pub fn document(&self) -> &str {
        match self {
            Self::UnmatchedStation { document, .. }
            | Self::RejectedValue { document, .. }
            | Self::NoCandidates { document, .. }
            | Self::LoadFailed { document, .. } => document,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnmatchedStation {
                document,
                strategy,
                station_text,
                value_texts,
                best_guess,
                score,
                ..
            } => {
                write!(
                    f,
                    "{document}: unmatched station '{station_text}' {value_texts:?} ({strategy})"
                )?;
                if let (Some(guess), Some(score)) = (best_guess, score) {
                    write!(f, ", closest '{guess}' at {score:.2}")?;
                }
                Ok(())
            }
            Self::RejectedValue {
                document,
                station,
                metric,
                raw,
                ..
            } => write!(f, "{document}: rejected {metric} value '{raw}' for {station}"),
            Self::NoCandidates {
                document,
                region_anchored,
            } => {
                if *region_anchored {
                    write!(f, "{document}: no station readings found in table region")
                } else {
                    write!(
                        f,
                        "{document}: no station readings found (table region not located)"
                    )
                }
            }
            Self::LoadFailed { document, error } => write!(f, "{document}: failed to load: {error}"),
        }
    }
}

/// Receives diagnostics as they happen.
pub trait DiagnosticsSink {
    /// Records one diagnostic.
    fn record(&mut self, diagnostic: Diagnostic);
}

/// Writes every diagnostic to the `log` facade at warn level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogDiagnostics;

impl DiagnosticsSink for LogDiagnostics {
    fn record(&mut self, diagnostic: Diagnostic) {
        log::warn!("{diagnostic}");
    }
}

/// Keeps diagnostics in memory, for tests and for handing a worker's
/// diagnostics back to the caller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectedDiagnostics {
    entries: Vec<Diagnostic>,
}

impl CollectedDiagnostics {
    /// An empty collection.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Collected diagnostics in arrival order.
    #[must_use]
    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    #[must_use]
    pub fn into_entries(self) -> Vec<Diagnostic> {
        self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Writes one JSON object per line.
    ///
    /// # Errors
    ///
    /// Returns [`std::io::Error`] if serialization or writing fails.
    pub fn write_jsonl(&self, mut writer: impl Write) -> std::io::Result<()> {
        for entry in &self.entries {
            serde_json::to_writer(&mut writer, entry)?;
            writer.write_all(b"\n")?;
        }
        Ok(())
    }
}

impl DiagnosticsSink for CollectedDiagnostics {
    fn record(&mut self, diagnostic: Diagnostic) {
        self.entries.push(diagnostic);
    }
}

impl Extend<Diagnostic> for CollectedDiagnostics {
    fn extend<T: IntoIterator<Item = Diagnostic>>(&mut self, iter: T) {
        self.entries.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unmatched() -> Diagnostic {
        Diagnostic::UnmatchedStation {
            document: "weather-2025-06-20.pdf".to_owned(),
            strategy: StrategyKind::AnchoredLine,
            station_text: "Xyzplace".to_owned(),
            value_texts: vec!["10.0".to_owned(), "5.0".to_owned(), "0.0".to_owned()],
            source_line: "Xyzplace 10.0 5.0 0.0".to_owned(),
            best_guess: Some("Galle".to_owned()),
            score: Some(0.31),
        }
    }

    #[test]
    fn display_names_document_and_station() {
        let text = unmatched().to_string();
        assert!(text.starts_with("weather-2025-06-20.pdf: unmatched station 'Xyzplace'"));
        assert!(text.ends_with("closest 'Galle' at 0.31"));
    }

    #[test]
    fn writes_tagged_json_lines() {
        let mut sink = CollectedDiagnostics::new();
        sink.record(unmatched());
        sink.record(Diagnostic::NoCandidates {
            document: "b.pdf".to_owned(),
            region_anchored: false,
        });

        let mut buf = Vec::new();
        sink.write_jsonl(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["kind"], "unmatched_station");
        assert_eq!(first["strategy"], "anchored_line");
        assert_eq!(first["station_text"], "Xyzplace");

        let second: Diagnostic = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second.document(), "b.pdf");
    }
}
