//! Observation building: station and value resolution for raw candidates.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use met_bulletin_catalog::StationCatalog;
use met_bulletin_observation_models::{CellValue, Metric, Observation, RawCandidate};

use crate::diagnostics::{Diagnostic, DiagnosticsSink};
use crate::strategy::{StrategyKind, StrategyOutput};
use crate::value::ValueNormalizer;

/// Turns raw candidates into validated observations.
#[derive(Debug, Clone, Copy)]
pub struct ObservationBuilder<'a> {
    catalog: &'a StationCatalog,
    normalizer: ValueNormalizer,
    metrics: &'a [Metric],
}

impl<'a> ObservationBuilder<'a> {
    /// `metrics` names the value columns in candidate order.
    #[must_use]
    pub const fn new(
        catalog: &'a StationCatalog,
        normalizer: ValueNormalizer,
        metrics: &'a [Metric],
    ) -> Self {
        Self {
            catalog,
            normalizer,
            metrics,
        }
    }

    /// Builds observations from every strategy output, in order.
    ///
    /// One observation is emitted per `(station, metric)` whose station and
    /// value both resolve. The first value seen for a `(station, metric)`
    /// wins. Unresolved stations and rejected values go to `sink`.
    pub fn build(
        &self,
        document: &str,
        date: NaiveDate,
        outputs: &[StrategyOutput],
        sink: &mut dyn DiagnosticsSink,
    ) -> Vec<Observation> {
        let mut seen = BTreeSet::new();
        let mut observations = Vec::new();

        for output in outputs {
            for candidate in &output.candidates {
                self.build_candidate(
                    document,
                    date,
                    output.kind,
                    output.threshold,
                    candidate,
                    &mut seen,
                    &mut observations,
                    sink,
                );
            }
        }

        observations
    }

    #[allow(clippy::too_many_arguments)]
    fn build_candidate(
        &self,
        document: &str,
        date: NaiveDate,
        strategy: StrategyKind,
        threshold: f64,
        candidate: &RawCandidate,
        seen: &mut BTreeSet<(String, Metric)>,
        observations: &mut Vec<Observation>,
        sink: &mut dyn DiagnosticsSink,
    ) {
        let Some(found) = self.catalog.resolve(&candidate.station_text, threshold) else {
            let guess = self.catalog.best_guess(&candidate.station_text);
            sink.record(Diagnostic::UnmatchedStation {
                document: document.to_owned(),
                strategy,
                station_text: candidate.station_text.clone(),
                value_texts: candidate.value_texts.clone(),
                source_line: candidate.source_line.clone(),
                best_guess: guess.map(|g| g.station.to_owned()),
                score: guess.map(|g| g.score),
            });
            return;
        };

        if found.station != candidate.station_text {
            log::debug!(
                "Resolved '{}' to {} ({:?}, {:.2})",
                candidate.station_text,
                found.station,
                found.kind,
                found.score
            );
        }

        for (&metric, raw) in self.metrics.iter().zip(&candidate.value_texts) {
            let value = self.normalizer.normalize_for(raw, metric);

            if value == CellValue::Missing {
                if !is_blank_or_dash(raw) {
                    sink.record(Diagnostic::RejectedValue {
                        document: document.to_owned(),
                        station: found.station.to_owned(),
                        metric,
                        raw: raw.clone(),
                        source_line: candidate.source_line.clone(),
                    });
                }
                continue;
            }

            if !seen.insert((found.station.to_owned(), metric)) {
                log::debug!(
                    "Ignoring repeated {metric} reading for {} in {document}",
                    found.station
                );
                continue;
            }

            observations.push(Observation {
                date,
                station: found.station.to_owned(),
                metric,
                value,
            });
        }
    }
}

fn is_blank_or_dash(raw: &str) -> bool {
    raw.trim()
        .chars()
        .all(|c| c.is_whitespace() || matches!(c, '-' | '–' | '—'))
}
