//! Per-document extraction pipeline.
//!
//! Document → region → strategies → observations, with the observation date
//! resolved from the full text. A pipeline is immutable once built and can
//! be shared across worker threads.

use met_bulletin_catalog::StationCatalog;
use met_bulletin_observation_models::{Metric, Observation};
use met_bulletin_pdf::Document;
use serde::Serialize;

use crate::ExtractError;
use crate::builder::ObservationBuilder;
use crate::date::{DateResolver, ResolvedDate};
use crate::diagnostics::{Diagnostic, DiagnosticsSink};
use crate::profile::ProfileConfig;
use crate::region::RegionLocator;
use crate::strategy::{ExtractInput, StrategyKind, StrategySet};
use crate::value::ValueNormalizer;

/// The result of extracting one document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentExtraction {
    /// Document label.
    pub document: String,
    /// Resolved observation date.
    pub date: ResolvedDate,
    /// Strategies whose candidates were used, in priority order.
    pub strategies: Vec<StrategyKind>,
    /// Number of raw candidates considered.
    pub candidates: usize,
    /// Validated observations.
    pub observations: Vec<Observation>,
}

/// A configured extraction pipeline for one bulletin profile.
#[derive(Debug)]
pub struct BulletinPipeline {
    profile: String,
    catalog: StationCatalog,
    normalizer: ValueNormalizer,
    dates: DateResolver,
    region: RegionLocator,
    strategies: StrategySet,
    metrics: Vec<Metric>,
}

impl BulletinPipeline {
    /// Builds the pipeline described by `profile`.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError`] if the profile is invalid or its catalog
    /// cannot be built.
    pub fn from_profile(profile: &ProfileConfig) -> Result<Self, ExtractError> {
        profile.validate()?;

        let catalog = StationCatalog::new(&profile.catalog)?;
        let extraction = &profile.extraction;
        let strategies = StrategySet::from_kinds(
            &extraction.strategies,
            extraction.metrics.len(),
            &extraction.header_keywords,
            &extraction.thresholds,
            extraction.mode,
        )?;

        log::debug!(
            "Built '{}' pipeline: {} stations, metrics {:?}, strategies {:?} ({})",
            profile.name,
            catalog.len(),
            extraction.metrics,
            strategies.kinds(),
            strategies.mode()
        );

        Ok(Self {
            profile: profile.name.clone(),
            catalog,
            normalizer: ValueNormalizer::new(profile.values),
            dates: DateResolver::new(&profile.date.anchor_terms),
            region: RegionLocator::new(&profile.region),
            strategies,
            metrics: extraction.metrics.clone(),
        })
    }

    /// The profile name.
    #[must_use]
    pub fn profile(&self) -> &str {
        &self.profile
    }

    /// The station catalog.
    #[must_use]
    pub const fn catalog(&self) -> &StationCatalog {
        &self.catalog
    }

    /// The value columns this pipeline extracts.
    #[must_use]
    pub fn metrics(&self) -> &[Metric] {
        &self.metrics
    }

    /// Extracts observations from one document. Never fails: anything that
    /// cannot be read becomes a diagnostic and the document contributes
    /// fewer (possibly zero) observations.
    pub fn extract(
        &self,
        document: &Document,
        sink: &mut dyn DiagnosticsSink,
    ) -> DocumentExtraction {
        let date = self.dates.resolve(&document.text, document.fallback_date);

        if document.is_blank() {
            sink.record(Diagnostic::NoCandidates {
                document: document.label.clone(),
                region_anchored: false,
            });
            return DocumentExtraction {
                document: document.label.clone(),
                date,
                strategies: Vec::new(),
                candidates: 0,
                observations: Vec::new(),
            };
        }

        let region = self.region.locate(&document.text);
        let input = ExtractInput {
            region: region.text,
            tables: &document.tables,
            catalog: &self.catalog,
        };
        let outputs = self.strategies.run(&input);

        if outputs.is_empty() {
            sink.record(Diagnostic::NoCandidates {
                document: document.label.clone(),
                region_anchored: region.anchored,
            });
        }

        let builder = ObservationBuilder::new(&self.catalog, self.normalizer, &self.metrics);
        let observations = builder.build(&document.label, date.date, &outputs, sink);

        let strategies: Vec<StrategyKind> = outputs.iter().map(|o| o.kind).collect();
        let candidates = outputs.iter().map(|o| o.candidates.len()).sum();

        log::info!(
            "{}: {} observation(s) for {} ({} date) from {candidates} candidate(s) via {strategies:?}",
            document.label,
            observations.len(),
            date.date,
            date.source
        );

        DocumentExtraction {
            document: document.label.clone(),
            date,
            strategies,
            candidates,
            observations,
        }
    }
}
