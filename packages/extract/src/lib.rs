#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Bulletin extraction.
//!
//! Turns a loaded [`Document`](met_bulletin_pdf::Document) into
//! [`Observation`](met_bulletin_observation_models::Observation)s:
//!
//! 1. [`date`] resolves the observation date from the text.
//! 2. [`region`] narrows the text to the station table.
//! 3. [`strategy`] runs the configured extraction strategies in priority
//!    order to produce raw `(station, values)` candidates.
//! 4. [`builder`] resolves station names against the catalog and
//!    normalizes values with [`value`].
//!
//! Everything that varies between bulletin sections lives in a
//! [`ProfileConfig`]. [`BulletinPipeline`] wires the stages together.

pub mod builder;
pub mod date;
pub mod diagnostics;
pub mod pipeline;
pub mod profile;
pub mod region;
pub mod strategy;
pub mod token;
pub mod value;

pub use builder::ObservationBuilder;
pub use date::{DateResolver, DateSource, ResolvedDate};
pub use diagnostics::{CollectedDiagnostics, Diagnostic, DiagnosticsSink, LogDiagnostics};
pub use pipeline::{BulletinPipeline, DocumentExtraction};
pub use profile::ProfileConfig;
pub use region::{Region, RegionConfig, RegionLocator};
pub use strategy::{Strategy, StrategyKind, StrategyMode, StrategySet};
pub use value::{DashPolicy, ValueNormalizer, ValuePolicy};

/// Errors raised while configuring extraction. Extraction of a single
/// document never fails; see [`DiagnosticsSink`].
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// A profile could not be parsed.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// The profile's station catalog is invalid.
    #[error(transparent)]
    Catalog(#[from] met_bulletin_catalog::CatalogError),

    /// A strategy pattern failed to compile.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// A profile file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No built-in profile has this name.
    #[error("Unknown profile: {0}")]
    UnknownProfile(String),

    /// The profile is internally inconsistent.
    #[error("Invalid profile: {0}")]
    InvalidConfig(String),
}
