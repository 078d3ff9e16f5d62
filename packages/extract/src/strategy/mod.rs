//! Extraction strategies.
//!
//! Each bulletin layout (bordered tables, aligned text, wrapped records,
//! OCR soup) gets its own [`Strategy`]. A [`StrategySet`] runs them in
//! priority order and either stops at the first one that finds anything or
//! keeps the output of all of them.

pub mod anchored_line;
pub mod brute_force;
pub mod structured_table;
pub mod wrapped_line;

use met_bulletin_catalog::StationCatalog;
use met_bulletin_observation_models::RawCandidate;
use met_bulletin_pdf::TableGrid;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::ExtractError;

pub use anchored_line::AnchoredLine;
pub use brute_force::BruteForce;
pub use structured_table::StructuredTable;
pub use wrapped_line::WrappedLine;

/// Identifies a strategy in configuration and diagnostics.
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
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StrategyKind {
    /// Pre-segmented table grids.
    StructuredTable,
    /// One record per line: a name then exactly one token per metric.
    AnchoredLine,
    /// Records split across two lines.
    WrappedLine,
    /// Loose token scan over the flattened region.
    BruteForce,
}

impl StrategyKind {
    /// Every strategy, in default priority order.
    pub const ALL: &[Self] = &[
        Self::StructuredTable,
        Self::AnchoredLine,
        Self::WrappedLine,
        Self::BruteForce,
    ];
}

/// How a [`StrategySet`] combines strategy outputs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StrategyMode {
    /// Stop at the first strategy producing any candidate.
    #[default]
    FirstNonEmpty,
    /// Run every strategy and keep all candidates, highest priority first.
    Union,
}

/// Fuzzy station-match threshold for candidates from each strategy.
/// Cleaner sources get tighter thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Thresholds {
    pub structured_table: f64,
    pub anchored_line: f64,
    pub wrapped_line: f64,
    pub brute_force: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            structured_table: 0.85,
            anchored_line: 0.75,
            wrapped_line: 0.75,
            brute_force: 0.6,
        }
    }
}

impl Thresholds {
    /// The threshold for `kind`.
    #[must_use]
    pub const fn get(&self, kind: StrategyKind) -> f64 {
        match kind {
            StrategyKind::StructuredTable => self.structured_table,
            StrategyKind::AnchoredLine => self.anchored_line,
            StrategyKind::WrappedLine => self.wrapped_line,
            StrategyKind::BruteForce => self.brute_force,
        }
    }

    /// Every threshold with its strategy.
    #[must_use]
    pub fn iter(&self) -> impl Iterator<Item = (StrategyKind, f64)> + '_ {
        StrategyKind::ALL.iter().map(|&kind| (kind, self.get(kind)))
    }
}

/// What a strategy sees of a document.
#[derive(Debug, Clone, Copy)]
pub struct ExtractInput<'a> {
    /// The located station-table region.
    pub region: &'a str,
    /// Pre-detected table grids.
    pub tables: &'a [TableGrid],
    /// Reference stations, for strategies that need to recognize names.
    pub catalog: &'a StationCatalog,
}

/// An extraction algorithm turning a region into raw candidates.
///
/// Implementations hold only immutable configuration and must not keep
/// state between calls.
pub trait Strategy: Send + Sync {
    /// Which strategy this is.
    fn kind(&self) -> StrategyKind;

    /// Produces zero or more candidates. Never fails; a layout the strategy
    /// does not recognize simply yields nothing.
    fn extract(&self, input: &ExtractInput<'_>) -> Vec<RawCandidate>;
}

/// Candidates from one strategy, with the threshold they are resolved at.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyOutput {
    /// The producing strategy.
    pub kind: StrategyKind,
    /// Fuzzy station-match threshold for these candidates.
    pub threshold: f64,
    /// What the strategy found.
    pub candidates: Vec<RawCandidate>,
}

struct Entry {
    strategy: Box<dyn Strategy>,
    threshold: f64,
}

/// An ordered list of strategies.
pub struct StrategySet {
    entries: Vec<Entry>,
    mode: StrategyMode,
}

impl std::fmt::Debug for StrategySet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategySet")
            .field("strategies", &self.kinds())
            .field("mode", &self.mode)
            .finish()
    }
}

impl StrategySet {
    /// An empty set.
    #[must_use]
    pub const fn new(mode: StrategyMode) -> Self {
        Self {
            entries: Vec::new(),
            mode,
        }
    }

    /// Builds the configured strategies in the given priority order.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError`] if `columns` is zero or a pattern fails to
    /// compile.
    pub fn from_kinds(
        kinds: &[StrategyKind],
        columns: usize,
        header_keywords: &[String],
        thresholds: &Thresholds,
        mode: StrategyMode,
    ) -> Result<Self, ExtractError> {
        if columns == 0 {
            return Err(ExtractError::InvalidConfig(
                "at least one metric column is required".to_owned(),
            ));
        }

        let mut set = Self::new(mode);
        for &kind in kinds {
            let threshold = thresholds.get(kind);
            set = match kind {
                StrategyKind::StructuredTable => {
                    set.with(StructuredTable::new(columns, header_keywords), threshold)
                }
                StrategyKind::AnchoredLine => set.with(AnchoredLine::new(columns)?, threshold),
                StrategyKind::WrappedLine => {
                    set.with(WrappedLine::new(columns, threshold)?, threshold)
                }
                StrategyKind::BruteForce => set.with(BruteForce::new(columns)?, threshold),
            };
        }
        Ok(set)
    }

    /// Appends a strategy at the lowest priority.
    #[must_use]
    pub fn with(mut self, strategy: impl Strategy + 'static, threshold: f64) -> Self {
        self.entries.push(Entry {
            strategy: Box::new(strategy),
            threshold,
        });
        self
    }

    /// Strategies in priority order.
    #[must_use]
    pub fn kinds(&self) -> Vec<StrategyKind> {
        self.entries.iter().map(|e| e.strategy.kind()).collect()
    }

    /// The combination mode.
    #[must_use]
    pub const fn mode(&self) -> StrategyMode {
        self.mode
    }

    /// Runs the strategies. Only non-empty outputs are returned; in
    /// [`StrategyMode::FirstNonEmpty`] that is at most one.
    #[must_use]
    pub fn run(&self, input: &ExtractInput<'_>) -> Vec<StrategyOutput> {
        let mut outputs = Vec::new();

        for entry in &self.entries {
            let kind = entry.strategy.kind();
            let candidates = entry.strategy.extract(input);
            log::debug!("Strategy {kind} produced {} candidate(s)", candidates.len());

            if candidates.is_empty() {
                continue;
            }

            outputs.push(StrategyOutput {
                kind,
                threshold: entry.threshold,
                candidates,
            });

            if self.mode == StrategyMode::FirstNonEmpty {
                break;
            }
        }

        outputs
    }
}
