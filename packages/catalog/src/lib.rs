#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Canonical station catalog.
//!
//! A [`StationCatalog`] is an immutable value built from a
//! [`CatalogConfig`]: an ordered list of canonical station names plus an
//! alias table for known spelling variants. Noisy station text is resolved
//! by exact lookup first and by Ratcliff/Obershelp similarity second.

pub mod normalize;
pub mod similarity;

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::normalize::{english_only, station_key};

/// Errors that can occur while building a catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// The TOML configuration could not be parsed.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// The catalog has no stations.
    #[error("station catalog is empty")]
    Empty,

    /// A station name contains no letters to match on.
    #[error("station name '{0}' has no matchable letters")]
    Unmatchable(String),

    /// Two canonical names collapse to the same matching key.
    #[error("duplicate station '{0}'")]
    DuplicateStation(String),

    /// An alias points at a name that is not in the station list.
    #[error("alias '{alias}' refers to unknown station '{station}'")]
    UnknownCanonical {
        /// The offending alias.
        alias: String,
        /// The canonical name it claims to map to.
        station: String,
    },

    /// An alias key already maps to a different station.
    #[error("alias '{alias}' maps to both '{first}' and '{second}'")]
    ConflictingAlias {
        /// The offending alias.
        alias: String,
        /// The station the key already maps to.
        first: String,
        /// The station the alias tried to add.
        second: String,
    },
}

/// Serializable catalog definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogConfig {
    /// Canonical station names, in dataset column order.
    pub stations: Vec<String>,
    /// Noisy variant to canonical name.
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
}

/// How a station text was matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// The text is (a spelling-insensitive form of) a canonical name.
    Canonical,
    /// The text is a registered alias.
    Alias,
    /// The text minus some leading words is a canonical name or alias.
    Phrase,
    /// Fuzzy similarity at or above the threshold.
    Fuzzy,
}

/// A resolved station.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StationMatch<'a> {
    /// Canonical station name.
    pub station: &'a str,
    /// Similarity score (`1.0` for exact lookups).
    pub score: f64,
    /// How the match was found.
    pub kind: MatchKind,
}

/// Immutable station reference data.
#[derive(Debug, Clone)]
pub struct StationCatalog {
    stations: Vec<String>,
    /// Matching key (canonical names and aliases) to station index.
    keys: BTreeMap<String, usize>,
}

impl StationCatalog {
    /// Builds a catalog from its definition.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] if the catalog is empty, a name has no
    /// letters, names collide, or an alias is inconsistent.
    pub fn new(config: &CatalogConfig) -> Result<Self, CatalogError> {
        if config.stations.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut keys = BTreeMap::new();
        for (idx, station) in config.stations.iter().enumerate() {
            let key = station_key(station);
            if key.is_empty() {
                return Err(CatalogError::Unmatchable(station.clone()));
            }
            if keys.insert(key, idx).is_some() {
                return Err(CatalogError::DuplicateStation(station.clone()));
            }
        }

        for (alias, station) in &config.aliases {
            let Some(idx) = config.stations.iter().position(|s| s == station) else {
                return Err(CatalogError::UnknownCanonical {
                    alias: alias.clone(),
                    station: station.clone(),
                });
            };
            let key = station_key(alias);
            if key.is_empty() {
                return Err(CatalogError::Unmatchable(alias.clone()));
            }
            match keys.get(&key) {
                Some(&existing) if existing != idx => {
                    return Err(CatalogError::ConflictingAlias {
                        alias: alias.clone(),
                        first: config.stations[existing].clone(),
                        second: station.clone(),
                    });
                }
                Some(_) => {}
                None => {
                    keys.insert(key, idx);
                }
            }
        }

        log::debug!(
            "Built station catalog: {} stations, {} match keys",
            config.stations.len(),
            keys.len()
        );

        Ok(Self {
            stations: config.stations.clone(),
            keys,
        })
    }

    /// Parses a `[catalog]`-shaped TOML document and builds the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] if parsing or validation fails.
    pub fn from_toml(toml_str: &str) -> Result<Self, CatalogError> {
        let config: CatalogConfig = toml::de::from_str(toml_str)?;
        Self::new(&config)
    }

    /// Canonical station names in column order.
    #[must_use]
    pub fn stations(&self) -> &[String] {
        &self.stations
    }

    /// Number of canonical stations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stations.len()
    }

    /// Always `false` for a successfully built catalog.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// Whether `name` is exactly one of the canonical names.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.stations.iter().any(|s| s == name)
    }

    /// Exact lookup: canonical key, alias, or the same after dropping
    /// leading words. No similarity scoring.
    #[must_use]
    pub fn lookup(&self, text: &str) -> Option<StationMatch<'_>> {
        let cleaned = english_only(text);
        self.lookup_key(&cleaned).or_else(|| self.lookup_suffix(&cleaned))
    }

    fn lookup_key(&self, cleaned: &str) -> Option<StationMatch<'_>> {
        let key = station_key(cleaned);
        let &idx = self.keys.get(&key)?;
        let station = &self.stations[idx];
        let kind = if station_key(station) == key {
            MatchKind::Canonical
        } else {
            MatchKind::Alias
        };
        Some(StationMatch {
            station,
            score: 1.0,
            kind,
        })
    }

    /// Drops leading words one at a time (stray header text) and looks the
    /// remaining suffix up exactly.
    fn lookup_suffix(&self, cleaned: &str) -> Option<StationMatch<'_>> {
        let words: Vec<&str> = cleaned.split_whitespace().collect();

        (1..words.len()).find_map(|start| {
            let key = station_key(&words[start..].concat());
            if key.len() < 3 {
                return None;
            }
            self.keys.get(&key).map(|&idx| StationMatch {
                station: &self.stations[idx],
                score: 1.0,
                kind: MatchKind::Phrase,
            })
        })
    }

    /// The most similar station regardless of threshold. Ties go to the
    /// station listed first.
    #[must_use]
    pub fn best_guess(&self, text: &str) -> Option<StationMatch<'_>> {
        let key = station_key(&english_only(text));
        if key.len() < 3 {
            return None;
        }

        let mut best: Option<(usize, f64)> = None;
        for (candidate, &idx) in &self.keys {
            let score = similarity::ratio(&key, candidate);
            let better = match best {
                None => true,
                Some((best_idx, best_score)) => {
                    score > best_score || ((score - best_score).abs() < f64::EPSILON && idx < best_idx)
                }
            };
            if better {
                best = Some((idx, score));
            }
        }

        best.map(|(idx, score)| StationMatch {
            station: &self.stations[idx],
            score,
            kind: MatchKind::Fuzzy,
        })
    }

    /// Resolves noisy station text to a canonical station.
    ///
    /// Order: exact key or alias, then similarity of the whole text at
    /// `score >= threshold`, then an exact key after dropping leading words.
    /// A damaged multi-word name ("Uppcr Kotmale") therefore goes to its
    /// closest station rather than to a station named by its last word.
    #[must_use]
    pub fn resolve(&self, text: &str, threshold: f64) -> Option<StationMatch<'_>> {
        let cleaned = english_only(text);
        if let Some(found) = self.lookup_key(&cleaned) {
            return Some(found);
        }
        if let Some(found) = self.best_guess(text).filter(|m| m.score >= threshold) {
            return Some(found);
        }
        self.lookup_suffix(&cleaned)
    }
}
