//! Bulletin profiles.
//!
//! A profile holds everything that varies between bulletin sections: the
//! station catalog, value policy, region markers, date anchor, strategy
//! order and thresholds, and output policy. Built-in profiles are embedded
//! at compile time; custom ones are read from TOML files.

use std::path::Path;

use met_bulletin_catalog::CatalogConfig;
use met_bulletin_observation_models::{AbsentPolicy, Metric};
use serde::Deserialize;

use crate::ExtractError;
use crate::region::RegionConfig;
use crate::strategy::{StrategyKind, StrategyMode, Thresholds};
use crate::value::ValuePolicy;

/// Profiles embedded at compile time.
const PROFILE_TOMLS: &[(&str, &str)] = &[
    ("weather", include_str!("../profiles/weather.toml")),
    ("hydro", include_str!("../profiles/hydro.toml")),
];

/// Date resolution settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DateConfig {
    /// Terms that must all appear on the line stating the bulletin date.
    pub anchor_terms: Vec<String>,
}

/// Strategy selection.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExtractionConfig {
    /// Value columns, in the order the bulletin prints them.
    pub metrics: Vec<Metric>,
    /// Strategies in priority order.
    pub strategies: Vec<StrategyKind>,
    pub mode: StrategyMode,
    /// Cell text marking a table row as a header (structured tables only).
    pub header_keywords: Vec<String>,
    pub thresholds: Thresholds,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            metrics: Metric::ALL.to_vec(),
            strategies: StrategyKind::ALL.to_vec(),
            mode: StrategyMode::default(),
            header_keywords: Vec::new(),
            thresholds: Thresholds::default(),
        }
    }
}

/// Dataset output settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// How stations missing from a document are written.
    pub absent: AbsentPolicy,
    /// Insert `NA` rows for dates with no data up to yesterday.
    pub fill_gaps: bool,
}

/// A complete bulletin profile.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileConfig {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub values: ValuePolicy,
    #[serde(default)]
    pub region: RegionConfig,
    #[serde(default)]
    pub date: DateConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl ProfileConfig {
    /// Parses and validates a profile.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError`] if the TOML is malformed or the profile is
    /// inconsistent.
    pub fn from_toml(toml_str: &str) -> Result<Self, ExtractError> {
        let profile: Self = toml::de::from_str(toml_str)?;
        profile.validate()?;
        Ok(profile)
    }

    /// Reads a profile from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError`] if the file cannot be read or is invalid.
    pub fn load(path: &Path) -> Result<Self, ExtractError> {
        let raw = std::fs::read_to_string(path)?;
        let profile = Self::from_toml(&raw)?;
        log::info!("Loaded profile '{}' from {}", profile.name, path.display());
        Ok(profile)
    }

    /// A built-in profile by name.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::UnknownProfile`] if no such profile exists.
    pub fn builtin(name: &str) -> Result<Self, ExtractError> {
        let (_, toml_str) = PROFILE_TOMLS
            .iter()
            .find(|(id, _)| *id == name)
            .ok_or_else(|| ExtractError::UnknownProfile(name.to_owned()))?;
        Self::from_toml(toml_str)
    }

    /// Names of the built-in profiles.
    #[must_use]
    pub fn builtin_names() -> Vec<&'static str> {
        PROFILE_TOMLS.iter().map(|(id, _)| *id).collect()
    }

    /// Checks the settings that deserialization alone cannot.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::InvalidConfig`] describing the first problem.
    pub fn validate(&self) -> Result<(), ExtractError> {
        let invalid = |msg: String| Err(ExtractError::InvalidConfig(format!("{}: {msg}", self.name)));

        let metrics = &self.extraction.metrics;
        if metrics.is_empty() {
            return invalid("no metrics configured".to_owned());
        }
        if metrics
            .iter()
            .enumerate()
            .any(|(i, m)| metrics[..i].contains(m))
        {
            return invalid(format!("duplicate metric in {metrics:?}"));
        }

        if self.extraction.strategies.is_empty() {
            return invalid("no strategies configured".to_owned());
        }

        for (kind, threshold) in self.extraction.thresholds.iter() {
            if !(0.0..=1.0).contains(&threshold) {
                return invalid(format!("{kind} threshold {threshold} is outside 0..=1"));
            }
        }

        if self.values.min >= self.values.max {
            return invalid(format!(
                "plausible range {}..{} is empty",
                self.values.min, self.values.max
            ));
        }
        if self.values.trace < 0.0 {
            return invalid(format!("trace amount {} is negative", self.values.trace));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use met_bulletin_catalog::StationCatalog;

    use super::*;
    use crate::value::DashPolicy;

    #[test]
    fn builtin_profiles_parse_and_build_catalogs() {
        for name in ProfileConfig::builtin_names() {
            let profile = ProfileConfig::builtin(name).unwrap();
            assert_eq!(profile.name, name);
            StationCatalog::new(&profile.catalog).unwrap();
        }
    }

    #[test]
    fn weather_profile_shape() {
        let profile = ProfileConfig::builtin("weather").unwrap();
        assert_eq!(profile.catalog.stations.len(), 24);
        assert_eq!(profile.extraction.metrics, Metric::ALL);
        assert_eq!(profile.date.anchor_terms, vec!["0830", "period"]);
        assert_eq!(profile.extraction.strategies, StrategyKind::ALL);
    }

    #[test]
    fn hydro_profile_shape() {
        let profile = ProfileConfig::builtin("hydro").unwrap();
        assert_eq!(profile.catalog.stations.len(), 16);
        assert_eq!(profile.extraction.metrics, vec![Metric::Rainfall]);
        assert_eq!(profile.region.start.as_deref(), Some("hydro catchment"));
        assert!(profile.date.anchor_terms.is_empty());
    }

    #[test]
    fn unknown_builtin_is_an_error() {
        assert!(matches!(
            ProfileConfig::builtin("tidal"),
            Err(ExtractError::UnknownProfile(name)) if name == "tidal"
        ));
    }

    #[test]
    fn minimal_profile_uses_defaults() {
        let profile = ProfileConfig::from_toml(
            r#"
            name = "mini"
            [catalog]
            stations = ["Colombo"]
            "#,
        )
        .unwrap();
        assert_eq!(profile.values, ValuePolicy::default());
        assert_eq!(profile.values.dash_rainfall, DashPolicy::Zero);
        assert_eq!(profile.extraction.mode, StrategyMode::FirstNonEmpty);
        assert_eq!(profile.output.absent, AbsentPolicy::Blank);
        assert!(!profile.output.fill_gaps);
    }

    #[test]
    fn rejects_unknown_keys() {
        let err = ProfileConfig::from_toml(
            r#"
            name = "bad"
            [catalog]
            stations = ["Colombo"]
            [values]
            trace_amount = 0.0
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ExtractError::Toml(_)));
    }

    #[test]
    fn rejects_duplicate_metrics() {
        let err = ProfileConfig::from_toml(
            r#"
            name = "dup"
            [catalog]
            stations = ["Colombo"]
            [extraction]
            metrics = ["Max", "Max"]
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ExtractError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_out_of_range_threshold() {
        let err = ProfileConfig::from_toml(
            r#"
            name = "loose"
            [catalog]
            stations = ["Colombo"]
            [extraction.thresholds]
            brute_force = 1.5
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ExtractError::InvalidConfig(msg) if msg.contains("brute_force")));
    }
}
