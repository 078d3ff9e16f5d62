//! Anchored-line strategy: one record per line, a name followed by exactly
//! one value token per metric column.

use met_bulletin_observation_models::RawCandidate;
use regex::Regex;

use super::{ExtractInput, Strategy, StrategyKind};
use crate::token::STRICT_TOKEN;

/// Builds the whole-line record pattern for `columns` values.
pub(crate) fn record_pattern(columns: usize) -> Result<Regex, regex::Error> {
    use std::fmt::Write as _;

    let mut pattern = String::from(r"^\s*(?P<name>[A-Za-z][A-Za-z()'.\- ]*?)\s*[:|]?");
    for idx in 0..columns {
        let _ = write!(pattern, r"\s+(?P<v{idx}>{STRICT_TOKEN})");
    }
    pattern.push_str(r"\s*(?i:mm)?\s*$");
    Regex::new(&pattern)
}

/// Applies [`record_pattern`] to one line.
pub(crate) fn match_record(re: &Regex, columns: usize, line: &str) -> Option<RawCandidate> {
    let caps = re.captures(line)?;
    let name = caps.name("name")?.as_str();
    let values: Vec<&str> = (0..columns)
        .map(|idx| caps.name(&format!("v{idx}")).map(|m| m.as_str()))
        .collect::<Option<_>>()?;
    Some(RawCandidate::new(name, &values, line))
}

/// Matches whole lines of the form `Name v1 v2 ... vN`.
#[derive(Debug, Clone)]
pub struct AnchoredLine {
    columns: usize,
    record: Regex,
}

impl AnchoredLine {
    /// Creates the strategy for `columns` values per line.
    ///
    /// # Errors
    ///
    /// Returns [`regex::Error`] if the record pattern fails to compile.
    pub fn new(columns: usize) -> Result<Self, regex::Error> {
        Ok(Self {
            columns,
            record: record_pattern(columns)?,
        })
    }
}

impl Strategy for AnchoredLine {
    fn kind(&self) -> StrategyKind {
        StrategyKind::AnchoredLine
    }

    fn extract(&self, input: &ExtractInput<'_>) -> Vec<RawCandidate> {
        input
            .region
            .lines()
            .filter_map(|line| match_record(&self.record, self.columns, line))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use met_bulletin_catalog::StationCatalog;
    use pretty_assertions::assert_eq;

    use super::*;

    fn run(columns: usize, region: &str) -> Vec<RawCandidate> {
        let catalog = StationCatalog::from_toml(r#"stations = ["Colombo"]"#).unwrap();
        AnchoredLine::new(columns).unwrap().extract(&ExtractInput {
            region,
            tables: &[],
            catalog: &catalog,
        })
    }

    #[test]
    fn matches_name_and_three_tokens() {
        assert_eq!(
            run(3, "Colombo 32.1 24.5 TR"),
            vec![RawCandidate::new("Colombo", &["32.1", "24.5", "TR"], "Colombo 32.1 24.5 TR")]
        );
    }

    #[test]
    fn accepts_multi_word_names_and_separators() {
        let found = run(3, "  Nuwara Eliya : 20.4 NA T. R\nMaskeliya (DOM)| 22.0 15.1 12.5 mm");
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].station_text, "Nuwara Eliya");
        assert_eq!(found[0].value_texts, vec!["20.4", "NA", "T. R"]);
        assert_eq!(found[1].station_text, "Maskeliya (DOM)");
        assert_eq!(found[1].value_texts, vec!["22.0", "15.1", "12.5"]);
    }

    #[test]
    fn requires_exactly_the_column_count() {
        assert!(run(3, "Colombo 32.1 24.5").is_empty());
        assert!(run(3, "Colombo 32.1 24.5 0.0 1.0").is_empty());
        assert!(run(3, "Max Min Rainfall").is_empty());
    }

    #[test]
    fn single_column_pairs() {
        assert_eq!(
            run(1, "Norton 12.5 mm\nCastlereigh -"),
            vec![
                RawCandidate::new("Norton", &["12.5"], "Norton 12.5 mm"),
                RawCandidate::new("Castlereigh", &["-"], "Castlereigh -"),
            ]
        );
    }

    #[test]
    fn leaves_unknown_names_to_the_builder() {
        assert_eq!(run(3, "Xyzplace 10.0 5.0 0.0").len(), 1);
    }
}
