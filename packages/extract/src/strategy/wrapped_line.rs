//! Wrapped-line strategy.
//!
//! Page and column wraps split a record over two lines
//! (`Nuwara Eliya 20.4` / `NA 3.2`). A line that starts with a recognized
//! station but carries too few values is joined with the next line and
//! matched again. Complete lines are matched as they are, so this
//! strategy's output is a superset of the anchored-line strategy's.

use met_bulletin_observation_models::RawCandidate;
use regex::Regex;

use super::anchored_line::{match_record, record_pattern};
use super::{ExtractInput, Strategy, StrategyKind};
use crate::token::split_name_and_values;

/// Recovers records split across a line break.
#[derive(Debug, Clone)]
pub struct WrappedLine {
    columns: usize,
    threshold: f64,
    record: Regex,
}

impl WrappedLine {
    /// Creates the strategy. A line's leading words must resolve to a
    /// station at `threshold` before it is joined with the next line.
    ///
    /// # Errors
    ///
    /// Returns [`regex::Error`] if the record pattern fails to compile.
    pub fn new(columns: usize, threshold: f64) -> Result<Self, regex::Error> {
        Ok(Self {
            columns,
            threshold,
            record: record_pattern(columns)?,
        })
    }
}

impl Strategy for WrappedLine {
    fn kind(&self) -> StrategyKind {
        StrategyKind::WrappedLine
    }

    fn extract(&self, input: &ExtractInput<'_>) -> Vec<RawCandidate> {
        let lines: Vec<&str> = input.region.lines().collect();
        let mut out = Vec::new();

        let mut i = 0;
        while i < lines.len() {
            let line = lines[i];
            if let Some(candidate) = match_record(&self.record, self.columns, line) {
                out.push(candidate);
                i += 1;
                continue;
            }

            let (name, values) = split_name_and_values(line);
            let starts_with_station = !name.is_empty()
                && values.len() < self.columns
                && input.catalog.resolve(&name, self.threshold).is_some();

            if starts_with_station && let Some(next) = lines.get(i + 1) {
                let joined = format!("{} {}", line.trim_end(), next.trim_start());
                if let Some(candidate) = match_record(&self.record, self.columns, &joined) {
                    log::debug!("Joined wrapped record: {joined}");
                    out.push(candidate);
                    i += 2;
                    continue;
                }
            }

            i += 1;
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use met_bulletin_catalog::StationCatalog;
    use pretty_assertions::assert_eq;

    use super::*;

    fn run(region: &str) -> Vec<RawCandidate> {
        let catalog =
            StationCatalog::from_toml(r#"stations = ["Colombo", "Nuwara Eliya", "Galle"]"#)
                .unwrap();
        WrappedLine::new(3, 0.75).unwrap().extract(&ExtractInput {
            region,
            tables: &[],
            catalog: &catalog,
        })
    }

    #[test]
    fn joins_record_split_over_two_lines() {
        assert_eq!(
            run("Nuwara Eliya 20.4\nNA 3.2\nGalle 30.0 24.1 0.0"),
            vec![
                RawCandidate::new("Nuwara Eliya", &["20.4", "NA", "3.2"], "Nuwara Eliya 20.4 NA 3.2"),
                RawCandidate::new("Galle", &["30.0", "24.1", "0.0"], "Galle 30.0 24.1 0.0"),
            ]
        );
    }

    #[test]
    fn joins_name_only_line() {
        let found = run("Colombo\n32.1 24.5 TR");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].value_texts, vec!["32.1", "24.5", "TR"]);
    }

    #[test]
    fn ignores_unrecognized_short_lines() {
        assert!(run("Station Max\n32.1 24.5 TR").is_empty());
    }

    #[test]
    fn does_not_join_when_result_is_not_a_record() {
        assert!(run("Colombo 32.1\nGalle 30.0 24.1").is_empty());
    }
}
