//! Observation date resolution.
//!
//! A bulletin states its publication date, which is the day after the
//! 24-hour period it reports on. Resolution tries, in order: a date on the
//! anchored line (the line naming the observation cutoff), any date in the
//! text, and finally the fallback date supplied with the document.

use std::sync::LazyLock;

use chrono::{Days, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display};

/// `YYYY.MM.DD`, `YYYY-MM-DD`, or `YYYY/MM/DD`.
static DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{4})[./-](\d{1,2})[./-](\d{1,2})").expect("valid regex")
});

/// Which tier produced a resolved date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DateSource {
    /// A date on the line carrying the anchor terms.
    Anchored,
    /// The first valid date anywhere in the text.
    Loose,
    /// The document's fallback date.
    Fallback,
}

/// The outcome of date resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedDate {
    /// The observation date the readings belong to.
    pub date: NaiveDate,
    /// The publication date found in the text, if any.
    pub stated: Option<NaiveDate>,
    /// Which tier produced the date.
    pub source: DateSource,
}

/// Resolves observation dates from bulletin text.
#[derive(Debug, Clone, Default)]
pub struct DateResolver {
    anchor_terms: Vec<String>,
}

impl DateResolver {
    /// Creates a resolver. A line is anchored when it contains every term
    /// (case-insensitively); no terms disables the anchored tier.
    #[must_use]
    pub fn new(anchor_terms: &[String]) -> Self {
        Self {
            anchor_terms: anchor_terms
                .iter()
                .map(|t| t.trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
        }
    }

    /// Resolves the observation date. Never fails.
    #[must_use]
    pub fn resolve(&self, text: &str, fallback: NaiveDate) -> ResolvedDate {
        if let Some(stated) = self.anchored_date(text)
            && let Some(date) = previous_day(stated)
        {
            return ResolvedDate {
                date,
                stated: Some(stated),
                source: DateSource::Anchored,
            };
        }

        if let Some(stated) = first_date(text)
            && let Some(date) = previous_day(stated)
        {
            log::debug!("No anchored date; using first date in text ({stated})");
            return ResolvedDate {
                date,
                stated: Some(stated),
                source: DateSource::Loose,
            };
        }

        log::info!("No date found in text; falling back to {fallback}");
        ResolvedDate {
            date: fallback,
            stated: None,
            source: DateSource::Fallback,
        }
    }

    fn is_anchor_line(&self, line: &str) -> bool {
        if self.anchor_terms.is_empty() {
            return false;
        }
        let lower = line.to_lowercase();
        self.anchor_terms.iter().all(|term| lower.contains(term))
    }

    /// The first valid date on an anchored line. A date wrapped onto the
    /// following line still counts.
    fn anchored_date(&self, text: &str) -> Option<NaiveDate> {
        let lines: Vec<&str> = text.lines().collect();
        for (idx, line) in lines.iter().enumerate() {
            if !self.is_anchor_line(line) {
                continue;
            }
            if let Some(date) = first_date(line) {
                return Some(date);
            }
            if let Some(date) = lines.get(idx + 1).and_then(|next| first_date(next)) {
                return Some(date);
            }
        }
        None
    }
}

/// The first date-shaped token that is a real calendar date. Invalid
/// components (month 13, June 31) are skipped rather than clamped.
#[must_use]
pub fn first_date(text: &str) -> Option<NaiveDate> {
    DATE_RE.captures_iter(text).find_map(|caps| {
        let year = caps[1].parse().ok()?;
        let month = caps[2].parse().ok()?;
        let day = caps[3].parse().ok()?;
        NaiveDate::from_ymd_opt(year, month, day)
    })
}

fn previous_day(date: NaiveDate) -> Option<NaiveDate> {
    date.checked_sub_days(Days::new(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn resolver() -> DateResolver {
        DateResolver::new(&["0830".to_owned(), "period".to_owned()])
    }

    #[test]
    fn anchored_date_is_one_day_before_stated() {
        let text = "Weather Bulletin\n\
                    Issued 2025.06.21\n\
                    Rainfall for the 24 hour period ending at 0830 on 2025.06.20\n";
        let resolved = resolver().resolve(text, ymd(2000, 1, 1));
        assert_eq!(resolved.date, ymd(2025, 6, 19));
        assert_eq!(resolved.stated, Some(ymd(2025, 6, 20)));
        assert_eq!(resolved.source, DateSource::Anchored);
    }

    #[test]
    fn accepts_all_delimiters() {
        for stated in ["2025.06.20", "2025-06-20", "2025/6/20"] {
            let text = format!("PERIOD ending 0830 {stated}");
            assert_eq!(resolver().resolve(&text, ymd(2000, 1, 1)).date, ymd(2025, 6, 19));
        }
    }

    #[test]
    fn anchored_date_may_wrap_to_next_line() {
        let text = "for the period ending at 0830 on\n2025.03.01\nprinted 2025.03.05";
        let resolved = resolver().resolve(text, ymd(2000, 1, 1));
        assert_eq!(resolved.date, ymd(2025, 2, 28));
        assert_eq!(resolved.source, DateSource::Anchored);
    }

    #[test]
    fn falls_back_to_first_date_in_text() {
        let text = "Daily report 2024.12.31\nColombo 30.0 24.0 0.0";
        let resolved = resolver().resolve(text, ymd(2000, 1, 1));
        assert_eq!(resolved.date, ymd(2024, 12, 30));
        assert_eq!(resolved.source, DateSource::Loose);
    }

    #[test]
    fn skips_malformed_dates() {
        let text = "period 0830 2025.13.40\n\nprinted 2025.01.02";
        let resolved = resolver().resolve(text, ymd(2000, 1, 1));
        assert_eq!(resolved.date, ymd(2025, 1, 1));
        assert_eq!(resolved.source, DateSource::Loose);
    }

    #[test]
    fn falls_back_to_supplied_date() {
        let resolved = resolver().resolve("no dates here", ymd(2025, 6, 20));
        assert_eq!(resolved.date, ymd(2025, 6, 20));
        assert_eq!(resolved.stated, None);
        assert_eq!(resolved.source, DateSource::Fallback);
    }

    #[test]
    fn first_anchored_match_wins() {
        let text = "period 0830 2025.06.20\nperiod 0830 2025.06.25";
        assert_eq!(resolver().resolve(text, ymd(2000, 1, 1)).date, ymd(2025, 6, 19));
    }

    #[test]
    fn no_anchor_terms_skips_anchored_tier() {
        let resolved = DateResolver::new(&[]).resolve("x 2025.06.20", ymd(2000, 1, 1));
        assert_eq!(resolved.source, DateSource::Loose);
    }
}
