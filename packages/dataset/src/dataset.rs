//! The historical dataset and its merge rule.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use met_bulletin_observation_models::{Metric, ReadingRow, RowKey};

use crate::gaps;

/// What a merge changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeSummary {
    /// Rows whose key was not in the dataset.
    pub inserted: usize,
    /// Rows that replaced an existing row with the same key.
    pub replaced: usize,
}

/// Reading rows unique by `(date, metric)`, ordered by date and then by
/// metric.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    stations: Vec<String>,
    rows: BTreeMap<RowKey, ReadingRow>,
}

impl Dataset {
    /// An empty dataset with the given station columns.
    #[must_use]
    pub const fn new(stations: Vec<String>) -> Self {
        Self {
            stations,
            rows: BTreeMap::new(),
        }
    }

    /// Station columns, in output order.
    #[must_use]
    pub fn stations(&self) -> &[String] {
        &self.stations
    }

    /// Rows in key order.
    pub fn rows(&self) -> impl ExactSizeIterator<Item = &ReadingRow> {
        self.rows.values()
    }

    /// The row for `key`, if any.
    #[must_use]
    pub fn get(&self, key: &RowKey) -> Option<&ReadingRow> {
        self.rows.get(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The earliest date with any row.
    #[must_use]
    pub fn first_date(&self) -> Option<NaiveDate> {
        self.rows.keys().next().map(|(date, _)| *date)
    }

    /// The latest date with any row.
    #[must_use]
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.rows.keys().next_back().map(|(date, _)| *date)
    }

    /// Appends station columns not already present, keeping their order.
    pub fn add_stations<'a>(&mut self, stations: impl IntoIterator<Item = &'a String>) {
        for station in stations {
            if !self.stations.contains(station) {
                self.stations.push(station.clone());
            }
        }
    }

    /// Merges rows in order. A row replaces any existing row with the same
    /// key outright, including one added earlier in the same call. Stations
    /// not yet in the column list are appended to it.
    pub fn merge(&mut self, rows: impl IntoIterator<Item = ReadingRow>) -> MergeSummary {
        let mut summary = MergeSummary::default();

        for row in rows {
            let mut extra: Vec<&String> = row
                .values
                .keys()
                .filter(|s| !self.stations.contains(s))
                .collect();
            if !extra.is_empty() {
                extra.sort();
                log::warn!("Adding station column(s) {extra:?} to the dataset");
                let extra: Vec<String> = extra.into_iter().cloned().collect();
                self.add_stations(&extra);
            }

            let key = row.key();
            if self.rows.insert(key, row).is_some() {
                log::debug!("Replaced row {} {}", key.0, key.1);
                summary.replaced += 1;
            } else {
                summary.inserted += 1;
            }
        }

        summary
    }

    /// Inserts an all-`NA` row for every `(date, metric)` with no row,
    /// from the earliest date in the dataset through the day before
    /// `today`. Returns the number of rows added.
    pub fn fill_gaps(&mut self, metrics: &[Metric], today: NaiveDate) -> usize {
        let missing = gaps::missing_keys(self, metrics, today);
        let added = missing.len();

        for (date, metric) in missing {
            let row = gaps::not_available_row(date, metric, &self.stations);
            self.rows.insert((date, metric), row);
        }

        if added > 0 {
            log::info!("Filled {added} missing row(s) with NA");
        }
        added
    }
}
