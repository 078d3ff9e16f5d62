//! Gap filling.

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use met_bulletin_observation_models::{CellValue, Metric, ReadingRow, RowKey};

use crate::Dataset;

/// Keys with no row between the dataset's earliest date and the day before
/// `today`, inclusive, in key order.
#[must_use]
pub fn missing_keys(dataset: &Dataset, metrics: &[Metric], today: NaiveDate) -> Vec<RowKey> {
    let Some(first) = dataset.first_date() else {
        return Vec::new();
    };
    let Some(yesterday) = today.checked_sub_days(Days::new(1)) else {
        return Vec::new();
    };

    let mut metrics = metrics.to_vec();
    metrics.sort();
    metrics.dedup();

    first
        .iter_days()
        .take_while(|date| *date <= yesterday)
        .flat_map(|date| metrics.iter().map(move |&metric| (date, metric)))
        .filter(|key| dataset.get(key).is_none())
        .collect()
}

/// A row with every station set to `NA`.
#[must_use]
pub fn not_available_row(date: NaiveDate, metric: Metric, stations: &[String]) -> ReadingRow {
    let values: BTreeMap<String, CellValue> = stations
        .iter()
        .map(|s| (s.clone(), CellValue::NotAvailable))
        .collect();
    ReadingRow::new(date, metric, values)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn dataset_with(days: &[u32], metric: Metric) -> Dataset {
        let mut ds = Dataset::new(vec!["Colombo".to_owned(), "Galle".to_owned()]);
        ds.merge(days.iter().map(|&d| {
            let mut values = BTreeMap::new();
            values.insert("Colombo".to_owned(), CellValue::Number(1.0));
            ReadingRow::new(ymd(2025, 6, d), metric, values)
        }));
        ds
    }

    #[test]
    fn one_row_per_missing_date_and_metric() {
        let mut ds = dataset_with(&[1, 3], Metric::Rainfall);

        let added = ds.fill_gaps(&[Metric::Rainfall], ymd(2025, 6, 5));

        assert_eq!(added, 2);
        let keys: Vec<_> = ds.rows().map(ReadingRow::key).collect();
        assert_eq!(
            keys,
            (1..=4)
                .map(|d| (ymd(2025, 6, d), Metric::Rainfall))
                .collect::<Vec<_>>()
        );

        let filled = ds.get(&(ymd(2025, 6, 2), Metric::Rainfall)).unwrap();
        assert_eq!(filled.value("Colombo"), CellValue::NotAvailable);
        assert_eq!(filled.value("Galle"), CellValue::NotAvailable);
        assert_eq!(filled.stats, None);
    }

    #[test]
    fn fills_every_requested_metric() {
        let ds = dataset_with(&[1], Metric::Max);
        let missing = missing_keys(&ds, Metric::ALL, ymd(2025, 6, 3));
        assert_eq!(
            missing,
            vec![
                (ymd(2025, 6, 1), Metric::Min),
                (ymd(2025, 6, 1), Metric::Rainfall),
                (ymd(2025, 6, 2), Metric::Max),
                (ymd(2025, 6, 2), Metric::Min),
                (ymd(2025, 6, 2), Metric::Rainfall),
            ]
        );
    }

    #[test]
    fn never_fills_today_or_later() {
        let ds = dataset_with(&[10], Metric::Max);
        assert!(missing_keys(&ds, &[Metric::Max], ymd(2025, 6, 10)).is_empty());
        assert!(missing_keys(&ds, &[Metric::Max], ymd(2025, 6, 11)).is_empty());
    }

    #[test]
    fn empty_dataset_has_no_gaps() {
        let ds = Dataset::new(vec!["Colombo".to_owned()]);
        assert!(missing_keys(&ds, Metric::ALL, ymd(2025, 6, 10)).is_empty());
    }
}
