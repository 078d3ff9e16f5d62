//! Row aggregation: observations grouped into one row per `(date, metric)`.

use std::collections::BTreeMap;

use met_bulletin_observation_models::{AbsentPolicy, CellValue, Observation, ReadingRow, RowKey};

/// Groups observations into reading rows across the full station list.
///
/// Stations with no observation get `absent`'s cell. Rows come back sorted
/// by key, with statistics computed over numeric cells only. When a key
/// holds two readings for one station, the first is kept.
#[must_use]
pub fn aggregate(
    observations: &[Observation],
    stations: &[String],
    absent: AbsentPolicy,
) -> Vec<ReadingRow> {
    let mut groups: BTreeMap<RowKey, BTreeMap<String, CellValue>> = BTreeMap::new();

    for obs in observations {
        let values = groups.entry((obs.date, obs.metric)).or_default();
        values.entry(obs.station.clone()).or_insert(obs.value);
    }

    groups
        .into_iter()
        .map(|((date, metric), mut values)| {
            let filler = absent.cell();
            if filler != CellValue::Missing {
                for station in stations {
                    values.entry(station.clone()).or_insert(filler);
                }
            }
            values.retain(|_, v| *v != CellValue::Missing);
            ReadingRow::new(date, metric, values)
        })
        .collect()
}
