//! CSV persistence.
//!
//! Layout: `Date,Type,<station columns...>,Total,Average,Max,Min`, one row
//! per `(date, metric)`. Cells are a number, `NA`, or blank. Saving writes
//! a temporary file next to the target and renames it over the target.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;
use met_bulletin_observation_models::{CellValue, Metric, ReadingRow, format_number};

use crate::lock::DatasetLock;
use crate::{Dataset, DatasetError, MergeSummary};

const DATE_COLUMN: &str = "Date";
const TYPE_COLUMN: &str = "Type";
const STAT_COLUMNS: [&str; 4] = ["Total", "Average", "Max", "Min"];
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Options for [`CsvStore::update`].
#[derive(Debug, Clone)]
pub struct UpdateOptions {
    /// Gap-fill these metrics after merging. Empty disables gap filling.
    pub fill_gap_metrics: Vec<Metric>,
    /// Run date; gaps are filled through the day before.
    pub today: NaiveDate,
    /// How long to wait for another writer.
    pub lock_timeout: Duration,
}

/// Outcome of [`CsvStore::update`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateSummary {
    pub merge: MergeSummary,
    /// Rows added by gap filling.
    pub gap_rows: usize,
    /// Rows in the persisted dataset.
    pub total_rows: usize,
}

/// A dataset persisted as a CSV file.
#[derive(Debug, Clone)]
pub struct CsvStore {
    path: PathBuf,
}

impl CsvStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the dataset. Station columns are `stations` followed by any
    /// other station columns found in the file. A missing file is an empty
    /// dataset. Statistics are recomputed from the station cells.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError`] if the file cannot be read or is malformed.
    pub fn load(&self, stations: &[String]) -> Result<Dataset, DatasetError> {
        let mut dataset = Dataset::new(stations.to_vec());
        if !self.path.exists() {
            log::info!("No dataset at {}; starting empty", self.path.display());
            return Ok(dataset);
        }

        let mut reader = csv::ReaderBuilder::new()
            .flexible(false)
            .from_path(&self.path)?;

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_owned())
            .collect();
        let file_stations = station_columns(&headers)?;
        dataset.add_stations(file_stations);

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            let line = record.position().map_or(0, csv::Position::line);
            rows.push(parse_row(&record, file_stations, line)?);
        }

        log::info!("Loaded {} row(s) from {}", rows.len(), self.path.display());
        dataset.merge(rows);
        Ok(dataset)
    }

    /// Atomically replaces the file with `dataset`.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError`] if writing or renaming fails.
    pub fn save(&self, dataset: &Dataset) -> Result<(), DatasetError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        {
            let mut writer = csv::Writer::from_writer(tmp.as_file_mut());
            write_dataset(&mut writer, dataset)?;
            writer.flush()?;
        }
        tmp.as_file_mut().flush()?;
        tmp.persist(&self.path).map_err(|e| DatasetError::Io(e.error))?;

        log::info!("Wrote {} row(s) to {}", dataset.len(), self.path.display());
        Ok(())
    }

    /// Merges `rows` into the persisted dataset under the write lock:
    /// load, merge (last write wins), optionally gap-fill, save.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError`] if the lock cannot be taken or loading or
    /// saving fails.
    pub fn update(
        &self,
        stations: &[String],
        rows: Vec<ReadingRow>,
        options: &UpdateOptions,
    ) -> Result<UpdateSummary, DatasetError> {
        let _lock = DatasetLock::acquire(&self.path, options.lock_timeout)?;

        let mut dataset = self.load(stations)?;
        let merge = dataset.merge(rows);
        let gap_rows = if options.fill_gap_metrics.is_empty() {
            0
        } else {
            dataset.fill_gaps(&options.fill_gap_metrics, options.today)
        };

        self.save(&dataset)?;

        Ok(UpdateSummary {
            merge,
            gap_rows,
            total_rows: dataset.len(),
        })
    }
}

/// Validates the header and returns its station columns.
fn station_columns(headers: &[String]) -> Result<&[String], DatasetError> {
    if headers.len() < 2 + STAT_COLUMNS.len()
        || headers[0] != DATE_COLUMN
        || headers[1] != TYPE_COLUMN
    {
        return Err(DatasetError::MalformedHeader(headers.join(",")));
    }

    let split = headers.len() - STAT_COLUMNS.len();
    if headers[split..] != STAT_COLUMNS {
        return Err(DatasetError::MalformedHeader(headers.join(",")));
    }

    Ok(&headers[2..split])
}

fn parse_row(
    record: &csv::StringRecord,
    stations: &[String],
    line: u64,
) -> Result<ReadingRow, DatasetError> {
    let malformed = |message: String| DatasetError::MalformedRow { line, message };

    let date_raw = record.get(0).unwrap_or("").trim();
    let date = NaiveDate::parse_from_str(date_raw, DATE_FORMAT)
        .map_err(|e| malformed(format!("bad date '{date_raw}': {e}")))?;

    let type_raw = record.get(1).unwrap_or("").trim();
    let metric: Metric = type_raw
        .parse()
        .map_err(|_| malformed(format!("bad type '{type_raw}'")))?;

    let mut values = BTreeMap::new();
    for (idx, station) in stations.iter().enumerate() {
        let raw = record.get(idx + 2).unwrap_or("");
        let cell: CellValue = raw
            .parse()
            .map_err(|e| malformed(format!("{station}: {e}")))?;
        if cell != CellValue::Missing {
            values.insert(station.clone(), cell);
        }
    }

    Ok(ReadingRow::new(date, metric, values))
}

fn write_dataset<W: Write>(writer: &mut csv::Writer<W>, dataset: &Dataset) -> Result<(), DatasetError> {
    let mut header = vec![DATE_COLUMN, TYPE_COLUMN];
    header.extend(dataset.stations().iter().map(String::as_str));
    header.extend(STAT_COLUMNS);
    writer.write_record(&header)?;

    for row in dataset.rows() {
        let mut record = Vec::with_capacity(header.len());
        record.push(row.date.format(DATE_FORMAT).to_string());
        record.push(row.metric.to_string());
        record.extend(dataset.stations().iter().map(|s| row.value(s).to_string()));
        match row.stats {
            Some(stats) => record.extend(
                [stats.total, stats.average, stats.max, stats.min].map(format_number),
            ),
            None => record.extend(std::iter::repeat_n(String::new(), STAT_COLUMNS.len())),
        }
        writer.write_record(&record)?;
    }

    Ok(())
}
