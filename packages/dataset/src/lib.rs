#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! The historical reading dataset.
//!
//! Observations from one document are folded into [`ReadingRow`]s by
//! [`aggregate`], merged into a [`Dataset`] with last-write-wins semantics,
//! optionally gap-filled with `NA` rows, and persisted as CSV by
//! [`CsvStore`] under a cross-process [`DatasetLock`].
//!
//! [`ReadingRow`]: met_bulletin_observation_models::ReadingRow

pub mod aggregate;
pub mod dataset;
pub mod gaps;
pub mod lock;
pub mod store;

use std::path::PathBuf;

pub use aggregate::aggregate;
pub use dataset::{Dataset, MergeSummary};
pub use lock::{DEFAULT_LOCK_TIMEOUT, DatasetLock};
pub use store::{CsvStore, UpdateOptions, UpdateSummary};

/// Errors from loading, merging, or persisting a dataset.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    /// Filesystem I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The CSV reader or writer failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The header is not `Date,Type,<stations>,Total,Average,Max,Min`.
    #[error("unexpected dataset header: {0}")]
    MalformedHeader(String),

    /// A data row could not be parsed.
    #[error("malformed row at line {line}: {message}")]
    MalformedRow {
        /// 1-based line in the file.
        line: u64,
        /// What was wrong with it.
        message: String,
    },

    /// Another writer holds the dataset lock.
    #[error("dataset is locked by {}: {}", pid.map_or_else(|| "an unknown process".to_owned(), |p| format!("pid {p}")), path.display())]
    Locked {
        /// The lock file.
        path: PathBuf,
        /// The holder's pid, when readable.
        pid: Option<i32>,
    },
}
