//! Batch update: extract every document under a reports directory and merge
//! the results into the dataset.
//!
//! Documents are extracted concurrently on blocking workers that share only
//! the immutable pipeline. Rows are then folded in document-date order and
//! merged once, under the dataset's write lock.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;
use futures::stream::{self, StreamExt as _};
use met_bulletin_dataset::{CsvStore, DEFAULT_LOCK_TIMEOUT, UpdateOptions, UpdateSummary, aggregate};
use met_bulletin_extract::{
    BulletinPipeline, CollectedDiagnostics, Diagnostic, DiagnosticsSink, DocumentExtraction,
    LogDiagnostics,
};
use met_bulletin_observation_models::{AbsentPolicy, ReadingRow};
use met_bulletin_pdf::LoadOptions;

/// Settings for one `update` run.
#[derive(Debug, Clone)]
pub struct UpdateConfig {
    pub reports: PathBuf,
    pub dataset: PathBuf,
    pub absent: AbsentPolicy,
    pub fill_gaps: bool,
    pub jobs: usize,
    /// Append diagnostics here as JSON lines.
    pub diagnostics: Option<PathBuf>,
    pub load: LoadOptions,
    pub today: NaiveDate,
}

/// What one worker produced for one document.
#[derive(Debug)]
pub struct DocumentOutcome {
    pub path: PathBuf,
    /// `None` when the document could not be loaded.
    pub extraction: Option<DocumentExtraction>,
    pub diagnostics: CollectedDiagnostics,
}

/// Loads and extracts one document. Load failures become a diagnostic.
pub fn process_document(
    pipeline: &BulletinPipeline,
    path: &Path,
    load: &LoadOptions,
) -> DocumentOutcome {
    let mut diagnostics = CollectedDiagnostics::new();

    let extraction = match met_bulletin_pdf::load_document(path, load) {
        Ok(document) => Some(pipeline.extract(&document, &mut diagnostics)),
        Err(e) => {
            diagnostics.record(Diagnostic::LoadFailed {
                document: path.display().to_string(),
                error: e.to_string(),
            });
            None
        }
    };

    DocumentOutcome {
        path: path.to_path_buf(),
        extraction,
        diagnostics,
    }
}

/// Extracts `paths` with at most `jobs` documents in flight. Outcomes come
/// back in input order.
pub async fn extract_all(
    pipeline: Arc<BulletinPipeline>,
    paths: Vec<PathBuf>,
    load: &LoadOptions,
    jobs: usize,
) -> Vec<DocumentOutcome> {
    stream::iter(paths.into_iter().map(|path| {
        let pipeline = Arc::clone(&pipeline);
        let load = load.clone();
        async move {
            let label = path.display().to_string();
            match tokio::task::spawn_blocking(move || process_document(&pipeline, &path, &load))
                .await
            {
                Ok(outcome) => Some(outcome),
                Err(e) => {
                    log::error!("{label}: extraction worker failed: {e}");
                    None
                }
            }
        }
    }))
    .buffered(jobs.max(1))
    .filter_map(std::future::ready)
    .collect()
    .await
}

/// Aggregates each document separately and concatenates the rows, ordering
/// documents by observation date. Documents with the same date keep their
/// input order, so the later one wins the merge.
#[must_use]
pub fn rows_in_date_order(
    outcomes: &[DocumentOutcome],
    stations: &[String],
    absent: AbsentPolicy,
) -> Vec<ReadingRow> {
    let mut extractions: Vec<&DocumentExtraction> = outcomes
        .iter()
        .filter_map(|o| o.extraction.as_ref())
        .collect();
    extractions.sort_by_key(|e| e.date.date);

    extractions
        .into_iter()
        .flat_map(|e| aggregate(&e.observations, stations, absent))
        .collect()
}

fn append_jsonl(path: &Path, diagnostics: &CollectedDiagnostics) -> std::io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    diagnostics.write_jsonl(std::io::BufWriter::new(file))
}

/// Runs a full update.
///
/// # Errors
///
/// Returns an error if the reports directory cannot be listed, the
/// diagnostics file cannot be written, or the dataset cannot be merged and
/// persisted.
pub async fn run(
    pipeline: Arc<BulletinPipeline>,
    config: UpdateConfig,
) -> Result<UpdateSummary, Box<dyn std::error::Error>> {
    let paths = met_bulletin_pdf::discover_documents(&config.reports)?;
    log::info!(
        "Found {} document(s) under {} (jobs={})",
        paths.len(),
        config.reports.display(),
        config.jobs
    );

    let outcomes = extract_all(Arc::clone(&pipeline), paths, &config.load, config.jobs).await;

    let stations = pipeline.catalog().stations().to_vec();
    let rows = rows_in_date_order(&outcomes, &stations, config.absent);

    let mut diagnostics = CollectedDiagnostics::new();
    let mut failed = 0_usize;
    for outcome in outcomes {
        if outcome.extraction.is_none() {
            failed += 1;
        }
        for diagnostic in outcome.diagnostics.into_entries() {
            LogDiagnostics.record(diagnostic.clone());
            diagnostics.record(diagnostic);
        }
    }
    if let Some(path) = &config.diagnostics
        && !diagnostics.is_empty()
    {
        append_jsonl(path, &diagnostics)?;
        log::info!("Appended {} diagnostic(s) to {}", diagnostics.len(), path.display());
    }
    if failed > 0 {
        log::warn!("{failed} document(s) could not be loaded");
    }

    let store = CsvStore::new(&config.dataset);
    let options = UpdateOptions {
        fill_gap_metrics: if config.fill_gaps {
            pipeline.metrics().to_vec()
        } else {
            Vec::new()
        },
        today: config.today,
        lock_timeout: DEFAULT_LOCK_TIMEOUT,
    };
    let summary =
        tokio::task::spawn_blocking(move || store.update(&stations, rows, &options)).await??;

    log::info!(
        "Dataset {}: {} inserted, {} replaced, {} gap row(s), {} total",
        config.dataset.display(),
        summary.merge.inserted,
        summary.merge.replaced,
        summary.gap_rows,
        summary.total_rows
    );

    Ok(summary)
}
