#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the weather bulletin toolchain.

mod update;

use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use met_bulletin_dataset::{CsvStore, DEFAULT_LOCK_TIMEOUT, DatasetLock, aggregate};
use met_bulletin_extract::{BulletinPipeline, CollectedDiagnostics, ProfileConfig, StrategyMode};
use met_bulletin_pdf::LoadOptions;
use serde::Serialize;

use crate::update::UpdateConfig;

#[derive(Parser)]
#[command(name = "met_bulletin", about = "Weather bulletin extraction tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ProfileArgs {
    /// Built-in bulletin profile (`weather` or `hydro`)
    #[arg(long, default_value = "weather")]
    profile: String,
    /// Profile TOML file; takes precedence over `--profile`
    #[arg(long)]
    config: Option<PathBuf>,
}

impl ProfileArgs {
    fn load(&self) -> Result<ProfileConfig, met_bulletin_extract::ExtractError> {
        match &self.config {
            Some(path) => ProfileConfig::load(path),
            None => ProfileConfig::builtin(&self.profile),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Extract every bulletin under a reports directory and merge the
    /// results into the dataset
    Update {
        #[command(flatten)]
        profile: ProfileArgs,
        /// Directory of `<YYYY-MM-DD>/` report folders
        #[arg(long, default_value = "reports")]
        reports: PathBuf,
        /// Dataset CSV to merge into
        #[arg(long)]
        dataset: PathBuf,
        /// Insert `NA` rows for dates with no data up to yesterday
        #[arg(long)]
        fill_gaps: bool,
        /// Union the output of every strategy instead of stopping at the
        /// first that yields candidates
        #[arg(long)]
        union: bool,
        /// Documents extracted concurrently (default: available cores)
        #[arg(long)]
        jobs: Option<usize>,
        /// Append diagnostics to this file as JSON lines
        #[arg(long)]
        diagnostics: Option<PathBuf>,
        /// Skip OCR for scanned PDFs and images
        #[arg(long)]
        no_ocr: bool,
    },
    /// Extract one document and print the result as JSON without touching
    /// the dataset
    Extract {
        /// Document to extract (`.pdf`, `.txt`, or an image)
        document: PathBuf,
        #[command(flatten)]
        profile: ProfileArgs,
        /// Date to use when the text states none (YYYY-MM-DD)
        #[arg(long)]
        fallback_date: Option<NaiveDate>,
        /// Union the output of every strategy
        #[arg(long)]
        union: bool,
        /// Skip OCR for scanned PDFs and images
        #[arg(long)]
        no_ocr: bool,
    },
    /// Fill date gaps in an existing dataset with `NA` rows
    FillGaps {
        #[command(flatten)]
        profile: ProfileArgs,
        /// Dataset CSV to fill
        #[arg(long)]
        dataset: PathBuf,
    },
    /// List the profile's canonical stations
    Stations {
        #[command(flatten)]
        profile: ProfileArgs,
    },
}

/// `extract` output.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExtractReport {
    extraction: met_bulletin_extract::DocumentExtraction,
    rows: Vec<met_bulletin_observation_models::ReadingRow>,
    diagnostics: Vec<met_bulletin_extract::Diagnostic>,
}

fn init_logger() {
    let filters = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_owned());
    pretty_env_logger::formatted_builder()
        .parse_filters(&filters)
        .init();
}

fn default_jobs() -> usize {
    std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
}

#[allow(clippy::too_many_lines)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logger();
    let cli = Cli::parse();
    let today = chrono::Local::now().date_naive();

    match cli.command {
        Commands::Update {
            profile,
            reports,
            dataset,
            fill_gaps,
            union,
            jobs,
            diagnostics,
            no_ocr,
        } => {
            let mut profile = profile.load()?;
            if union {
                profile.extraction.mode = StrategyMode::Union;
            }
            let pipeline = Arc::new(BulletinPipeline::from_profile(&profile)?);

            let mut load = LoadOptions::new(today);
            if no_ocr {
                load = load.without_ocr();
            }

            let started = std::time::Instant::now();
            update::run(
                pipeline,
                UpdateConfig {
                    reports,
                    dataset,
                    absent: profile.output.absent,
                    fill_gaps: fill_gaps || profile.output.fill_gaps,
                    jobs: jobs.unwrap_or_else(default_jobs),
                    diagnostics,
                    load,
                    today,
                },
            )
            .await?;
            log::info!("Update finished in {:.1}s", started.elapsed().as_secs_f64());
        }
        Commands::Extract {
            document,
            profile,
            fallback_date,
            union,
            no_ocr,
        } => {
            let mut profile = profile.load()?;
            if union {
                profile.extraction.mode = StrategyMode::Union;
            }
            let pipeline = BulletinPipeline::from_profile(&profile)?;

            let mut load = LoadOptions::new(today);
            if no_ocr {
                load = load.without_ocr();
            }
            let mut doc = met_bulletin_pdf::load_document(&document, &load)?;
            if let Some(date) = fallback_date {
                doc.fallback_date = date;
            }

            let mut sink = CollectedDiagnostics::new();
            let extraction = pipeline.extract(&doc, &mut sink);
            let rows = aggregate(
                &extraction.observations,
                pipeline.catalog().stations(),
                profile.output.absent,
            );

            let report = ExtractReport {
                extraction,
                rows,
                diagnostics: sink.into_entries(),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::FillGaps { profile, dataset } => {
            let profile = profile.load()?;
            let stations = profile.catalog.stations.clone();
            let metrics = profile.extraction.metrics.clone();

            let added = tokio::task::spawn_blocking(move || {
                let _lock = DatasetLock::acquire(&dataset, DEFAULT_LOCK_TIMEOUT)?;
                let store = CsvStore::new(&dataset);
                let mut ds = store.load(&stations)?;
                let added = ds.fill_gaps(&metrics, today);
                if added > 0 {
                    store.save(&ds)?;
                }
                Ok::<_, met_bulletin_dataset::DatasetError>(added)
            })
            .await??;
            println!("Added {added} row(s)");
        }
        Commands::Stations { profile } => {
            let profile = profile.load()?;
            let pipeline = BulletinPipeline::from_profile(&profile)?;
            println!("{} ({} stations)", pipeline.profile(), pipeline.catalog().len());
            println!("{}", "-".repeat(40));
            for station in pipeline.catalog().stations() {
                println!("{station}");
            }
        }
    }

    Ok(())
}
