use anyhow::{Context, Result};
use log::info;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

#[cfg(feature = "colorized_output")]
use console::style;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use imsframe::builder::{EmptyImport, ImportConfig, ImportOutcome, ImportStats, RawFileBuilder};
use imsframe::ingest::MobilityType;
use imsframe::source::JsonLinesScanSource;
use imsframe::storage::{ArrayStorage, MemoryStorage, SpillFileStorage};

use super::config::{Config, StorageKind};

enum Report {
    Imported {
        input: PathBuf,
        summary: PathBuf,
        stats: ImportStats,
    },
    Empty(EmptyImport),
    Cancelled(PathBuf),
}

/// Import one or more JSON Lines scan dumps
pub fn run(
    inputs: Vec<PathBuf>,
    instrument: Option<MobilityType>,
    config_path: Option<PathBuf>,
    output: Option<PathBuf>,
    storage: Option<StorageKind>,
) -> Result<()> {
    let config = match config_path {
        Some(path) => {
            info!("Loading config from {}", path.display());
            Config::from_file(&path)?
        }
        None => Config::default(),
    };

    let instrument = instrument
        .or(config.import.instrument)
        .unwrap_or(MobilityType::Tims);
    let storage = storage.or(config.import.storage).unwrap_or_default();
    let import_config = config.import.import_config();

    if let Some(dir) = &output {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
    }

    info!(
        "Importing {} file(s) as {instrument} data with {storage:?} storage",
        inputs.len()
    );

    #[cfg(feature = "parallel")]
    let iter = inputs.par_iter();
    #[cfg(not(feature = "parallel"))]
    let iter = inputs.iter();

    let results: Vec<Result<Report>> = iter
        .map(|input| import_one(input, instrument, storage, &import_config, output.as_deref()))
        .collect();

    let mut failures = 0;
    for (input, result) in inputs.iter().zip(results) {
        match result {
            Ok(report) => print_report(&report),
            Err(e) => {
                failures += 1;
                eprintln!("{}: {e:#}", input.display());
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{failures} of {} imports failed", inputs.len());
    }
    Ok(())
}

fn open_storage(kind: StorageKind) -> Result<Box<dyn ArrayStorage + Send>> {
    Ok(match kind {
        StorageKind::Memory => Box::new(MemoryStorage::new()),
        StorageKind::Spill => {
            Box::new(SpillFileStorage::new().context("Failed to create spill file")?)
        }
    })
}

fn summary_path(input: &Path, output: Option<&Path>) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "import".to_string());
    let name = format!("{stem}.summary.json");
    match output {
        Some(dir) => dir.join(name),
        None => input.with_file_name(name),
    }
}

fn import_one(
    input: &Path,
    instrument: MobilityType,
    storage: StorageKind,
    config: &ImportConfig,
    output: Option<&Path>,
) -> Result<Report> {
    let source = JsonLinesScanSource::open(input)
        .with_context(|| format!("Failed to open {}", input.display()))?;
    let builder = RawFileBuilder::with_config(open_storage(storage)?, config.clone());

    let file = match builder
        .build(source, instrument)
        .with_context(|| format!("Failed to import {}", input.display()))?
    {
        ImportOutcome::Completed(file) => file,
        ImportOutcome::Empty(empty) => return Ok(Report::Empty(empty)),
        ImportOutcome::Cancelled => return Ok(Report::Cancelled(input.to_path_buf())),
    };

    let summary_file = summary_path(input, output);
    let writer = BufWriter::new(
        File::create(&summary_file)
            .with_context(|| format!("Failed to create {}", summary_file.display()))?,
    );
    serde_json::to_writer_pretty(writer, &file.summary())
        .with_context(|| format!("Failed to write {}", summary_file.display()))?;

    Ok(Report::Imported {
        input: input.to_path_buf(),
        summary: summary_file,
        stats: file.stats().clone(),
    })
}

#[cfg(feature = "colorized_output")]
fn print_report(report: &Report) {
    match report {
        Report::Imported {
            input,
            summary,
            stats,
        } => {
            println!("{} {}", style("Imported").green().bold(), input.display());
            println!("  {stats}");
            println!("  {}: {}", style("Summary").bold(), summary.display());
        }
        Report::Empty(empty) => println!("{} {empty}", style("Empty").yellow().bold()),
        Report::Cancelled(input) => {
            println!("{} {}", style("Cancelled").red().bold(), input.display())
        }
    }
}

#[cfg(not(feature = "colorized_output"))]
fn print_report(report: &Report) {
    match report {
        Report::Imported {
            input,
            summary,
            stats,
        } => {
            println!("Imported {}", input.display());
            println!("  {stats}");
            println!("  Summary: {}", summary.display());
        }
        Report::Empty(empty) => println!("Empty {empty}"),
        Report::Cancelled(input) => println!("Cancelled {}", input.display()),
    }
}
