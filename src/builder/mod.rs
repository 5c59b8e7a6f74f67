//! File-level orchestration of the reconstruction pipeline.
//!
//! [`RawFileBuilder::build`] reads the scan source twice. The first pass
//! validates and filters every scan and feeds each mobility value to the
//! [`MobilityAxisIndexer`]; the second pass groups scans into frames and hands
//! them to the [`FrameAssembler`](crate::frame::FrameAssembler) one at a time.
//! Files without any mobility value take the flat LC-MS path instead.

use std::fmt;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::frame::FrameDiagnostics;
use crate::ingest::{IngestError, MobilityType, RawMobilityScan};
use crate::mobility::MobilityAxisIndexer;
use crate::raw_file::RawFile;
use crate::source::{ScanSource, SourceError};
use crate::storage::ArrayStorage;

pub use error::ImportError;
pub use filter::{is_waters_lockmass_scan, waters_function, ScanFilter};
pub use task::ImportTask;

mod error;
mod filter;
mod flat;
mod ims;
mod task;

#[cfg(test)]
mod tests;

/// Import settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Scan selection applied before reconstruction
    pub scan_filter: ScanFilter,
    /// Drop Waters lock-mass functions (`function=N` with `N != 1`)
    pub exclude_waters_lockmass: bool,
    /// Log progress every this many frames (or flat scans)
    pub progress_interval: usize,
}

impl ImportConfig {
    fn select(&self, scan: &RawMobilityScan) -> Selection {
        if let Err(violation) = scan.validate_contract() {
            Selection::Invalid(violation)
        } else if self.exclude_waters_lockmass && is_waters_lockmass_scan(&scan.id) {
            Selection::Lockmass
        } else if !self.scan_filter.accepts(scan) {
            Selection::Filtered
        } else {
            Selection::Keep
        }
    }

    /// Whether `scan` is valid and survives lock-mass exclusion and the scan filter.
    pub fn keeps(&self, scan: &RawMobilityScan) -> bool {
        matches!(self.select(scan), Selection::Keep)
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            scan_filter: ScanFilter::default(),
            exclude_waters_lockmass: true,
            progress_interval: 100,
        }
    }
}

/// Counters collected while importing one file.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportStats {
    /// Scans read from the source
    pub scans_seen: usize,
    /// Scans that passed exclusion and filtering
    pub scans_kept: usize,
    /// Scans skipped for breaking the ingestion contract
    pub invalid_scans: usize,
    /// Waters lock-mass scans excluded
    pub excluded_lockmass: usize,
    /// Scans removed by the scan filter
    pub filtered_out: usize,
    /// Kept scans without a mobility value in an IMS file
    pub without_mobility: usize,
    /// Frames assembled
    pub frames: usize,
    /// Buckets on the mobility axis
    pub buckets: usize,
    /// Precursor windows over all frames
    pub precursor_windows: usize,
    /// Flat scans stored
    pub flat_scans: usize,
    /// Whether flat scans had to be sorted by retention time
    pub resorted: bool,
    /// Recovered frame assembly anomalies
    pub diagnostics: FrameDiagnostics,
}

impl fmt::Display for ImportStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.frames > 0 {
            write!(
                f,
                "{} frames x {} buckets from {} of {} scans, {} precursor windows, {} synthesized buckets",
                self.frames,
                self.buckets,
                self.scans_kept,
                self.scans_seen,
                self.precursor_windows,
                self.diagnostics.synthesized
            )
        } else {
            write!(
                f,
                "{} flat scans from {} of {} scans",
                self.flat_scans, self.scans_kept, self.scans_seen
            )
        }
    }
}

/// An import that left no scans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmptyImport {
    /// File name
    pub file: String,
    /// Whether the scan filter was active
    pub filters_active: bool,
    /// Scans read before exclusion and filtering
    pub scans_seen: usize,
}

impl fmt::Display for EmptyImport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} had 0 scans after import. ", self.file)?;
        if self.filters_active {
            write!(
                f,
                "Scan filters were active in import and filtered out {} scans, \
                 either deactivate the filters or remove this file from the import list",
                self.scans_seen
            )
        } else {
            f.write_str("Scan filters were off.")
        }
    }
}

/// Result of a build that did not fail.
pub enum ImportOutcome<S> {
    /// The file was imported
    Completed(RawFile<S>),
    /// Nothing survived filtering; not an error
    Empty(EmptyImport),
    /// The task was cancelled; nothing is published
    Cancelled,
}

impl<S> ImportOutcome<S> {
    /// The imported file, if the import completed.
    pub fn completed(self) -> Option<RawFile<S>> {
        match self {
            ImportOutcome::Completed(file) => Some(file),
            _ => None,
        }
    }

    /// Whether the task was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ImportOutcome::Cancelled)
    }
}

enum Selection {
    Keep,
    Invalid(IngestError),
    Lockmass,
    Filtered,
}

struct Survey {
    indexer: MobilityAxisIndexer,
    stats: ImportStats,
    mobility_scans: usize,
    frame_count: usize,
}

/// Builds a [`RawFile`] from a [`ScanSource`] into an [`ArrayStorage`].
pub struct RawFileBuilder<S> {
    config: ImportConfig,
    storage: S,
    task: ImportTask,
}

impl<S: ArrayStorage> RawFileBuilder<S> {
    /// Create a builder with default configuration.
    pub fn new(storage: S) -> Self {
        Self::with_config(storage, ImportConfig::default())
    }

    /// Create a builder with custom configuration.
    pub fn with_config(storage: S, config: ImportConfig) -> Self {
        Self {
            config,
            storage,
            task: ImportTask::new(),
        }
    }

    /// Report progress and poll cancellation through `task`.
    pub fn with_task(mut self, task: ImportTask) -> Self {
        self.task = task;
        self
    }

    /// The task handle of this import.
    pub fn task(&self) -> &ImportTask {
        &self.task
    }

    /// Import every scan of `source`.
    ///
    /// `instrument` decides the clustering width and whether the axis may be
    /// reversed. Files whose kept scans carry no mobility value are imported
    /// as flat LC-MS data regardless.
    pub fn build<Src: ScanSource>(
        self,
        mut source: Src,
        instrument: MobilityType,
    ) -> Result<ImportOutcome<S>, ImportError> {
        let file = source.name().to_string();
        self.task.set_file_name(&file);
        info!("Importing {file} ({instrument} mobility)");

        let Some(survey) = self.survey(&mut source, &file, instrument)? else {
            info!("Import of {file} cancelled");
            return Ok(ImportOutcome::Cancelled);
        };

        if survey.stats.scans_kept == 0 {
            let empty = EmptyImport {
                file,
                filters_active: self.config.scan_filter.is_active(),
                scans_seen: survey.stats.scans_seen,
            };
            warn!("{empty}");
            return Ok(ImportOutcome::Empty(empty));
        }

        source.rewind().map_err(read_error(&file))?;

        if survey.mobility_scans > 0 {
            self.build_ims(source, file, instrument, survey)
        } else {
            if instrument.is_ims() {
                info!("{file} has no mobility values, importing as LC-MS data");
            }
            self.build_flat(source, file, survey.stats)
        }
    }

    fn survey<Src: ScanSource>(
        &self,
        source: &mut Src,
        file: &str,
        instrument: MobilityType,
    ) -> Result<Option<Survey>, ImportError> {
        let mut survey = Survey {
            indexer: MobilityAxisIndexer::new(instrument.is_trapped()),
            stats: ImportStats::default(),
            mobility_scans: 0,
            frame_count: 0,
        };
        let mut last_frame = None;
        if let Some(total) = source.len_hint() {
            debug!("Surveying {total} scans of {file}");
        }

        while let Some(scan) = source.next_scan().map_err(read_error(file))? {
            if self.task.is_cancelled() {
                return Ok(None);
            }
            survey.stats.scans_seen += 1;

            match self.config.select(&scan) {
                Selection::Invalid(violation) => {
                    warn!("Skipping invalid scan '{}' in {file}: {violation}", scan.id);
                    survey.stats.invalid_scans += 1;
                    continue;
                }
                Selection::Lockmass => {
                    survey.stats.excluded_lockmass += 1;
                    continue;
                }
                Selection::Filtered => {
                    survey.stats.filtered_out += 1;
                    continue;
                }
                Selection::Keep => survey.stats.scans_kept += 1,
            }

            if let Some(mobility) = scan.mobility {
                survey.indexer.observe(mobility);
                survey.mobility_scans += 1;
                if last_frame != Some(scan.frame_index) {
                    survey.frame_count += 1;
                    last_frame = Some(scan.frame_index);
                }
            }
        }

        if survey.stats.invalid_scans > 0 {
            warn!(
                "Skipped {} scans of {file} that broke the ingestion contract",
                survey.stats.invalid_scans
            );
        }
        if survey.stats.excluded_lockmass > 0 {
            info!(
                "Excluded {} Waters lock-mass scans from {file}",
                survey.stats.excluded_lockmass
            );
        }
        info!(
            "{file}: kept {} of {} scans, {} with mobility in {} frames",
            survey.stats.scans_kept,
            survey.stats.scans_seen,
            survey.mobility_scans,
            survey.frame_count
        );
        Ok(Some(survey))
    }
}

fn read_error(file: &str) -> impl FnOnce(SourceError) -> ImportError + '_ {
    move |source| ImportError::Read {
        file: file.to_string(),
        source,
    }
}

fn progress(done: usize, total: usize, unit: &str) {
    let pct = if total == 0 {
        100.0
    } else {
        done as f64 / total as f64 * 100.0
    };
    info!("Progress: {done}/{total} {unit} ({pct:.1}%)");
}
