use log::info;

use super::{progress, read_error, ImportError, ImportOutcome, ImportStats, RawFileBuilder};
use crate::raw_file::{RawFile, Scan};
use crate::source::ScanSource;
use crate::storage::{ArrayStorage, ScanPayload};

impl<S: ArrayStorage> RawFileBuilder<S> {
    pub(super) fn build_flat<Src: ScanSource>(
        self,
        mut source: Src,
        file: String,
        mut stats: ImportStats,
    ) -> Result<ImportOutcome<S>, ImportError> {
        let Self {
            config,
            mut storage,
            task,
        } = self;

        let total = stats.scans_kept;
        task.begin(total);
        let mut scans: Vec<Scan> = Vec::with_capacity(total);

        while let Some(raw) = source.next_scan().map_err(read_error(&file))? {
            if task.is_cancelled() {
                info!("Import of {file} cancelled after {} scans", scans.len());
                return Ok(ImportOutcome::Cancelled);
            }
            if !config.keeps(&raw) {
                continue;
            }

            let payload = ScanPayload::encode_arrays(&raw.mz_array, &raw.intensity_array);
            let storage_offset = storage
                .append(&payload)
                .map_err(|source| ImportError::Storage {
                    file: file.clone(),
                    source,
                })?;

            scans.push(Scan {
                scan_number: raw.scan_number,
                ms_level: raw.ms_level,
                retention_time: raw.retention_time,
                polarity: raw.polarity,
                storage_offset,
                base_peak_index: raw.base_peak_index(),
                peak_count: raw.peak_count(),
                id: raw.id,
                precursors: raw.precursors,
            });

            let done = task.advance();
            if config.progress_interval > 0 && done % config.progress_interval == 0 {
                progress(done, total, "scans");
            }
        }

        let ordered = scans.windows(2).all(|w| {
            w[0].retention_time < w[1].retention_time && w[0].scan_number < w[1].scan_number
        });
        if !ordered {
            info!("Scans of {file} are not in retention time order, sorting and renumbering");
            scans.sort_by(|a, b| a.retention_time.total_cmp(&b.retention_time));
            for (number, scan) in (1..).zip(scans.iter_mut()) {
                scan.scan_number = number;
            }
            stats.resorted = true;
        }

        stats.flat_scans = scans.len();
        info!("Finished {file}: {stats}");
        Ok(ImportOutcome::Completed(RawFile::flat(file, scans, storage, stats)))
    }
}
