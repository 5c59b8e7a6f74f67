use log::{debug, info, warn};

use super::{progress, read_error, ImportError, ImportOutcome, RawFileBuilder, Survey};
use crate::frame::{Frame, FrameAssembler, FrameDiagnostics, FrameHeader, PendingFrame};
use crate::ingest::MobilityType;
use crate::mobility::ScanOrientationNormalizer;
use crate::raw_file::RawFile;
use crate::source::ScanSource;
use crate::storage::{ArrayStorage, ScanPayload, StorageError};

impl<S: ArrayStorage> RawFileBuilder<S> {
    pub(super) fn build_ims<Src: ScanSource>(
        self,
        mut source: Src,
        file: String,
        instrument: MobilityType,
        survey: Survey,
    ) -> Result<ImportOutcome<S>, ImportError> {
        let Survey {
            indexer,
            mut stats,
            frame_count,
            ..
        } = survey;
        let Self {
            config,
            mut storage,
            task,
        } = self;
        let storage_error = |source: StorageError| ImportError::Storage {
            file: file.clone(),
            source,
        };

        let leading = indexer.leading_pair();
        let axis =
            ScanOrientationNormalizer::normalize_leading(indexer.into_axis(), leading, instrument);
        stats.buckets = axis.len();
        info!(
            "Mobility axis of {file}: {} buckets{}",
            axis.len(),
            if axis.is_reversed() { ", reversed" } else { "" }
        );

        let placeholder = storage
            .append(&ScanPayload::empty().encode())
            .map_err(storage_error)?;

        let mut frames: Vec<Frame> = Vec::with_capacity(frame_count);
        let mut without_mobility = 0;
        {
            let assembler = FrameAssembler::new(&axis, placeholder);
            let mut pending: Option<(u32, PendingFrame<'_>)> = None;
            task.begin(frame_count);

            let mut complete = |(frame, diagnostics): (Frame, FrameDiagnostics),
                                frames: &mut Vec<Frame>| {
                stats.diagnostics.merge(&diagnostics);
                stats.precursor_windows += frame.precursor_windows().len();
                frames.push(frame);

                let done = task.advance();
                if config.progress_interval > 0 && done % config.progress_interval == 0 {
                    progress(done, frame_count, "frames");
                }
            };

            while let Some(scan) = source.next_scan().map_err(read_error(&file))? {
                if task.is_cancelled() {
                    info!("Import of {file} cancelled after {} frames", frames.len());
                    return Ok(ImportOutcome::Cancelled);
                }
                if !config.keeps(&scan) {
                    continue;
                }
                if scan.mobility.is_none() {
                    debug!("Skipping scan '{}' without mobility value", scan.id);
                    without_mobility += 1;
                    continue;
                }

                let same_frame = matches!(&pending, Some((index, _)) if *index == scan.frame_index);
                if !same_frame {
                    if let Some((_, finished)) = pending.take() {
                        complete(finished.finish(), &mut frames);
                        if task.is_cancelled() {
                            info!("Import of {file} cancelled after {} frames", frames.len());
                            return Ok(ImportOutcome::Cancelled);
                        }
                    }
                    let frame_number = frames.len() as u32 + 1;
                    let header = FrameHeader::from_scan(frame_number, &scan, instrument);
                    pending = Some((scan.frame_index, assembler.begin(header)));
                }

                if let Some((_, frame)) = pending.as_mut() {
                    frame.push(scan, &mut storage).map_err(storage_error)?;
                }
            }

            if let Some((_, finished)) = pending.take() {
                complete(finished.finish(), &mut frames);
            }
        }

        if task.is_cancelled() {
            return Ok(ImportOutcome::Cancelled);
        }
        stats.without_mobility = without_mobility;
        if stats.without_mobility > 0 {
            warn!(
                "Skipped {} scans without mobility value in {file}",
                stats.without_mobility
            );
        }
        if stats.diagnostics.clamped + stats.diagnostics.unresolved + stats.diagnostics.dropped > 0 {
            warn!(
                "{file}: {} clamped, {} unresolved and {} dropped scans",
                stats.diagnostics.clamped, stats.diagnostics.unresolved, stats.diagnostics.dropped
            );
        }
        if stats.diagnostics.skipped_precursor_observations > 0 {
            warn!(
                "{file}: ignored {} malformed precursor entries",
                stats.diagnostics.skipped_precursor_observations
            );
        }

        stats.frames = frames.len();
        info!("Finished {file}: {stats}");
        Ok(ImportOutcome::Completed(RawFile::ims(
            file, instrument, axis, frames, storage, stats,
        )))
    }
}
