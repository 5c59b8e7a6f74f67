use std::sync::Arc;

use log::{debug, warn};
use serde::Serialize;

use super::{Frame, FrameHeader, NO_DATA};
use crate::builder::ImportTask;
use crate::ingest::RawMobilityScan;
use crate::mobility::MobilityAxis;
use crate::precursor::PrecursorWindowAccumulator;
use crate::storage::{ArrayStorage, ScanPayload, StorageError, StorageHandle};

/// Recovered anomalies of one or more frame assemblies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FrameDiagnostics {
    /// Buckets filled in for scans the instrument omitted
    pub synthesized: usize,
    /// Scans whose mobility was behind the running bucket position
    pub clamped: usize,
    /// Scans whose mobility fell outside every bucket neighbourhood
    pub unresolved: usize,
    /// Scans dropped because the frame was already full or had no mobility
    pub dropped: usize,
    /// Precursor entry observations ignored as malformed
    pub skipped_precursor_observations: usize,
}

impl FrameDiagnostics {
    /// Add another set of counts to this one.
    pub fn merge(&mut self, other: &FrameDiagnostics) {
        self.synthesized += other.synthesized;
        self.clamped += other.clamped;
        self.unresolved += other.unresolved;
        self.dropped += other.dropped;
        self.skipped_precursor_observations += other.skipped_precursor_observations;
    }
}

/// Maps the scans of each frame onto the shared mobility axis.
pub struct FrameAssembler<'a> {
    axis: &'a MobilityAxis,
    mobilities: Arc<[f64]>,
    placeholder: StorageHandle,
}

impl<'a> FrameAssembler<'a> {
    /// Create an assembler over `axis`.
    ///
    /// `placeholder` must resolve to an empty payload; it backs frames that
    /// received no real scan at all.
    pub fn new(axis: &'a MobilityAxis, placeholder: StorageHandle) -> Self {
        Self {
            axis,
            mobilities: axis.centers().into(),
            placeholder,
        }
    }

    /// Number of buckets every frame gets.
    pub fn bucket_count(&self) -> usize {
        self.axis.len()
    }

    /// Start a frame; scans are then fed one at a time.
    pub fn begin(&self, header: FrameHeader) -> PendingFrame<'a> {
        let n = self.axis.len();
        PendingFrame {
            axis: self.axis,
            mobilities: Arc::clone(&self.mobilities),
            placeholder: self.placeholder,
            accumulator: PrecursorWindowAccumulator::new(header.frame_number),
            header,
            storage_offsets: Vec::with_capacity(n),
            base_peak_indices: Vec::with_capacity(n),
            counter: 0,
            real_scan_count: 0,
            diagnostics: FrameDiagnostics::default(),
        }
    }

    /// Assemble a whole frame from its scans in arrival order.
    ///
    /// Returns `Ok(None)` if `task` was cancelled before the frame completed.
    pub fn assemble<S, I>(
        &self,
        header: FrameHeader,
        scans: I,
        storage: &mut S,
        task: &ImportTask,
    ) -> Result<Option<(Frame, FrameDiagnostics)>, StorageError>
    where
        S: ArrayStorage + ?Sized,
        I: IntoIterator<Item = RawMobilityScan>,
    {
        let mut pending = self.begin(header);
        for scan in scans {
            if task.is_cancelled() {
                return Ok(None);
            }
            pending.push(scan, storage)?;
        }
        Ok(Some(pending.finish()))
    }
}

/// A frame under construction.
pub struct PendingFrame<'a> {
    axis: &'a MobilityAxis,
    mobilities: Arc<[f64]>,
    placeholder: StorageHandle,
    header: FrameHeader,
    accumulator: PrecursorWindowAccumulator,
    storage_offsets: Vec<StorageHandle>,
    base_peak_indices: Vec<i32>,
    counter: usize,
    real_scan_count: usize,
    diagnostics: FrameDiagnostics,
}

impl PendingFrame<'_> {
    /// Frame metadata.
    pub fn header(&self) -> &FrameHeader {
        &self.header
    }

    fn resolve(&mut self, mobility: f64) -> usize {
        if let Some(index) = self.axis.index_of(mobility) {
            return index;
        }
        let index = self.axis.nearest_index(mobility).unwrap_or(self.counter);
        warn!(
            "Frame {}: mobility {mobility} is outside every bucket, using nearest bucket {index}",
            self.header.frame_number
        );
        self.diagnostics.unresolved += 1;
        index
    }

    fn fill_value(&self) -> StorageHandle {
        self.storage_offsets
            .last()
            .copied()
            .unwrap_or(self.placeholder)
    }

    /// Store one real scan and place it on its bucket, filling any gap before it.
    pub fn push<S: ArrayStorage + ?Sized>(
        &mut self,
        scan: RawMobilityScan,
        storage: &mut S,
    ) -> Result<(), StorageError> {
        let frame_number = self.header.frame_number;
        let bucket_count = self.axis.len();

        let Some(mobility) = scan.mobility else {
            warn!("Frame {frame_number}: scan '{}' has no mobility value, dropping it", scan.id);
            self.diagnostics.dropped += 1;
            return Ok(());
        };
        if self.counter >= bucket_count {
            warn!(
                "Frame {frame_number}: all {bucket_count} buckets are taken, dropping scan '{}'",
                scan.id
            );
            self.diagnostics.dropped += 1;
            return Ok(());
        }

        self.accumulator.observe_all(&scan.precursors, self.counter);

        let mut target = self.resolve(mobility);
        if target < self.counter {
            warn!(
                "Frame {frame_number}: scan '{}' resolves to bucket {target} behind position {}, clamping",
                scan.id, self.counter
            );
            self.diagnostics.clamped += 1;
            target = self.counter;
        }

        let payload = ScanPayload::encode_arrays(&scan.mz_array, &scan.intensity_array);
        let handle = storage.append(&payload)?;

        // a gap never ends an open isolation window
        while self.counter < target {
            let fill = self.storage_offsets.last().copied().unwrap_or(handle);
            self.storage_offsets.push(fill);
            self.base_peak_indices.push(NO_DATA);
            self.diagnostics.synthesized += 1;
            self.counter += 1;
            self.accumulator.observe_all(&scan.precursors, self.counter);
        }

        self.storage_offsets.push(handle);
        self.base_peak_indices.push(scan.base_peak_index());
        self.counter += 1;
        self.real_scan_count += 1;
        Ok(())
    }

    /// Pad the remaining buckets and freeze the frame.
    pub fn finish(mut self) -> (Frame, FrameDiagnostics) {
        let bucket_count = self.axis.len();
        let trailing = bucket_count.saturating_sub(self.counter);

        while self.counter < bucket_count {
            let fill = self.fill_value();
            self.storage_offsets.push(fill);
            self.base_peak_indices.push(NO_DATA);
            self.accumulator.extend_last(self.counter);
            self.counter += 1;
        }
        self.diagnostics.synthesized += trailing;
        self.diagnostics.skipped_precursor_observations = self.accumulator.skipped_observations();

        let precursor_windows = self.accumulator.finalize();
        debug!(
            "Frame {}: {} real scans, {} padded buckets, {} precursor windows",
            self.header.frame_number,
            self.real_scan_count,
            trailing,
            precursor_windows.len()
        );

        let frame = Frame {
            header: self.header,
            storage_offsets: self.storage_offsets,
            base_peak_indices: self.base_peak_indices,
            mobilities: self.mobilities,
            precursor_windows,
            real_scan_count: self.real_scan_count,
        };
        (frame, self.diagnostics)
    }
}
