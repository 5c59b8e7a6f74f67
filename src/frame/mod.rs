//! Fixed-shape frames on the canonical mobility axis.
//!
//! Every [`Frame`] of a file has one entry per mobility bucket, whether or not
//! the instrument reported a scan there. Buckets without real data carry a
//! base-peak index of `-1` and the storage handle of the nearest preceding
//! entry, so readers can always resolve a payload.

use std::sync::Arc;

use serde::Serialize;

use crate::ingest::{MobilityType, RawMobilityScan};
use crate::precursor::PrecursorWindow;
use crate::storage::{ArrayStorage, ScanPayload, StorageError, StorageHandle};

pub use assembler::{FrameAssembler, FrameDiagnostics, PendingFrame};

mod assembler;


/// Base-peak index of a bucket without real data.
pub const NO_DATA: i32 = -1;

/// Per-frame metadata, taken from the frame's first scan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameHeader {
    /// Frame number, counted from 1 in arrival order
    pub frame_number: u32,
    /// MS level
    pub ms_level: u8,
    /// Retention time in seconds
    pub retention_time: f32,
    /// Polarity (1, -1 or 0)
    pub polarity: i8,
    /// Mobility technique of the file
    pub mobility_type: MobilityType,
}

impl FrameHeader {
    /// Header for `frame_number` from the first scan of the frame.
    pub fn from_scan(frame_number: u32, scan: &RawMobilityScan, mobility_type: MobilityType) -> Self {
        Self {
            frame_number,
            ms_level: scan.ms_level,
            retention_time: scan.retention_time,
            polarity: scan.polarity,
            mobility_type,
        }
    }
}

/// One assembled frame. Immutable once built.
#[derive(Debug, Clone)]
pub struct Frame {
    header: FrameHeader,
    storage_offsets: Vec<StorageHandle>,
    base_peak_indices: Vec<i32>,
    mobilities: Arc<[f64]>,
    precursor_windows: Vec<PrecursorWindow>,
    real_scan_count: usize,
}

impl Frame {
    /// Frame metadata.
    pub fn header(&self) -> &FrameHeader {
        &self.header
    }

    /// Frame number.
    pub fn frame_number(&self) -> u32 {
        self.header.frame_number
    }

    /// Number of mobility buckets; identical for all frames of a file.
    pub fn bucket_count(&self) -> usize {
        self.base_peak_indices.len()
    }

    /// Storage handle per bucket.
    pub fn storage_offsets(&self) -> &[StorageHandle] {
        &self.storage_offsets
    }

    /// Base-peak index per bucket, [`NO_DATA`] where nothing was measured.
    pub fn base_peak_indices(&self) -> &[i32] {
        &self.base_peak_indices
    }

    /// Mobility value per bucket, shared with every other frame of the file.
    pub fn mobilities(&self) -> &[f64] {
        &self.mobilities
    }

    /// Precursor windows of this frame in opening order.
    pub fn precursor_windows(&self) -> &[PrecursorWindow] {
        &self.precursor_windows
    }

    /// Number of scans the instrument actually reported.
    pub fn real_scan_count(&self) -> usize {
        self.real_scan_count
    }

    /// Whether bucket `index` holds data.
    pub fn is_populated(&self, index: usize) -> bool {
        self.base_peak_indices
            .get(index)
            .is_some_and(|&bp| bp != NO_DATA)
    }

    /// Decode the payload of bucket `index`.
    ///
    /// Buckets without data yield an empty payload; `None` if `index` is out
    /// of range.
    pub fn mobility_scan<S: ArrayStorage + ?Sized>(
        &self,
        index: usize,
        storage: &S,
    ) -> Result<Option<ScanPayload>, StorageError> {
        let Some(&handle) = self.storage_offsets.get(index) else {
            return Ok(None);
        };
        if !self.is_populated(index) {
            return Ok(Some(ScanPayload::empty()));
        }
        ScanPayload::decode(&storage.get(handle)?).map(Some)
    }
}
