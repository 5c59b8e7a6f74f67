//! The imported raw data file.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::builder::ImportStats;
use crate::frame::Frame;
use crate::ingest::{MobilityType, PrecursorEntry};
use crate::mobility::MobilityAxis;
use crate::precursor::PrecursorWindow;
use crate::storage::{ArrayStorage, ScanPayload, StorageError, StorageHandle};

/// One spectrum of a flat (non-IMS) file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scan {
    /// Scan number, counted from 1 after sorting
    pub scan_number: u32,
    /// Native spectrum ID
    pub id: String,
    /// MS level
    pub ms_level: u8,
    /// Retention time in seconds
    pub retention_time: f32,
    /// Polarity (1, -1 or 0)
    pub polarity: i8,
    /// Handle of the stored payload
    pub storage_offset: StorageHandle,
    /// Index of the most intense point, -1 if empty
    pub base_peak_index: i32,
    /// Number of data points
    pub peak_count: usize,
    /// Precursor entries as reported
    pub precursors: Vec<PrecursorEntry>,
}

/// Ordered frames (IMS) or scans (flat) plus the payload store backing them.
pub struct RawFile<S> {
    name: String,
    mobility_type: MobilityType,
    axis: Option<MobilityAxis>,
    frames: Vec<Frame>,
    scans: Vec<Scan>,
    storage: S,
    stats: ImportStats,
}

impl<S: ArrayStorage> RawFile<S> {
    pub(crate) fn ims(
        name: String,
        mobility_type: MobilityType,
        axis: MobilityAxis,
        frames: Vec<Frame>,
        storage: S,
        stats: ImportStats,
    ) -> Self {
        Self {
            name,
            mobility_type,
            axis: Some(axis),
            frames,
            scans: Vec::new(),
            storage,
            stats,
        }
    }

    pub(crate) fn flat(name: String, scans: Vec<Scan>, storage: S, stats: ImportStats) -> Self {
        Self {
            name,
            mobility_type: MobilityType::None,
            axis: None,
            frames: Vec::new(),
            scans,
            storage,
            stats,
        }
    }

    /// File name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Mobility technique; [`MobilityType::None`] for flat files.
    pub fn mobility_type(&self) -> MobilityType {
        self.mobility_type
    }

    /// Whether the file was reconstructed into frames.
    pub fn is_ims(&self) -> bool {
        self.axis.is_some()
    }

    /// The canonical mobility axis shared by all frames.
    pub fn mobility_axis(&self) -> Option<&MobilityAxis> {
        self.axis.as_ref()
    }

    /// Frames in ascending frame number.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Frame by its number.
    pub fn frame(&self, frame_number: u32) -> Option<&Frame> {
        self.frames
            .binary_search_by_key(&frame_number, Frame::frame_number)
            .ok()
            .map(|idx| &self.frames[idx])
    }

    /// Flat scans in retention time order.
    pub fn scans(&self) -> &[Scan] {
        &self.scans
    }

    /// Decode the payload of a flat scan.
    pub fn scan_payload(&self, scan: &Scan) -> Result<ScanPayload, StorageError> {
        ScanPayload::decode(&self.storage.get(scan.storage_offset)?)
    }

    /// The payload store.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Give up the file, keeping its payload store.
    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Import statistics.
    pub fn stats(&self) -> &ImportStats {
        &self.stats
    }

    /// Serializable overview of the file.
    pub fn summary(&self) -> RawFileSummary {
        let axis = self.axis.as_ref();
        let mobility_range = axis.and_then(|axis| {
            let centers = axis.centers();
            let min = centers.iter().copied().reduce(f64::min)?;
            let max = centers.iter().copied().reduce(f64::max)?;
            Some([min, max])
        });

        RawFileSummary {
            name: self.name.clone(),
            mobility_type: self.mobility_type,
            imported_at: Utc::now(),
            bucket_count: axis.map_or(0, MobilityAxis::len),
            axis_reversed: axis.is_some_and(MobilityAxis::is_reversed),
            mobility_range,
            frame_count: self.frames.len(),
            scan_count: self.scans.len(),
            stats: self.stats.clone(),
            frames: self.frames.iter().map(FrameSummary::from_frame).collect(),
        }
    }
}

/// Per-frame part of a [`RawFileSummary`].
#[derive(Debug, Clone, Serialize)]
pub struct FrameSummary {
    /// Frame number
    pub frame_number: u32,
    /// MS level
    pub ms_level: u8,
    /// Retention time in seconds
    pub retention_time: f32,
    /// Scans reported by the instrument
    pub real_scans: usize,
    /// Buckets holding data
    pub populated_buckets: usize,
    /// Precursor windows of the frame
    pub precursor_windows: Vec<PrecursorWindow>,
}

impl FrameSummary {
    fn from_frame(frame: &Frame) -> Self {
        Self {
            frame_number: frame.frame_number(),
            ms_level: frame.header().ms_level,
            retention_time: frame.header().retention_time,
            real_scans: frame.real_scan_count(),
            populated_buckets: (0..frame.bucket_count())
                .filter(|&i| frame.is_populated(i))
                .count(),
            precursor_windows: frame.precursor_windows().to_vec(),
        }
    }
}

/// JSON-friendly overview of an imported file.
#[derive(Debug, Clone, Serialize)]
pub struct RawFileSummary {
    /// File name
    pub name: String,
    /// Mobility technique
    pub mobility_type: MobilityType,
    /// When the summary was produced
    pub imported_at: DateTime<Utc>,
    /// Buckets per frame
    pub bucket_count: usize,
    /// Whether canonical order is descending mobility
    pub axis_reversed: bool,
    /// Lowest and highest bucket center
    pub mobility_range: Option<[f64; 2]>,
    /// Number of frames
    pub frame_count: usize,
    /// Number of flat scans
    pub scan_count: usize,
    /// Import statistics
    pub stats: ImportStats,
    /// Frame details
    pub frames: Vec<FrameSummary>,
}
