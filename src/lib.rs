//! # imsframe - Ion Mobility Frame Reconstruction
//!
//! `imsframe` turns a stream of decoded mobility scans into fixed-shape frames on
//! a canonical, file-wide mobility axis.
//!
//! ## Key Features
//!
//! - **Shared mobility axis**: every mobility value of a file is clustered once
//!   into buckets; all frames index the same buckets.
//!
//! - **Gap filling**: instruments that skip empty mobility scans still produce
//!   frames of identical shape. Missing buckets carry a `-1` base-peak sentinel
//!   and a forward-filled storage handle.
//!
//! - **TIMS orientation**: descending trapped ion mobility sweeps get a reversed
//!   axis so that canonical index order follows acquisition order.
//!
//! - **Precursor windows**: isolation and activation entries of consecutive scans
//!   merge into one window per frame, including across omitted scans.
//!
//! - **Streaming**: two passes over a rewindable source; only one frame's worth of
//!   bookkeeping is alive at a time, payloads go straight to storage.
//!
//! ## Quick Start
//!
//! ```rust
//! use imsframe::prelude::*;
//!
//! let scans: Vec<RawMobilityScan> = (0..4u32)
//!     .map(|i| RawMobilityScan {
//!         id: format!("frame=1 scan={}", i + 1),
//!         frame_index: 1,
//!         scan_number: i + 1,
//!         ms_level: 1,
//!         mobility: Some(1.4 - i as f64 * 0.05),
//!         mz_array: vec![500.0],
//!         intensity_array: vec![1.0e4],
//!         ..Default::default()
//!     })
//!     .collect();
//!
//! let builder = RawFileBuilder::new(MemoryStorage::new());
//! let outcome = builder.build(MemoryScanSource::new("run.jsonl", scans), MobilityType::Tims)?;
//!
//! if let ImportOutcome::Completed(file) = outcome {
//!     assert_eq!(file.frames()[0].bucket_count(), 4);
//!     assert!(file.mobility_axis().unwrap().is_reversed());
//! }
//! # Ok::<(), imsframe::builder::ImportError>(())
//! ```
//!
//! ## Architecture
//!
//! - [`ingest`]: record types handed over by wire-format parsers
//! - [`source`]: rewindable scan sources (in-memory, JSON Lines)
//! - [`storage`]: append-and-get payload stores (in-memory, temp-file spill)
//! - [`mobility`]: axis indexing and orientation
//! - [`precursor`]: precursor window accumulation
//! - [`frame`]: frame assembly
//! - [`builder`]: file-level orchestration, filtering, task progress
//! - [`raw_file`]: the imported file and its summary

// Documentation lints - enforce complete documentation for publication
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]

pub mod builder;
pub mod frame;
pub mod ingest;
pub mod mobility;
pub mod precursor;
pub mod raw_file;
pub mod source;
pub mod storage;

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::builder::{
        EmptyImport, ImportConfig, ImportError, ImportOutcome, ImportStats, ImportTask,
        RawFileBuilder, ScanFilter,
    };
    pub use crate::frame::{Frame, FrameAssembler, FrameHeader, NO_DATA};
    pub use crate::ingest::{MobilityType, PrecursorEntry, RawMobilityScan};
    pub use crate::mobility::{MobilityAxis, MobilityAxisIndexer, ScanOrientationNormalizer};
    pub use crate::precursor::{
        PrecursorWindow, PrecursorWindowAccumulator, UNKNOWN_CHARGE, UNKNOWN_COLLISION_ENERGY,
    };
    pub use crate::raw_file::{RawFile, RawFileSummary, Scan};
    pub use crate::source::{JsonLinesScanSource, MemoryScanSource, ScanSource};
    pub use crate::storage::{
        ArrayStorage, MemoryStorage, ScanPayload, SpillFileStorage, StorageHandle,
    };
}
