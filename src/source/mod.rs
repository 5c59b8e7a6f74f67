//! Sources of decoded mobility scans.
//!
//! A [`ScanSource`] stands in for the wire-format parser: it yields one
//! [`RawMobilityScan`] at a time and can be rewound, because the canonical
//! mobility axis has to be known before the first frame is assembled and the
//! import therefore walks the source twice.

use crate::ingest::RawMobilityScan;

pub use error::SourceError;
pub use jsonl::{write_json_lines, JsonLinesScanSource};
pub use memory::MemoryScanSource;

mod error;
mod jsonl;
mod memory;

#[cfg(test)]
mod tests;

/// A rewindable, forward-only stream of decoded scans.
pub trait ScanSource {
    /// Name of the underlying file, used in progress and error messages.
    fn name(&self) -> &str;

    /// Pull the next scan, or `None` at the end of the stream.
    fn next_scan(&mut self) -> Result<Option<RawMobilityScan>, SourceError>;

    /// Restart the stream from the first scan.
    fn rewind(&mut self) -> Result<(), SourceError>;

    /// Total number of scans, when known up front.
    fn len_hint(&self) -> Option<usize> {
        None
    }
}

impl<T: ScanSource + ?Sized> ScanSource for &mut T {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn next_scan(&mut self) -> Result<Option<RawMobilityScan>, SourceError> {
        (**self).next_scan()
    }

    fn rewind(&mut self) -> Result<(), SourceError> {
        (**self).rewind()
    }

    fn len_hint(&self) -> Option<usize> {
        (**self).len_hint()
    }
}
