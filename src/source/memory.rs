use super::{ScanSource, SourceError};
use crate::ingest::RawMobilityScan;

/// A [`ScanSource`] over scans already held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryScanSource {
    name: String,
    scans: Vec<RawMobilityScan>,
    position: usize,
}

impl MemoryScanSource {
    /// Create a source named `name` yielding `scans` in order.
    pub fn new(name: impl Into<String>, scans: Vec<RawMobilityScan>) -> Self {
        Self {
            name: name.into(),
            scans,
            position: 0,
        }
    }

    /// The scans backing this source.
    pub fn scans(&self) -> &[RawMobilityScan] {
        &self.scans
    }
}

impl ScanSource for MemoryScanSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn next_scan(&mut self) -> Result<Option<RawMobilityScan>, SourceError> {
        let scan = self.scans.get(self.position).cloned();
        if scan.is_some() {
            self.position += 1;
        }
        Ok(scan)
    }

    fn rewind(&mut self) -> Result<(), SourceError> {
        self.position = 0;
        Ok(())
    }

    fn len_hint(&self) -> Option<usize> {
        Some(self.scans.len())
    }
}
