use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::ingest::RawMobilityScan;

/// Optional scan selection applied before any reconstruction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanFilter {
    /// MS levels to keep; all levels when unset
    pub ms_levels: Option<Vec<u8>>,
    /// Inclusive retention time window in seconds
    pub retention_time: Option<[f32; 2]>,
}

impl ScanFilter {
    /// Whether any criterion is set.
    pub fn is_active(&self) -> bool {
        self.ms_levels.is_some() || self.retention_time.is_some()
    }

    /// Whether `scan` passes every criterion.
    pub fn accepts(&self, scan: &RawMobilityScan) -> bool {
        if let Some(levels) = &self.ms_levels {
            if !levels.contains(&scan.ms_level) {
                return false;
            }
        }
        if let Some([start, end]) = self.retention_time {
            if scan.retention_time < start || scan.retention_time > end {
                return false;
            }
        }
        true
    }
}

fn waters_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^function=([1-9]+) process=([0-9]+) scan=([0-9]+)$")
            .expect("Waters id pattern is a valid regex")
    })
}

/// Function number of a Waters native id (`function=N process=P scan=S`).
///
/// The whole id must have exactly this form.
pub fn waters_function(id: &str) -> Option<u32> {
    waters_id_pattern()
        .captures(id)
        .and_then(|captures| captures[1].parse().ok())
}

/// Whether the id names a Waters lock-mass (or other non-primary) function.
pub fn is_waters_lockmass_scan(id: &str) -> bool {
    waters_id_pattern()
        .captures(id)
        .is_some_and(|captures| &captures[1] != "1")
}
