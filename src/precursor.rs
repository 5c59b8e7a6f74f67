//! Precursor isolation windows spanning consecutive mobility scans.
//!
//! A window is opened the first time an `(isolation m/z, collision energy)` pair
//! shows up in a frame and extended by every later scan reporting the same pair.
//! Windows move through two states: a mutable [`BuildingWindow`] while the frame
//! is assembled, and an immutable [`PrecursorWindow`] once the frame is done.

use log::debug;
use serde::Serialize;

use crate::ingest::PrecursorEntry;

/// Charge recorded when the source did not report one.
pub const UNKNOWN_CHARGE: i16 = 0;

/// Collision energy recorded when the source did not report one.
pub const UNKNOWN_COLLISION_ENERGY: f32 = -1.0;

/// Why a precursor entry did not take part in window accumulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Neither isolation target nor selected ion m/z is usable
    MissingIsolationMz,
    /// Collision energy was reported but is NaN or infinite
    NonFiniteCollisionEnergy,
}

/// Result of observing one precursor entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// A new window was opened
    Opened,
    /// An existing window was extended
    Extended,
    /// The entry was ignored
    Skipped(SkipReason),
}

/// A window still accepting scans.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildingWindow {
    isolation_mz: f64,
    collision_energy: f32,
    charge: i16,
    frame_number: u32,
    first_scan_index: usize,
    last_scan_index: usize,
    lower_isolation_mz: Option<f64>,
    upper_isolation_mz: Option<f64>,
}

impl BuildingWindow {
    fn matches(&self, isolation_mz: f64, collision_energy: f32) -> bool {
        self.isolation_mz.to_bits() == isolation_mz.to_bits()
            && self.collision_energy.to_bits() == collision_energy.to_bits()
    }

    fn extend_to(&mut self, scan_index: usize) {
        self.last_scan_index = self.last_scan_index.max(scan_index);
    }

    /// Isolation target m/z.
    pub fn isolation_mz(&self) -> f64 {
        self.isolation_mz
    }

    /// First scan index covered so far.
    pub fn first_scan_index(&self) -> usize {
        self.first_scan_index
    }

    /// Last scan index covered so far.
    pub fn last_scan_index(&self) -> usize {
        self.last_scan_index
    }

    /// Freeze into an immutable window.
    pub fn finalize(self) -> PrecursorWindow {
        PrecursorWindow {
            isolation_mz: self.isolation_mz,
            collision_energy: self.collision_energy,
            charge: self.charge,
            frame_number: self.frame_number,
            first_scan_index: self.first_scan_index,
            last_scan_index: self.last_scan_index,
            lower_isolation_mz: self.lower_isolation_mz,
            upper_isolation_mz: self.upper_isolation_mz,
        }
    }
}

/// A finished precursor window bound to its frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrecursorWindow {
    isolation_mz: f64,
    collision_energy: f32,
    charge: i16,
    frame_number: u32,
    first_scan_index: usize,
    last_scan_index: usize,
    lower_isolation_mz: Option<f64>,
    upper_isolation_mz: Option<f64>,
}

impl PrecursorWindow {
    /// Isolation target m/z.
    pub fn isolation_mz(&self) -> f64 {
        self.isolation_mz
    }

    /// Collision energy, or [`UNKNOWN_COLLISION_ENERGY`].
    pub fn collision_energy(&self) -> f32 {
        self.collision_energy
    }

    /// Charge state, or [`UNKNOWN_CHARGE`].
    pub fn charge(&self) -> i16 {
        self.charge
    }

    /// Frame the window belongs to.
    pub fn frame_number(&self) -> u32 {
        self.frame_number
    }

    /// First canonical scan index covered.
    pub fn first_scan_index(&self) -> usize {
        self.first_scan_index
    }

    /// Last canonical scan index covered (inclusive).
    pub fn last_scan_index(&self) -> usize {
        self.last_scan_index
    }

    /// Lower isolation bound, when the offsets were reported.
    pub fn lower_isolation_mz(&self) -> Option<f64> {
        self.lower_isolation_mz
    }

    /// Upper isolation bound, when the offsets were reported.
    pub fn upper_isolation_mz(&self) -> Option<f64> {
        self.upper_isolation_mz
    }

    /// Number of scans covered.
    pub fn scan_count(&self) -> usize {
        self.last_scan_index - self.first_scan_index + 1
    }
}

/// Merges per-scan precursor entries of one frame into windows.
#[derive(Debug)]
pub struct PrecursorWindowAccumulator {
    frame_number: u32,
    building: Vec<BuildingWindow>,
    skipped: usize,
}

impl PrecursorWindowAccumulator {
    /// Start accumulating windows for `frame_number`.
    pub fn new(frame_number: u32) -> Self {
        Self {
            frame_number,
            building: Vec::new(),
            skipped: 0,
        }
    }

    /// Feed one entry seen at canonical `scan_index`.
    pub fn observe(&mut self, entry: &PrecursorEntry, scan_index: usize) -> Observation {
        let Some(isolation_mz) = entry.resolved_isolation_mz() else {
            return self.skip(SkipReason::MissingIsolationMz, scan_index);
        };
        let collision_energy = match entry.collision_energy {
            Some(ce) if !ce.is_finite() => {
                return self.skip(SkipReason::NonFiniteCollisionEnergy, scan_index)
            }
            Some(ce) => ce,
            None => UNKNOWN_COLLISION_ENERGY,
        };

        if let Some(window) = self
            .building
            .iter_mut()
            .find(|w| w.matches(isolation_mz, collision_energy))
        {
            window.extend_to(scan_index);
            return Observation::Extended;
        }

        self.building.push(BuildingWindow {
            isolation_mz,
            collision_energy,
            charge: entry.charge.unwrap_or(UNKNOWN_CHARGE),
            frame_number: self.frame_number,
            first_scan_index: scan_index,
            last_scan_index: scan_index,
            lower_isolation_mz: entry.isolation_lower_offset.map(|o| isolation_mz - o),
            upper_isolation_mz: entry.isolation_upper_offset.map(|o| isolation_mz + o),
        });
        Observation::Opened
    }

    /// Feed every entry of one scan.
    pub fn observe_all(&mut self, entries: &[PrecursorEntry], scan_index: usize) {
        for entry in entries {
            self.observe(entry, scan_index);
        }
    }

    fn skip(&mut self, reason: SkipReason, scan_index: usize) -> Observation {
        self.skipped += 1;
        debug!(
            "Frame {}: skipping precursor entry at scan index {scan_index}: {reason:?}",
            self.frame_number
        );
        Observation::Skipped(reason)
    }

    /// Extend the most recently opened window through `scan_index`.
    ///
    /// Returns `false` if no window is open.
    pub fn extend_last(&mut self, scan_index: usize) -> bool {
        match self.building.last_mut() {
            Some(window) => {
                window.extend_to(scan_index);
                true
            }
            None => false,
        }
    }

    /// Windows currently open.
    pub fn building(&self) -> &[BuildingWindow] {
        &self.building
    }

    /// Number of entry observations that were skipped.
    pub fn skipped_observations(&self) -> usize {
        self.skipped
    }

    /// Freeze all windows in opening order.
    pub fn finalize(self) -> Vec<PrecursorWindow> {
        self.building.into_iter().map(BuildingWindow::finalize).collect()
    }
}
