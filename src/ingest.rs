//! Thin-waist ingestion contract types and validation.
//!
//! Every wire-format reader hands the reconstruction pipeline [`RawMobilityScan`]
//! records. The pipeline never looks at the source encoding; it only relies on the
//! invariants checked by [`RawMobilityScan::validate_contract`].

use serde::{Deserialize, Serialize};

/// Errors returned when the ingestion contract is violated.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// Contract violation with a human-readable message.
    #[error("ingest contract violation: {0}")]
    ContractViolation(String),
}

impl IngestError {
    fn violation(message: impl Into<String>) -> Self {
        Self::ContractViolation(message.into())
    }
}

/// The ion mobility separation technique of the acquiring instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MobilityType {
    /// No ion mobility separation (flat LC-MS data)
    #[default]
    None,
    /// Drift tube ion mobility (DTIMS)
    DriftTube,
    /// Travelling wave ion mobility (TWIMS)
    TravellingWave,
    /// Trapped ion mobility (TIMS); scans are produced in descending mobility order
    Tims,
    /// FT-ICR coupled ion mobility
    FticrIms,
}

impl MobilityType {
    /// Whether this is the trapped ion mobility family.
    pub fn is_trapped(&self) -> bool {
        matches!(self, MobilityType::Tims)
    }

    /// Whether the instrument separates by mobility at all.
    pub fn is_ims(&self) -> bool {
        !matches!(self, MobilityType::None)
    }
}

impl std::fmt::Display for MobilityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            MobilityType::None => "none",
            MobilityType::DriftTube => "drift-tube",
            MobilityType::TravellingWave => "travelling-wave",
            MobilityType::Tims => "tims",
            MobilityType::FticrIms => "fticr-ims",
        };
        f.write_str(name)
    }
}

/// One precursor / isolation entry reported for a scan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrecursorEntry {
    /// Isolation window target m/z
    pub isolation_mz: Option<f64>,
    /// Isolation window lower offset (Th below the target)
    pub isolation_lower_offset: Option<f64>,
    /// Isolation window upper offset (Th above the target)
    pub isolation_upper_offset: Option<f64>,
    /// Selected ion m/z
    pub selected_ion_mz: Option<f64>,
    /// Selected ion charge state
    pub charge: Option<i16>,
    /// Collision energy in eV
    pub collision_energy: Option<f32>,
}

impl PrecursorEntry {
    /// The isolation target, falling back to the selected ion when the
    /// isolation window itself was not reported.
    pub fn resolved_isolation_mz(&self) -> Option<f64> {
        self.isolation_mz
            .filter(|mz| mz.is_finite())
            .or(self.selected_ion_mz.filter(|mz| mz.is_finite()))
    }
}

/// Thin-waist ingestion contract for a single mobility scan.
///
/// Invariants:
/// - `mz_array` and `intensity_array` have identical lengths.
/// - `ms_level >= 1`, `polarity` is one of -1, 0, 1.
/// - Retention time and (when present) mobility are finite.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawMobilityScan {
    /// Native spectrum ID from the source file.
    pub id: String,
    /// Identity of the enclosing frame; consecutive scans sharing it form one frame.
    pub frame_index: u32,
    /// Native scan number.
    pub scan_number: u32,
    /// MS level (1, 2, ...).
    pub ms_level: u8,
    /// Retention time in seconds.
    pub retention_time: f32,
    /// Polarity: 1 for positive, -1 for negative, 0 for unknown.
    pub polarity: i8,
    /// Ion mobility value, absent for non-IMS scans.
    pub mobility: Option<f64>,
    /// m/z array.
    pub mz_array: Vec<f64>,
    /// Intensity array.
    pub intensity_array: Vec<f64>,
    /// Isolation and activation entries.
    pub precursors: Vec<PrecursorEntry>,
}

impl RawMobilityScan {
    /// Validate the thin-waist contract invariants for a single scan.
    pub fn validate_contract(&self) -> Result<(), IngestError> {
        if self.ms_level < 1 {
            return Err(IngestError::violation(format!(
                "ms_level must be >= 1, got {}",
                self.ms_level
            )));
        }

        if !matches!(self.polarity, -1 | 0 | 1) {
            return Err(IngestError::violation(format!(
                "polarity must be -1, 0, or 1, got {}",
                self.polarity
            )));
        }

        if !self.retention_time.is_finite() {
            return Err(IngestError::violation(format!(
                "retention_time must be finite, got {}",
                self.retention_time
            )));
        }

        if let Some(mobility) = self.mobility {
            if !mobility.is_finite() {
                return Err(IngestError::violation(format!(
                    "mobility must be finite, got {mobility}"
                )));
            }
        }

        if self.mz_array.len() != self.intensity_array.len() {
            return Err(IngestError::violation(format!(
                "intensity length {} does not match m/z length {}",
                self.intensity_array.len(),
                self.mz_array.len()
            )));
        }

        Ok(())
    }

    /// Number of data points.
    pub fn peak_count(&self) -> usize {
        self.mz_array.len()
    }

    /// Index of the most intense data point, or -1 for an empty scan.
    pub fn base_peak_index(&self) -> i32 {
        self.intensity_array
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(idx, _)| idx as i32)
            .unwrap_or(-1)
    }
}
