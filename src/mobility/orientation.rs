use log::debug;

use super::MobilityAxis;
use crate::ingest::MobilityType;

/// Aligns canonical bucket order with the order scans are physically produced.
pub struct ScanOrientationNormalizer;

impl ScanOrientationNormalizer {
    /// Reverse `axis` when a trapped instrument reports descending mobility.
    ///
    /// `first` and `second` are the first two distinct mobility values in
    /// arrival order. Every other instrument kind keeps ascending order.
    pub fn normalize(
        axis: MobilityAxis,
        first: f64,
        second: f64,
        kind: MobilityType,
    ) -> MobilityAxis {
        if kind.is_trapped() && first > second && !axis.is_reversed() {
            debug!("Descending {kind} mobility order ({first} > {second}), reversing axis");
            axis.reversed()
        } else {
            axis
        }
    }

    /// Like [`normalize`](Self::normalize) for an optional leading pair.
    ///
    /// Axes built from fewer than two distinct values are returned unchanged.
    pub fn normalize_leading(
        axis: MobilityAxis,
        leading: Option<(f64, f64)>,
        kind: MobilityType,
    ) -> MobilityAxis {
        match leading {
            Some((first, second)) => Self::normalize(axis, first, second, kind),
            None => axis,
        }
    }
}
