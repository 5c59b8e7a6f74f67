//! Canonical mobility axis construction.
//!
//! All mobility values of a file go through [`MobilityAxisIndexer`] once; the
//! resulting [`MobilityAxis`] is oriented by [`ScanOrientationNormalizer`] and
//! then shared read-only by every frame assembly.

pub use axis::{
    MobilityAxis, MobilityAxisIndexer, MobilityBucket, DEFAULT_CLUSTER_HALF_WIDTH,
    TIMS_CLUSTER_HALF_WIDTH,
};
pub use orientation::ScanOrientationNormalizer;
pub use range_map::RangeMap;

mod axis;
mod orientation;
mod range_map;
