use log::debug;
use serde::Serialize;
use statrs::statistics::{Data, Median};

use super::range_map::RangeMap;

/// Clustering half-width for trapped ion mobility samples.
pub const TIMS_CLUSTER_HALF_WIDTH: f64 = 2e-6;

/// Clustering half-width for every other mobility technique.
pub const DEFAULT_CLUSTER_HALF_WIDTH: f64 = 2e-5;

/// One canonical slot on the file-wide mobility axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MobilityBucket {
    canonical_index: usize,
    center: f64,
    half_width: f64,
}

impl MobilityBucket {
    /// Position of this bucket in every frame's per-bucket arrays.
    pub fn canonical_index(&self) -> usize {
        self.canonical_index
    }

    /// Mobility value the bucket is centred on.
    pub fn center(&self) -> f64 {
        self.center
    }

    /// Half-width of the bucket's lookup neighbourhood.
    pub fn half_width(&self) -> f64 {
        self.half_width
    }
}

/// The canonical, file-wide mobility axis.
///
/// Built once by [`MobilityAxisIndexer`] and read-only afterwards. Buckets are
/// stored in canonical order; for a reversed axis that is descending mobility.
#[derive(Debug, Clone, PartialEq)]
pub struct MobilityAxis {
    buckets: Vec<MobilityBucket>,
    // values are ascending positions, independent of orientation
    lookup: RangeMap<usize>,
    fine_half_width: f64,
    reversed: bool,
}

impl MobilityAxis {
    /// Number of buckets.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Whether the axis has no buckets.
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Buckets in canonical order.
    pub fn buckets(&self) -> &[MobilityBucket] {
        &self.buckets
    }

    /// Bucket centers in canonical order.
    pub fn centers(&self) -> Vec<f64> {
        self.buckets.iter().map(|b| b.center).collect()
    }

    /// Half-width used for the lookup neighbourhoods.
    pub fn fine_half_width(&self) -> f64 {
        self.fine_half_width
    }

    /// Whether canonical order runs from high to low mobility.
    pub fn is_reversed(&self) -> bool {
        self.reversed
    }

    fn canonical(&self, position: usize) -> usize {
        if self.reversed {
            self.buckets.len() - 1 - position
        } else {
            position
        }
    }

    fn center_at_position(&self, position: usize) -> f64 {
        self.buckets[self.canonical(position)].center
    }

    /// Canonical index of the bucket whose neighbourhood contains `value`.
    pub fn index_of(&self, value: f64) -> Option<usize> {
        self.lookup.get(value).map(|&position| self.canonical(position))
    }

    /// Canonical index of the bucket with the closest center.
    ///
    /// Returns `None` only for an empty axis or a non-finite value.
    pub fn nearest_index(&self, value: f64) -> Option<usize> {
        if self.is_empty() || !value.is_finite() {
            return None;
        }
        let n = self.buckets.len();
        let (mut lo, mut hi) = (0, n);
        while lo < hi {
            let mid = (lo + hi) / 2;
            if self.center_at_position(mid) < value {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        let above = lo;
        let position = if above == 0 {
            0
        } else if above == n {
            n - 1
        } else {
            let below_dist = value - self.center_at_position(above - 1);
            let above_dist = self.center_at_position(above) - value;
            if below_dist <= above_dist {
                above - 1
            } else {
                above
            }
        };
        Some(self.canonical(position))
    }

    /// The same axis with canonical index `i` moved to `N-1-i`.
    pub fn reversed(mut self) -> Self {
        self.buckets.reverse();
        for (index, bucket) in self.buckets.iter_mut().enumerate() {
            bucket.canonical_index = index;
        }
        self.reversed = !self.reversed;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Cluster {
    seed: f64,
    count: usize,
}

/// Collects every mobility value of a file and derives the canonical axis.
///
/// Samples closer than the clustering half-width to an existing cluster seed
/// only bump that cluster's count. When the axis is finalized the bucket
/// half-width becomes a tenth of the median spacing between cluster seeds.
#[derive(Debug, Clone)]
pub struct MobilityAxisIndexer {
    cluster_half_width: f64,
    clusters: RangeMap<Cluster>,
    leading: Vec<f64>,
    samples: usize,
}

impl MobilityAxisIndexer {
    /// Create an indexer for a trapped (TIMS) or other mobility instrument.
    pub fn new(trapped: bool) -> Self {
        let cluster_half_width = if trapped {
            TIMS_CLUSTER_HALF_WIDTH
        } else {
            DEFAULT_CLUSTER_HALF_WIDTH
        };
        Self {
            cluster_half_width,
            clusters: RangeMap::new(),
            leading: Vec::with_capacity(2),
            samples: 0,
        }
    }

    /// Build an axis from all values in one go.
    pub fn build<I: IntoIterator<Item = f64>>(values: I, trapped: bool) -> MobilityAxis {
        let mut indexer = Self::new(trapped);
        for value in values {
            indexer.observe(value);
        }
        indexer.into_axis()
    }

    /// Record one mobility sample. Non-finite values are ignored.
    pub fn observe(&mut self, value: f64) {
        if !value.is_finite() {
            return;
        }
        self.samples += 1;

        if let Some(cluster) = self.clusters.get_mut(value) {
            cluster.count += 1;
            return;
        }

        let half = self.cluster_half_width;
        if self
            .clusters
            .insert_trimmed(value - half, value + half, Cluster { seed: value, count: 1 })
            && self.leading.len() < 2
        {
            self.leading.push(value);
        }
    }

    /// The first two distinct values in encounter order, if seen.
    pub fn leading_pair(&self) -> Option<(f64, f64)> {
        match self.leading.as_slice() {
            [first, second] => Some((*first, *second)),
            _ => None,
        }
    }

    /// Number of samples observed.
    pub fn sample_count(&self) -> usize {
        self.samples
    }

    /// Number of distinct clusters so far.
    pub fn cluster_count(&self) -> usize {
        self.clusters.len()
    }

    /// Finalize into an axis with ascending canonical order.
    pub fn into_axis(self) -> MobilityAxis {
        let candidates: Vec<f64> = self.clusters.iter().map(|(_, _, c)| c.seed).collect();

        let fine_half_width = if candidates.len() < 2 {
            self.cluster_half_width
        } else {
            let diffs: Vec<f64> = candidates.windows(2).map(|w| (w[1] - w[0]).abs()).collect();
            let fine = Data::new(diffs).median() / 10.0;
            if fine.is_finite() && fine > 0.0 {
                fine
            } else {
                self.cluster_half_width
            }
        };

        let mut lookup = RangeMap::new();
        let mut buckets = Vec::with_capacity(candidates.len());
        for (position, &center) in candidates.iter().enumerate() {
            let mut lower = center - fine_half_width;
            let mut upper = center + fine_half_width;
            if let Some(&prev) = position.checked_sub(1).and_then(|p| candidates.get(p)) {
                lower = lower.max((prev + center) / 2.0);
            }
            if let Some(&next) = candidates.get(position + 1) {
                upper = upper.min((center + next) / 2.0);
            }
            lookup.insert_trimmed(lower, upper, position);
            buckets.push(MobilityBucket {
                canonical_index: position,
                center,
                half_width: fine_half_width,
            });
        }

        debug!(
            "Mobility axis: {} buckets from {} samples, half-width {:e}",
            buckets.len(),
            self.samples,
            fine_half_width
        );

        MobilityAxis {
            buckets,
            lookup,
            fine_half_width,
            reversed: false,
        }
    }
}
