use std::collections::BTreeMap;

use ordered_float::OrderedFloat;

/// Map from non-overlapping half-open `[lower, upper)` ranges to values.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeMap<V> {
    ranges: BTreeMap<OrderedFloat<f64>, (f64, V)>,
}

impl<V> Default for RangeMap<V> {
    fn default() -> Self {
        Self {
            ranges: BTreeMap::new(),
        }
    }
}

impl<V> RangeMap<V> {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of ranges.
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// Whether the map holds no ranges.
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    fn containing_key(&self, value: f64) -> Option<OrderedFloat<f64>> {
        if !value.is_finite() {
            return None;
        }
        let (&lower, &(upper, _)) = self.ranges.range(..=OrderedFloat(value)).next_back()?;
        (value < upper).then_some(lower)
    }

    /// The value whose range contains `value`.
    pub fn get(&self, value: f64) -> Option<&V> {
        let key = self.containing_key(value)?;
        self.ranges.get(&key).map(|(_, v)| v)
    }

    /// Mutable access to the value whose range contains `value`.
    pub fn get_mut(&mut self, value: f64) -> Option<&mut V> {
        let key = self.containing_key(value)?;
        self.ranges.get_mut(&key).map(|(_, v)| v)
    }

    /// Insert `[lower, upper)`, trimmed so it does not overlap its neighbours.
    ///
    /// Returns `false` if nothing of the range is left after trimming.
    pub fn insert_trimmed(&mut self, lower: f64, upper: f64, value: V) -> bool {
        let mut lower = lower;
        let mut upper = upper;

        if let Some((_, &(prev_upper, _))) = self.ranges.range(..=OrderedFloat(lower)).next_back() {
            lower = lower.max(prev_upper);
        }
        if let Some((&next_lower, _)) = self.ranges.range(OrderedFloat(lower)..).next() {
            upper = upper.min(next_lower.0);
        }

        if lower.is_nan() || upper.is_nan() || upper <= lower {
            return false;
        }
        self.ranges.insert(OrderedFloat(lower), (upper, value));
        true
    }

    /// Ranges in ascending order as `(lower, upper, value)`.
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64, &V)> + '_ {
        self.ranges
            .iter()
            .map(|(lower, (upper, value))| (lower.0, *upper, value))
    }
}
