//! Deduplicating set of evaluated points.

use melif_types::Point;
use parking_lot::RwLock;
use std::collections::BTreeSet;

/// Points already claimed for evaluation in the current run.
///
/// Keyed by the epsilon comparator of [`Point`], so near-identical weight
/// vectors are treated as one. Safe to share between workers; grows only.
#[derive(Debug, Default)]
pub struct VisitedSet {
    points: RwLock<BTreeSet<Point>>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, point: &Point) -> bool {
        self.points.read().contains(point)
    }

    /// Mark `point` as visited. Returns `false` if an equal point was already
    /// present, in which case the caller must not evaluate it.
    pub fn claim(&self, point: &Point) -> bool {
        if self.contains(point) {
            return false;
        }
        self.points.write().insert(point.clone())
    }

    pub fn len(&self) -> usize {
        self.points.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.read().is_empty()
    }
}
