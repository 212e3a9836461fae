use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::point::Point;

/// Outcome of evaluating one point: the score of the classifier trained on the
/// features the point's linear form selected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionResult {
    pub point: Point,
    pub score: f64,
    /// Indices of the selected features; opaque to the scheduler.
    pub selected_features: Vec<usize>,
}

impl SelectionResult {
    pub fn new(point: Point, score: f64, selected_features: Vec<usize>) -> Self {
        Self {
            point,
            score,
            selected_features,
        }
    }

    /// Strictly greater score.
    pub fn better_than(&self, other: &SelectionResult) -> bool {
        self.score > other.score
    }

    /// Ordering by score only.
    pub fn compare_score(&self, other: &SelectionResult) -> Ordering {
        self.score.total_cmp(&other.score)
    }
}
