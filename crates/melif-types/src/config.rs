use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::ConfigError;
use crate::point::Point;

/// When a multi-worker search stops on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopBudget {
    /// Stop after this many worker steps (frontier dequeues).
    Points(usize),
    /// Stop once more than this many consecutive evaluations failed to improve
    /// the best score.
    NoImprovement(usize),
}

impl StopBudget {
    pub fn limit(&self) -> usize {
        match self {
            Self::Points(n) | Self::NoImprovement(n) => *n,
        }
    }
}

impl Default for StopBudget {
    fn default() -> Self {
        Self::Points(75)
    }
}

/// Configuration shared by every search strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Names of the relevance measures; one point coordinate per measure.
    pub measures: Vec<String>,

    /// Step size used to build axis-aligned neighbours.
    pub delta: f64,

    /// Number of worker threads for the multi-worker strategies.
    pub workers: usize,

    /// Stop condition for the frontier schedulers.
    pub budget: StopBudget,

    /// How long an idle worker waits for a candidate point before giving up.
    pub dequeue_timeout_ms: u64,

    /// Optional bound on the number of queued candidates per frontier.
    pub frontier_capacity: Option<usize>,
}

impl SearchConfig {
    pub fn new<S: Into<String>>(measures: impl IntoIterator<Item = S>) -> Self {
        Self {
            measures: measures.into_iter().map(Into::into).collect(),
            delta: 0.1,
            workers: 4,
            budget: StopBudget::default(),
            dequeue_timeout_ms: 5_000,
            frontier_capacity: None,
        }
    }

    pub fn with_delta(mut self, delta: f64) -> Self {
        self.delta = delta;
        self
    }

    pub fn with_workers(mut self, n: usize) -> Self {
        self.workers = n;
        self
    }

    pub fn with_budget(mut self, budget: StopBudget) -> Self {
        self.budget = budget;
        self
    }

    pub fn with_dequeue_timeout(mut self, timeout: Duration) -> Self {
        self.dequeue_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_frontier_capacity(mut self, capacity: usize) -> Self {
        self.frontier_capacity = Some(capacity);
        self
    }

    /// Number of coordinates every point must have.
    pub fn dimension(&self) -> usize {
        self.measures.len()
    }

    pub fn dequeue_timeout(&self) -> Duration {
        Duration::from_millis(self.dequeue_timeout_ms)
    }

    /// Check the scalar settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.measures.is_empty() {
            return Err(ConfigError::NoMeasures);
        }
        if !self.delta.is_finite() || self.delta <= 0.0 {
            return Err(ConfigError::InvalidDelta { delta: self.delta });
        }
        if self.workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if self.budget.limit() == 0 {
            return Err(ConfigError::EmptyBudget);
        }
        Ok(())
    }

    /// Check a non-empty starting set whose points all match the measure count.
    pub fn validate_points(&self, points: &[Point]) -> Result<(), ConfigError> {
        if points.is_empty() {
            return Err(ConfigError::NoStartingPoints);
        }
        self.validate_dimensions(points)
    }

    /// Check that every point matches the measure count; an empty set is fine.
    pub fn validate_dimensions(&self, points: &[Point]) -> Result<(), ConfigError> {
        let expected = self.dimension();
        match points
            .iter()
            .enumerate()
            .find(|(_, p)| p.dimension() != expected)
        {
            Some((index, p)) => Err(ConfigError::DimensionMismatch {
                index,
                expected,
                actual: p.dimension(),
            }),
            None => Ok(()),
        }
    }
}
