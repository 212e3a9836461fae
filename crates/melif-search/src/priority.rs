//! Best-first search over a single frontier.

use crate::control::CancellationToken;
use crate::evaluator::ScoreEvaluator;
use crate::policy::SingleArm;
use crate::scheduler::FrontierRun;
use melif_types::{MelifResult, Point, RunStats, SearchConfig};
use std::sync::Arc;

/// Workers repeatedly pull the highest-scoring candidate from one shared
/// frontier, evaluate it and queue its unvisited neighbours with the
/// obtained score as priority.
///
/// Stops when the configured [`melif_types::StopBudget`] runs out, on a
/// near-perfect score, on cancellation, or once the frontier is exhausted.
pub struct PriorityFrontierScheduler {
    config: SearchConfig,
    evaluator: Arc<dyn ScoreEvaluator>,
    cancel: CancellationToken,
}

impl PriorityFrontierScheduler {
    pub const NAME: &'static str = "priority-frontier";

    pub fn new(config: SearchConfig, evaluator: Arc<dyn ScoreEvaluator>) -> Self {
        Self {
            config,
            evaluator,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Seed the frontier with `points` at equal priority and run the workers.
    pub fn run(&self, points: &[Point]) -> MelifResult<RunStats> {
        self.config.validate()?;
        self.config.validate_points(points)?;

        FrontierRun {
            name: Self::NAME,
            config: &self.config,
            evaluator: self.evaluator.as_ref(),
            cancel: &self.cancel,
        }
        .execute(vec![points.to_vec()], Box::new(SingleArm::new()))
    }
}
