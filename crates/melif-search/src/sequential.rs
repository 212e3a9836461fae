//! Single-threaded coordinate descent.

use crate::context::{finish_run, RunContext};
use crate::control::{CancellationToken, StopSignal};
use crate::evaluator::ScoreEvaluator;
use crate::visited::VisitedSet;
use melif_types::{MelifResult, Point, RunStats, SearchConfig, SelectionResult, StopReason};
use std::sync::Arc;
use tracing::{debug, info};

/// Greedy coordinate descent from each starting point in turn.
///
/// Every descent probes the plus then the minus step along each dimension,
/// moves to the first strictly better neighbour and restarts the sweep from
/// dimension 0. Points already visited by earlier descents are not evaluated
/// again.
pub struct SequentialSearch {
    config: SearchConfig,
    evaluator: Arc<dyn ScoreEvaluator>,
    cancel: CancellationToken,
}

impl SequentialSearch {
    pub const NAME: &'static str = "sequential";

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

    pub fn run(&self, points: &[Point]) -> MelifResult<RunStats> {
        self.config.validate()?;
        self.config.validate_points(points)?;

        let stats = RunStats::new(Self::NAME, &self.config);
        let visited = VisitedSet::new();
        let stop = StopSignal::unbounded(self.cancel.clone());
        let ctx = RunContext {
            config: &self.config,
            evaluator: self.evaluator.as_ref(),
            stats: &stats,
            visited: &visited,
            stop: &stop,
        };
        info!(strategy = Self::NAME, points = points.len(), delta = self.config.delta, "run started");

        for (start, point) in points.iter().enumerate() {
            if stop.observe(&stats) {
                break;
            }
            match coordinate_descent(&ctx, point)? {
                Some(best) => debug!(start, score = best.score, point = %best.point, "descent finished"),
                None => debug!(start, %point, "starting point already visited"),
            }
        }

        stats.record_stop(StopReason::Converged);
        finish_run(stats)
    }
}

/// Greedy first-improvement descent from `start`.
///
/// Returns the best result reached, or `None` if `start` was already visited.
pub(crate) fn coordinate_descent(
    ctx: &RunContext<'_>,
    start: &Point,
) -> MelifResult<Option<SelectionResult>> {
    let Some(mut best) = ctx.visit(start)? else {
        return Ok(None);
    };
    let delta = ctx.config.delta;

    'descent: loop {
        let mut moved = false;
        'sweep: for axis in 0..best.point.dimension() {
            for step in [delta, -delta] {
                if ctx.stop.observe(ctx.stats) {
                    break 'descent;
                }
                let Some(candidate) = best.point.shifted(axis, step) else {
                    continue;
                };
                if let Some(result) = ctx.visit(&candidate)? {
                    if result.better_than(&best) {
                        best = result;
                        moved = true;
                        break 'sweep;
                    }
                }
            }
        }
        if !moved {
            break;
        }
    }
    Ok(Some(best))
}
