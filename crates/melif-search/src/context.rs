//! Per-run state shared by every strategy.

use crate::control::StopSignal;
use crate::evaluator::ScoreEvaluator;
use crate::visited::VisitedSet;
use melif_types::{MelifError, MelifResult, Point, RunStats, SearchConfig, SelectionResult, StopReason};
use tracing::{debug, error, info};

/// Borrowed view of one run, handed to every worker.
pub(crate) struct RunContext<'a> {
    pub config: &'a SearchConfig,
    pub evaluator: &'a dyn ScoreEvaluator,
    pub stats: &'a RunStats,
    pub visited: &'a VisitedSet,
    pub stop: &'a StopSignal,
}

impl RunContext<'_> {
    /// Evaluate `point` and fold the result into the run statistics.
    ///
    /// A failed evaluation stops the whole run with [`StopReason::Failed`].
    pub fn evaluate(&self, point: &Point) -> MelifResult<SelectionResult> {
        let result = self.evaluator.evaluate(point, self.stats).inspect_err(|err| {
            error!(%point, error = %err, "evaluation failed");
            self.stop.trigger(self.stats, StopReason::Failed);
        })?;
        let improved = self.stats.update_best_result(&result);
        debug!(%point, score = result.score, improved, "evaluated point");
        if improved && self.stats.is_near_perfect() {
            info!(%point, score = result.score, "near-perfect score reached");
            self.stop.trigger(self.stats, StopReason::NearPerfectScore);
        }
        Ok(result)
    }

    /// Claim `point` and evaluate it; `None` if it was already visited.
    pub fn visit(&self, point: &Point) -> MelifResult<Option<SelectionResult>> {
        if !self.visited.claim(point) {
            return Ok(None);
        }
        self.evaluate(point).map(Some)
    }
}

/// Close out a run: stamp the finish time, log the outcome and turn a
/// cancellation into [`MelifError::Interrupted`].
pub(crate) fn finish_run(stats: RunStats) -> MelifResult<RunStats> {
    stats.mark_finished();
    let work_ms = stats.work_time().num_milliseconds();
    match stats.best_result() {
        Some(best) => info!(
            algorithm = stats.algorithm(),
            score = best.score,
            point = %best.point,
            visited = stats.visited_points(),
            stop = ?stats.stop_reason(),
            work_ms,
            "run finished"
        ),
        None => info!(
            algorithm = stats.algorithm(),
            stop = ?stats.stop_reason(),
            work_ms,
            "run finished without evaluating a point"
        ),
    }
    if stats.stop_reason() == Some(StopReason::Cancelled) {
        return Err(MelifError::Interrupted(format!(
            "{} cancelled after {} points",
            stats.algorithm(),
            stats.visited_points()
        )));
    }
    Ok(stats)
}
