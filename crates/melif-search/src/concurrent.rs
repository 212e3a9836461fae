//! Coordinate descent with parallel starting points and probes.

use crate::context::{finish_run, RunContext};
use crate::control::{CancellationToken, StopSignal};
use crate::evaluator::ScoreEvaluator;
use crate::visited::VisitedSet;
use melif_types::{internal_error, MelifResult, Point, RunStats, SearchConfig, SelectionResult, StopReason};
use rayon::prelude::*;
use std::sync::Arc;
use tracing::{debug, info};

/// Coordinate descent where every starting point runs as its own task and
/// the plus and minus probes of each dimension are evaluated concurrently.
///
/// The plus probe wins ties. Starting points and probes already claimed by
/// another task are skipped.
pub struct ConcurrentSearch {
    config: SearchConfig,
    evaluator: Arc<dyn ScoreEvaluator>,
    cancel: CancellationToken,
}

impl ConcurrentSearch {
    pub const NAME: &'static str = "concurrent";

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

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.workers)
            .thread_name(|i| format!("melif-concurrent-{i}"))
            .build()
            .map_err(|e| internal_error!("failed to build worker pool: {e}"))?;

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
        info!(
            strategy = Self::NAME,
            points = points.len(),
            workers = self.config.workers,
            delta = self.config.delta,
            "run started"
        );

        let descents: Vec<Option<SelectionResult>> = pool.install(|| {
            points
                .par_iter()
                .map(|point| parallel_descent(&ctx, point))
                .collect::<MelifResult<_>>()
        })?;
        debug!(
            completed = descents.iter().flatten().count(),
            skipped = descents.iter().filter(|d| d.is_none()).count(),
            "all descents finished"
        );

        stats.record_stop(StopReason::Converged);
        finish_run(stats)
    }
}

/// Descent from `start` with both probes of a dimension in flight together.
fn parallel_descent(ctx: &RunContext<'_>, start: &Point) -> MelifResult<Option<SelectionResult>> {
    if ctx.stop.observe(ctx.stats) {
        return Ok(None);
    }
    let Some(mut best) = ctx.visit(start)? else {
        return Ok(None);
    };
    let delta = ctx.config.delta;

    'descent: loop {
        let mut moved = false;
        for axis in 0..best.point.dimension() {
            if ctx.stop.observe(ctx.stats) {
                break 'descent;
            }
            let plus = best.point.shifted(axis, delta);
            let minus = best.point.shifted(axis, -delta);
            let (plus, minus) = rayon::join(|| probe(ctx, plus.as_ref()), || probe(ctx, minus.as_ref()));

            for result in [plus?, minus?].into_iter().flatten() {
                if result.better_than(&best) {
                    best = result;
                    moved = true;
                }
            }
            if moved {
                break;
            }
        }
        if !moved {
            break;
        }
    }
    Ok(Some(best))
}

/// Evaluate one probe; a missing, already visited or stopped probe yields `None`.
fn probe(ctx: &RunContext<'_>, point: Option<&Point>) -> MelifResult<Option<SelectionResult>> {
    match point {
        Some(point) if !ctx.stop.observe(ctx.stats) => ctx.visit(point),
        _ => Ok(None),
    }
}
