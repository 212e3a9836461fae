//! Worker loop shared by the frontier-based schedulers.
//!
//! Candidates live in one or more frontiers (arms). Each worker step asks the
//! arm selector for an arm, pops its best candidate, evaluates it, queues the
//! unvisited neighbours into the same arm with the obtained score as their
//! priority and reports the score back to the selector.

use crate::context::{finish_run, RunContext};
use crate::control::{CancellationToken, StopSignal};
use crate::evaluator::ScoreEvaluator;
use crate::frontier::Frontier;
use crate::policy::ArmSelector;
use crate::pool::WorkerPool;
use crate::visited::VisitedSet;
use melif_types::{MelifResult, Point, RunStats, SearchConfig, StopReason};
use parking_lot::{Condvar, Mutex};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Priority given to seed points.
pub(crate) const SEED_PRIORITY: f64 = 1.0;

/// Everything a frontier run needs besides its seeds.
pub(crate) struct FrontierRun<'a> {
    pub name: &'static str,
    pub config: &'a SearchConfig,
    pub evaluator: &'a dyn ScoreEvaluator,
    pub cancel: &'a CancellationToken,
}

struct PolicyState {
    selector: Box<dyn ArmSelector>,
    in_flight: usize,
}

enum Dequeue {
    Candidate { arm: usize, point: Point },
    Empty,
    Exit,
}

struct Scheduler<'a> {
    name: &'static str,
    ctx: RunContext<'a>,
    arms: Vec<Frontier<Point>>,
    policy: Mutex<PolicyState>,
    arrivals: Condvar,
    timeout: Duration,
}

impl FrontierRun<'_> {
    /// Run the workers over `arm_seeds[i]` queued in arm `i` until the stop
    /// budget, a near-perfect score, cancellation or exhaustion ends the run.
    pub fn execute(
        &self,
        arm_seeds: Vec<Vec<Point>>,
        selector: Box<dyn ArmSelector>,
    ) -> MelifResult<RunStats> {
        let stats = RunStats::new(self.name, self.config);
        let visited = VisitedSet::new();
        let stop = StopSignal::new(self.config.budget, self.cancel.clone());

        let outcome = {
            let arms: Vec<Frontier<Point>> = arm_seeds
                .into_iter()
                .map(|seeds| {
                    let frontier = Frontier::with_capacity(self.config.frontier_capacity);
                    for seed in seeds {
                        frontier.push(seed, SEED_PRIORITY);
                    }
                    frontier
                })
                .collect();
            info!(
                strategy = self.name,
                arms = arms.len(),
                policy = selector.name(),
                workers = self.config.workers,
                budget = ?self.config.budget,
                delta = self.config.delta,
                "run started"
            );

            let scheduler = Scheduler {
                name: self.name,
                ctx: RunContext {
                    config: self.config,
                    evaluator: self.evaluator,
                    stats: &stats,
                    visited: &visited,
                    stop: &stop,
                },
                arms,
                policy: Mutex::new(PolicyState {
                    selector,
                    in_flight: 0,
                }),
                arrivals: Condvar::new(),
                timeout: self.config.dequeue_timeout(),
            };

            let outcome = WorkerPool::new(format!("melif-{}", self.name), self.config.workers).run(
                |worker| scheduler.work(worker),
                || scheduler.halt(StopReason::Failed),
            );
            let discarded: usize = scheduler.arms.iter().map(Frontier::clear).sum();
            let rejected: u64 = scheduler.arms.iter().map(Frontier::rejected).sum();
            debug!(strategy = self.name, discarded, rejected, "frontiers closed");
            outcome
        };

        outcome?;
        finish_run(stats)
    }
}

impl Scheduler<'_> {
    fn work(&self, worker: usize) -> MelifResult<()> {
        loop {
            if self.ctx.stop.check(self.ctx.stats) {
                self.wake_all();
                return Ok(());
            }
            match self.next_candidate(worker) {
                Dequeue::Candidate { arm, point } => self.process(worker, arm, point)?,
                Dequeue::Empty => continue,
                Dequeue::Exit => return Ok(()),
            }
        }
    }

    fn next_candidate(&self, worker: usize) -> Dequeue {
        let mut state = self.policy.lock();
        loop {
            if self.ctx.stop.is_stopped() {
                return Dequeue::Exit;
            }
            let available: Vec<bool> = self.arms.iter().map(|arm| !arm.is_empty()).collect();
            if let Some(arm) = state.selector.select(&available) {
                return match self.arms[arm].pop() {
                    Some(candidate) => {
                        state.in_flight += 1;
                        Dequeue::Candidate {
                            arm,
                            point: candidate.item,
                        }
                    }
                    None => {
                        warn!(worker, arm, "selected frontier is empty");
                        Dequeue::Empty
                    }
                };
            }
            if state.in_flight == 0 {
                info!(strategy = self.name, worker, "all frontiers exhausted");
                self.ctx.stop.trigger(self.ctx.stats, StopReason::FrontierExhausted);
                self.arrivals.notify_all();
                return Dequeue::Exit;
            }
            let waited = self.arrivals.wait_for(&mut state, self.timeout);
            if waited.timed_out() && self.arms.iter().all(Frontier::is_empty) {
                warn!(
                    worker,
                    timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
                    "no candidate arrived in time; worker exiting"
                );
                return Dequeue::Exit;
            }
        }
    }

    fn process(&self, worker: usize, arm: usize, point: Point) -> MelifResult<()> {
        let reward = self.expand(worker, arm, &point);
        let mut state = self.policy.lock();
        state.in_flight = state.in_flight.saturating_sub(1);
        if let Ok(Some(score)) = reward {
            state.selector.record(arm, score);
        }
        self.arrivals.notify_all();
        reward.map(|_| ())
    }

    /// Evaluate `point` and queue its unvisited neighbours in `arm`.
    fn expand(&self, worker: usize, arm: usize, point: &Point) -> MelifResult<Option<f64>> {
        if self.ctx.stop.is_stopped() {
            return Ok(None);
        }
        let Some(result) = self.ctx.visit(point)? else {
            warn!(worker, arm, %point, "point already processed");
            return Ok(None);
        };
        if self.ctx.stop.is_stopped() {
            return Ok(Some(result.score));
        }

        let mut queued = 0usize;
        for neighbour in point.neighbours(self.ctx.config.delta) {
            if self.ctx.visited.contains(&neighbour) {
                continue;
            }
            if self.arms[arm].push(neighbour, result.score) {
                queued += 1;
            } else {
                debug!(worker, arm, "frontier full; dropping candidate");
            }
        }
        debug!(worker, arm, %point, score = result.score, queued, "expanded point");
        Ok(Some(result.score))
    }

    fn halt(&self, reason: StopReason) {
        self.ctx.stop.trigger(self.ctx.stats, reason);
        self.wake_all();
    }

    fn wake_all(&self) {
        let _state = self.policy.lock();
        self.arrivals.notify_all();
    }
}
