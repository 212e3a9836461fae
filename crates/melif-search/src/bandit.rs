//! Multi-armed bandit over a partition of the weight simplex.

use crate::control::CancellationToken;
use crate::evaluator::ScoreEvaluator;
use crate::policy::PolicyKind;
use crate::scheduler::FrontierRun;
use crate::space::SeedSpace;
use melif_types::{MelifResult, Point, RunStats, SearchConfig};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

/// One frontier per partition point of the simplex; a bandit policy decides
/// which frontier each worker step draws from, rewarded with the score of the
/// evaluated candidate.
///
/// The partition is fixed when the scheduler is built. Starting points handed
/// to [`BanditFrontierScheduler::run`] are queued in the arm whose partition
/// point is nearest to them; they never add arms.
pub struct BanditFrontierScheduler {
    config: SearchConfig,
    evaluator: Arc<dyn ScoreEvaluator>,
    policy: PolicyKind,
    partition: Vec<Point>,
    cancel: CancellationToken,
}

impl BanditFrontierScheduler {
    pub const NAME: &'static str = "bandit-frontier";

    /// Build the scheduler with a partition grid of `grid_resolution` levels
    /// per coordinate and the UCB1 policy.
    pub fn new(
        config: SearchConfig,
        evaluator: Arc<dyn ScoreEvaluator>,
        grid_resolution: usize,
    ) -> MelifResult<Self> {
        config.validate()?;
        let partition = SeedSpace::partition(config.dimension(), grid_resolution)?;
        debug!(arms = partition.len(), grid_resolution, "simplex partitioned");
        Ok(Self {
            config,
            evaluator,
            policy: PolicyKind::default(),
            partition,
            cancel: CancellationToken::new(),
        })
    }

    pub fn with_policy(mut self, policy: PolicyKind) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn policy(&self) -> PolicyKind {
        self.policy
    }

    /// Seed points of the partition arms.
    pub fn partition(&self) -> &[Point] {
        &self.partition
    }

    /// Initial frontier contents per arm: the arm's partition point followed
    /// by the caller points nearest to it (squared Euclidean distance, lowest
    /// arm index on ties). Points equal to a partition point are not repeated.
    pub fn arm_seeds(&self, points: &[Point]) -> Vec<Vec<Point>> {
        let mut seeds: Vec<Vec<Point>> = self.partition.iter().map(|p| vec![p.clone()]).collect();
        let unique: BTreeSet<&Point> = points.iter().collect();
        for point in unique {
            if self.partition.contains(point) {
                continue;
            }
            if let Some(arm) = nearest(&self.partition, point) {
                seeds[arm].push(point.clone());
            }
        }
        seeds
    }

    pub fn run(&self, points: &[Point]) -> MelifResult<RunStats> {
        self.config.validate()?;
        self.config.validate_points(points)?;

        let seeds = self.arm_seeds(points);
        debug!(
            arms = seeds.len(),
            extra = seeds.iter().map(|s| s.len() - 1).sum::<usize>(),
            "caller points assigned to arms"
        );
        let selector = self.policy.build(seeds.len())?;
        FrontierRun {
            name: Self::NAME,
            config: &self.config,
            evaluator: self.evaluator.as_ref(),
            cancel: &self.cancel,
        }
        .execute(seeds, selector)
    }
}

fn nearest(arms: &[Point], point: &Point) -> Option<usize> {
    let distance = |arm: &Point| -> f64 {
        arm.coordinates()
            .iter()
            .zip(point.coordinates())
            .map(|(a, b)| (a - b).powi(2))
            .sum()
    };
    arms.iter()
        .enumerate()
        .map(|(i, arm)| (i, distance(arm)))
        .fold(None, |best: Option<(usize, f64)>, (i, d)| match best {
            Some((_, best_d)) if best_d <= d => best,
            _ => Some((i, d)),
        })
        .map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::ScoreFn;
    use melif_types::{ConfigError, MelifError, StopBudget, StopReason};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn config(workers: usize, budget: StopBudget) -> SearchConfig {
        SearchConfig::new(["m0", "m1", "m2"])
            .with_delta(0.1)
            .with_workers(workers)
            .with_budget(budget)
            .with_dequeue_timeout(Duration::from_millis(200))
    }

    fn peak(p: &Point) -> f64 {
        let target = [0.1, 0.1, 0.8];
        let d: f64 = p
            .coordinates()
            .iter()
            .zip(target)
            .map(|(c, t)| (c - t).powi(2))
            .sum();
        0.99 - d.sqrt()
    }

    fn seeds() -> Vec<Point> {
        SeedSpace::axis_and_uniform(3)
    }

    #[test]
    fn caller_points_join_the_nearest_arm() {
        let bandit = BanditFrontierScheduler::new(config(2, StopBudget::Points(10)), Arc::new(ScoreFn(peak)), 2)
            .unwrap();
        let base = bandit.partition().len();
        assert_eq!(base, 10);

        // Partition points are not repeated
        let arms = bandit.arm_seeds(&seeds());
        assert_eq!(arms.len(), base);
        assert!(arms.iter().all(|seeds| seeds.len() == 1));

        let extra = Point::new(vec![0.1, 0.1, 0.8]).unwrap();
        let arms = bandit.arm_seeds(&[extra.clone(), extra.clone()]);
        assert_eq!(arms.len(), base);
        let owner = bandit
            .partition()
            .iter()
            .position(|p| *p == Point::unit(3, 2).unwrap())
            .unwrap();
        assert_eq!(arms[owner], vec![Point::unit(3, 2).unwrap(), extra]);
        assert_eq!(arms.iter().map(Vec::len).sum::<usize>(), base + 1);
    }

    #[test]
    fn budget_bounds_evaluations() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let score = move |p: &Point| {
            counter.fetch_add(1, Ordering::SeqCst);
            peak(p)
        };
        let bandit = BanditFrontierScheduler::new(config(4, StopBudget::Points(40)), Arc::new(ScoreFn(score)), 2)
            .unwrap();
        let stats = bandit.run(&seeds()).unwrap();

        assert!(calls.load(Ordering::SeqCst) <= 40);
        assert_eq!(stats.visited_points() as usize, calls.load(Ordering::SeqCst));
        assert_eq!(stats.stop_reason(), Some(StopReason::BudgetExhausted));
        // The unit point on the peak's axis is a seed
        assert!(stats.best_score() >= peak(&Point::unit(3, 2).unwrap()));
    }

    #[test]
    fn every_policy_finds_a_good_region() {
        let policies = [
            PolicyKind::Ucb1,
            PolicyKind::EpsilonGreedy {
                epsilon: 0.2,
                seed: 5,
            },
            PolicyKind::SoftMax {
                temperature: 0.1,
                seed: 5,
            },
        ];
        for policy in policies {
            let stats = BanditFrontierScheduler::new(config(2, StopBudget::Points(120)), Arc::new(ScoreFn(peak)), 3)
                .unwrap()
                .with_policy(policy)
                .run(&seeds())
                .unwrap();
            assert!(stats.best_score() > 0.8, "{policy:?} reached {}", stats.best_score());
        }
    }

    #[test]
    fn near_perfect_score_stops_the_bandit() {
        let workers = 3;
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let score = move |_: &Point| {
            counter.fetch_add(1, Ordering::SeqCst);
            1.0
        };
        let stats = BanditFrontierScheduler::new(config(workers, StopBudget::Points(500)), Arc::new(ScoreFn(score)), 2)
            .unwrap()
            .run(&seeds())
            .unwrap();

        assert_eq!(stats.stop_reason(), Some(StopReason::NearPerfectScore));
        assert!(calls.load(Ordering::SeqCst) <= 1 + workers);
    }

    #[test]
    fn invalid_setup_is_rejected() {
        let err = BanditFrontierScheduler::new(config(2, StopBudget::Points(10)), Arc::new(ScoreFn(peak)), 0)
            .err()
            .unwrap();
        assert!(matches!(err, MelifError::Config(ConfigError::InvalidGrid { resolution: 0 })));

        let bandit = BanditFrontierScheduler::new(config(2, StopBudget::Points(10)), Arc::new(ScoreFn(peak)), 2)
            .unwrap()
            .with_policy(PolicyKind::EpsilonGreedy {
                epsilon: -0.5,
                seed: 1,
            });
        assert!(matches!(
            bandit.run(&seeds()),
            Err(MelifError::Config(ConfigError::InvalidPolicy { .. }))
        ));
        assert!(matches!(
            bandit.run(&[Point::uniform(2).unwrap()]),
            Err(MelifError::Config(ConfigError::DimensionMismatch { .. }))
        ));
    }

    #[test]
    fn empty_starting_set_is_rejected() {
        let bandit = BanditFrontierScheduler::new(config(2, StopBudget::Points(10)), Arc::new(ScoreFn(peak)), 2)
            .unwrap();
        assert!(matches!(
            bandit.run(&[]),
            Err(MelifError::Config(ConfigError::NoStartingPoints))
        ));
    }

    #[test]
    fn no_improvement_window_stops_the_bandit() {
        let bandit = BanditFrontierScheduler::new(
            config(1, StopBudget::NoImprovement(5)),
            Arc::new(ScoreFn(|_: &Point| 0.5)),
            2,
        )
        .unwrap();
        let stats = bandit.run(&seeds()).unwrap();

        assert_eq!(stats.stop_reason(), Some(StopReason::NoImprovement));
        // The first evaluation sets the best; six more without improvement exceed the window
        assert_eq!(stats.visited_points(), 7);
    }
}
