//! Common interface over the search strategies.

use crate::bandit::BanditFrontierScheduler;
use crate::concurrent::ConcurrentSearch;
use crate::control::CancellationToken;
use crate::evaluator::ScoreEvaluator;
use crate::policy::PolicyKind;
use crate::priority::PriorityFrontierScheduler;
use crate::sequential::SequentialSearch;
use melif_types::{MelifResult, Point, RunStats, SearchConfig};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A weight-space search that can be run from a set of starting points.
pub trait SearchStrategy: Send + Sync {
    /// Run to completion and return the statistics of the run.
    fn run(&self, points: &[Point]) -> MelifResult<RunStats>;

    /// Human-readable name of the strategy.
    fn name(&self) -> &str;
}

impl SearchStrategy for SequentialSearch {
    fn run(&self, points: &[Point]) -> MelifResult<RunStats> {
        SequentialSearch::run(self, points)
    }

    fn name(&self) -> &str {
        Self::NAME
    }
}

impl SearchStrategy for ConcurrentSearch {
    fn run(&self, points: &[Point]) -> MelifResult<RunStats> {
        ConcurrentSearch::run(self, points)
    }

    fn name(&self) -> &str {
        Self::NAME
    }
}

impl SearchStrategy for PriorityFrontierScheduler {
    fn run(&self, points: &[Point]) -> MelifResult<RunStats> {
        PriorityFrontierScheduler::run(self, points)
    }

    fn name(&self) -> &str {
        Self::NAME
    }
}

impl SearchStrategy for BanditFrontierScheduler {
    fn run(&self, points: &[Point]) -> MelifResult<RunStats> {
        BanditFrontierScheduler::run(self, points)
    }

    fn name(&self) -> &str {
        Self::NAME
    }
}

/// Serializable strategy selection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StrategyKind {
    Sequential,
    Concurrent,
    PriorityFrontier,
    Bandit {
        grid_resolution: usize,
        #[serde(default)]
        policy: PolicyKind,
    },
}

impl StrategyKind {
    pub const DEFAULT_GRID_RESOLUTION: usize = 2;

    /// Parse a short strategy name: `sequential`, `concurrent`, `priority`
    /// or `bandit` (UCB1 over the default grid).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "sequential" | "basic" => Some(Self::Sequential),
            "concurrent" | "parallel" => Some(Self::Concurrent),
            "priority" | "priority_frontier" | "priority-frontier" => Some(Self::PriorityFrontier),
            "bandit" | "mab" => Some(Self::Bandit {
                grid_resolution: Self::DEFAULT_GRID_RESOLUTION,
                policy: PolicyKind::Ucb1,
            }),
            _ => None,
        }
    }

    pub fn build(
        &self,
        config: SearchConfig,
        evaluator: Arc<dyn ScoreEvaluator>,
        cancel: CancellationToken,
    ) -> MelifResult<Box<dyn SearchStrategy>> {
        config.validate()?;
        Ok(match *self {
            Self::Sequential => Box::new(SequentialSearch::new(config, evaluator).with_cancellation(cancel)),
            Self::Concurrent => Box::new(ConcurrentSearch::new(config, evaluator).with_cancellation(cancel)),
            Self::PriorityFrontier => {
                Box::new(PriorityFrontierScheduler::new(config, evaluator).with_cancellation(cancel))
            }
            Self::Bandit {
                grid_resolution,
                policy,
            } => Box::new(
                BanditFrontierScheduler::new(config, evaluator, grid_resolution)?
                    .with_policy(policy)
                    .with_cancellation(cancel),
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::ScoreFn;
    use crate::space::SeedSpace;
    use melif_types::{MelifError, StopBudget};
    use std::time::Duration;

    fn score(p: &Point) -> f64 {
        0.9 - (p.coordinates()[0] - 0.6).abs()
    }

    #[test]
    fn every_kind_builds_and_runs() {
        let config = SearchConfig::new(["m0", "m1"])
            .with_workers(2)
            .with_budget(StopBudget::Points(25))
            .with_dequeue_timeout(Duration::from_millis(200));
        let seeds = SeedSpace::axis_and_uniform(2);

        for name in ["sequential", "concurrent", "priority", "bandit"] {
            let kind = StrategyKind::from_name(name).unwrap();
            let strategy = kind
                .build(config.clone(), Arc::new(ScoreFn(score)), CancellationToken::new())
                .unwrap();
            let stats = strategy.run(&seeds).unwrap();
            assert_eq!(stats.algorithm(), strategy.name());
            assert!(stats.best_score() > 0.8, "{name} reached {}", stats.best_score());
        }
    }

    #[test]
    fn unknown_names_are_rejected() {
        assert_eq!(StrategyKind::from_name("annealing"), None);
        assert_eq!(StrategyKind::from_name(" Parallel "), Some(StrategyKind::Concurrent));
    }

    #[test]
    fn kind_serde_defaults_policy() {
        let kind: StrategyKind =
            serde_json::from_str(r#"{"kind":"bandit","grid_resolution":3}"#).unwrap();
        assert_eq!(
            kind,
            StrategyKind::Bandit {
                grid_resolution: 3,
                policy: PolicyKind::Ucb1
            }
        );
        let json = serde_json::to_string(&StrategyKind::PriorityFrontier).unwrap();
        assert_eq!(json, r#"{"kind":"priority_frontier"}"#);
    }

    #[test]
    fn build_validates_configuration() {
        let err = StrategyKind::Sequential
            .build(
                SearchConfig::new(["m0"]).with_delta(-1.0),
                Arc::new(ScoreFn(score)),
                CancellationToken::new(),
            )
            .err()
            .unwrap();
        assert!(matches!(err, MelifError::Config(_)));
    }
}
