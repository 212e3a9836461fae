//! # melif-search
//!
//! Weight-space search for MeLiF feature selection.
//!
//! A point is a normalized weight vector over the configured relevance
//! measures; its score comes from a [`ScoreEvaluator`]. The crate provides
//! sequential and concurrent coordinate descent, a best-first priority
//! frontier scheduler and a multi-armed bandit scheduler over a partition of
//! the weight simplex, all sharing deduplication of visited points,
//! near-perfect early exit and cooperative cancellation.

mod bandit;
mod concurrent;
mod context;
mod control;
mod evaluator;
mod frontier;
mod policy;
mod pool;
mod priority;
mod scheduler;
mod sequential;
mod space;
mod strategy;
mod visited;

pub use bandit::BanditFrontierScheduler;
pub use concurrent::ConcurrentSearch;
pub use control::{CancellationToken, StopSignal};
pub use evaluator::{CuttingRule, RankingEvaluator, ScoreEvaluator, ScoreFn};
pub use frontier::{Frontier, Prioritized};
pub use policy::{ArmSelector, ArmStats, EpsilonGreedy, PolicyKind, SingleArm, SoftMax, Ucb1};
pub use pool::WorkerPool;
pub use priority::PriorityFrontierScheduler;
pub use sequential::SequentialSearch;
pub use space::SeedSpace;
pub use strategy::{SearchStrategy, StrategyKind};
pub use visited::VisitedSet;
