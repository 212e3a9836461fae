//! Cooperative stop and cancellation.

use melif_types::{RunStats, StopBudget, StopReason};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Caller-held handle that asks a running search to stop.
///
/// A cancelled run ends with [`melif_types::MelifError::Interrupted`] rather
/// than a result.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Stop predicate shared by every worker of one run.
#[derive(Debug)]
pub struct StopSignal {
    budget: Option<StopBudget>,
    remaining: AtomicUsize,
    stopped: AtomicBool,
    token: CancellationToken,
}

impl StopSignal {
    /// A signal driven by `budget`, cancellation and near-perfect scores.
    pub fn new(budget: StopBudget, token: CancellationToken) -> Self {
        let remaining = match budget {
            StopBudget::Points(n) => n,
            StopBudget::NoImprovement(_) => 0,
        };
        Self {
            budget: Some(budget),
            remaining: AtomicUsize::new(remaining),
            stopped: AtomicBool::new(false),
            token,
        }
    }

    /// A signal with no budget: only cancellation and near-perfect scores stop it.
    pub fn unbounded(token: CancellationToken) -> Self {
        Self {
            budget: None,
            remaining: AtomicUsize::new(0),
            stopped: AtomicBool::new(false),
            token,
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Stop the run, recording `reason` unless another reason came first.
    /// Returns `true` if this call flipped the signal.
    pub fn trigger(&self, stats: &RunStats, reason: StopReason) -> bool {
        stats.record_stop(reason);
        !self.stopped.swap(true, Ordering::SeqCst)
    }

    /// Check cancellation and the near-perfect exit without spending budget.
    pub fn observe(&self, stats: &RunStats) -> bool {
        if self.is_stopped() {
            return true;
        }
        if self.token.is_cancelled() {
            self.trigger(stats, StopReason::Cancelled);
            return true;
        }
        if stats.is_near_perfect() {
            self.trigger(stats, StopReason::NearPerfectScore);
            return true;
        }
        false
    }

    /// Called once at the start of every worker step.
    ///
    /// Spends one unit of a point budget; returns `true` once the run must stop.
    pub fn check(&self, stats: &RunStats) -> bool {
        if self.observe(stats) {
            return true;
        }
        match self.budget {
            Some(StopBudget::Points(_)) => {
                let spent = self
                    .remaining
                    .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |r| r.checked_sub(1));
                if spent.is_err() {
                    self.trigger(stats, StopReason::BudgetExhausted);
                    return true;
                }
                false
            }
            Some(StopBudget::NoImprovement(window)) => {
                if stats.no_improve() > window as u64 {
                    self.trigger(stats, StopReason::NoImprovement);
                    return true;
                }
                false
            }
            None => false,
        }
    }
}
