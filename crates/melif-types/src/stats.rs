use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::SearchConfig;
use crate::point::Point;
use crate::selection::SelectionResult;

/// Unique search run identifier
pub type RunId = Uuid;

/// A best score within this distance of 1.0 ends the search early.
pub const NEAR_PERFECT_TOLERANCE: f64 = 1e-4;

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// Every coordinate descent ran until no neighbour improved.
    Converged,
    /// The point budget was used up.
    BudgetExhausted,
    /// Too many consecutive evaluations without improvement.
    NoImprovement,
    /// The best score came within [`NEAR_PERFECT_TOLERANCE`] of 1.0.
    NearPerfectScore,
    /// No frontier holds candidates and no worker can produce more.
    FrontierExhausted,
    /// The caller cancelled the run.
    Cancelled,
    /// A worker failed.
    Failed,
}

impl StopReason {
    /// Stops that end a run without a usable result.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Failed)
    }
}

#[derive(Debug, Default)]
struct StatsHolder {
    best_result: Option<SelectionResult>,
    visited_points: u64,
    no_improve: u64,
}

/// Statistics of a single search run.
///
/// Shared by every worker of the run. Best-result and counter updates go
/// through one lock, so each update is atomic with respect to the others.
#[derive(Debug)]
pub struct RunStats {
    id: RunId,
    algorithm: String,
    measures: Vec<String>,
    started_at: DateTime<Utc>,
    finished_at: Mutex<Option<DateTime<Utc>>>,
    stop_reason: Mutex<Option<StopReason>>,
    holder: Mutex<StatsHolder>,
}

impl RunStats {
    pub fn new(algorithm: impl Into<String>, config: &SearchConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            algorithm: algorithm.into(),
            measures: config.measures.clone(),
            started_at: Utc::now(),
            finished_at: Mutex::new(None),
            stop_reason: Mutex::new(None),
            holder: Mutex::new(StatsHolder::default()),
        }
    }

    pub fn id(&self) -> RunId {
        self.id
    }

    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    /// Names of the relevance measures active in this run.
    pub fn measures(&self) -> &[String] {
        &self.measures
    }

    /// Count one evaluated point and keep `result` if it beats the best so far.
    ///
    /// Returns `true` when `result` became the new best.
    pub fn update_best_result(&self, result: &SelectionResult) -> bool {
        let mut holder = self.holder.lock();
        holder.visited_points += 1;
        holder.no_improve += 1;
        let improved = match &holder.best_result {
            Some(best) => result.better_than(best),
            None => true,
        };
        if improved {
            holder.best_result = Some(result.clone());
            holder.no_improve = 0;
        }
        improved
    }

    pub fn best_result(&self) -> Option<SelectionResult> {
        self.holder.lock().best_result.clone()
    }

    /// Best score so far, or the sentinel 0.0 before the first evaluation.
    pub fn best_score(&self) -> f64 {
        self.holder
            .lock()
            .best_result
            .as_ref()
            .map_or(0.0, |r| r.score)
    }

    pub fn best_point(&self) -> Option<Point> {
        self.holder
            .lock()
            .best_result
            .as_ref()
            .map(|r| r.point.clone())
    }

    pub fn visited_points(&self) -> u64 {
        self.holder.lock().visited_points
    }

    /// Consecutive evaluations since the best score last improved.
    pub fn no_improve(&self) -> u64 {
        self.holder.lock().no_improve
    }

    pub fn is_near_perfect(&self) -> bool {
        (self.best_score() - 1.0).abs() < NEAR_PERFECT_TOLERANCE
    }

    /// Record why the run stopped. The first recorded reason wins.
    pub fn record_stop(&self, reason: StopReason) -> StopReason {
        *self.stop_reason.lock().get_or_insert(reason)
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        *self.stop_reason.lock()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn mark_finished(&self) {
        *self.finished_at.lock() = Some(Utc::now());
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        *self.finished_at.lock()
    }

    /// Wall time between start and finish (or now, while still running).
    pub fn work_time(&self) -> Duration {
        self.finished_at().unwrap_or_else(Utc::now) - self.started_at
    }

    pub fn summary(&self) -> RunSummary {
        let best = self.best_result();
        RunSummary {
            id: self.id,
            algorithm: self.algorithm.clone(),
            measures: self.measures.clone(),
            best_score: best.as_ref().map_or(0.0, |r| r.score),
            best_point: best.as_ref().map(|r| r.point.clone()),
            selected_features: best.map(|r| r.selected_features).unwrap_or_default(),
            visited_points: self.visited_points(),
            stop_reason: self.stop_reason(),
            started_at: self.started_at,
            finished_at: self.finished_at(),
            work_time_ms: self.work_time().num_milliseconds(),
        }
    }
}

/// Serializable snapshot of a run for reporting layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub id: RunId,
    pub algorithm: String,
    pub measures: Vec<String>,
    pub best_score: f64,
    pub best_point: Option<Point>,
    pub selected_features: Vec<usize>,
    pub visited_points: u64,
    pub stop_reason: Option<StopReason>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub work_time_ms: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn stats() -> RunStats {
        RunStats::new("test", &SearchConfig::new(["a", "b"]))
    }

    fn result(score: f64) -> SelectionResult {
        SelectionResult::new(Point::uniform(2).unwrap(), score, vec![0])
    }

    #[test]
    fn sentinel_before_first_update() {
        let stats = stats();
        assert_eq!(stats.best_score(), 0.0);
        assert!(stats.best_result().is_none());
        assert_eq!(stats.visited_points(), 0);
        assert_eq!(stats.measures(), ["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn best_result_only_replaced_when_strictly_better() {
        let stats = stats();
        assert!(stats.update_best_result(&result(0.0)));
        assert!(stats.update_best_result(&result(0.5)));
        assert!(!stats.update_best_result(&result(0.5)));
        assert!(!stats.update_best_result(&result(0.2)));

        assert_eq!(stats.best_score(), 0.5);
        assert_eq!(stats.visited_points(), 4);
        assert_eq!(stats.no_improve(), 2);

        assert!(stats.update_best_result(&result(0.7)));
        assert_eq!(stats.no_improve(), 0);
    }

    #[test]
    fn near_perfect_detection() {
        let stats = stats();
        stats.update_best_result(&result(0.9999));
        assert!(!stats.is_near_perfect());
        stats.update_best_result(&result(0.99995));
        assert!(stats.is_near_perfect());
    }

    #[test]
    fn concurrent_updates_are_counted_and_monotonic() {
        let stats = Arc::new(stats());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let stats = Arc::clone(&stats);
                thread::spawn(move || {
                    let mut last = 0.0;
                    for i in 0..100 {
                        stats.update_best_result(&result(((t * 100 + i) % 97) as f64 / 100.0));
                        let now = stats.best_score();
                        assert!(now >= last);
                        last = now;
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(stats.visited_points(), 800);
        assert_eq!(stats.best_score(), 0.96);
    }

    #[test]
    fn first_stop_reason_wins() {
        let stats = stats();
        assert_eq!(stats.record_stop(StopReason::NearPerfectScore), StopReason::NearPerfectScore);
        assert_eq!(stats.record_stop(StopReason::BudgetExhausted), StopReason::NearPerfectScore);
        assert_eq!(stats.stop_reason(), Some(StopReason::NearPerfectScore));
        assert!(!StopReason::NearPerfectScore.is_failure());
        assert!(StopReason::Cancelled.is_failure());
    }

    #[test]
    fn summary_snapshot() {
        let stats = stats();
        stats.update_best_result(&SelectionResult::new(Point::unit(2, 1).unwrap(), 0.8, vec![4, 2]));
        stats.mark_finished();

        let summary = stats.summary();
        assert_eq!(summary.algorithm, "test");
        assert_eq!(summary.best_score, 0.8);
        assert_eq!(summary.best_point, Some(Point::unit(2, 1).unwrap()));
        assert_eq!(summary.selected_features, vec![4, 2]);
        assert_eq!(summary.visited_points, 1);
        assert!(summary.finished_at.is_some());
        assert!(summary.work_time_ms >= 0);

        let json = serde_json::to_string(&summary).unwrap();
        let back: RunSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(summary, back);
    }
}
