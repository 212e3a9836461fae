//! The scoring boundary every strategy calls through.

use melif_types::{evaluation_error, ConfigError, MelifResult, Point, RunStats, SelectionResult};
use serde::{Deserialize, Serialize};

/// Scores a weight point.
///
/// Implementations typically filter the dataset by the point's linear form,
/// train a classifier per cross-validation fold and average the fold scores.
/// They are called concurrently from several workers and may be expensive.
/// The run statistics are passed for context (e.g. the active measure names);
/// the scheduler records the returned result itself.
pub trait ScoreEvaluator: Send + Sync {
    fn evaluate(&self, point: &Point, stats: &RunStats) -> MelifResult<SelectionResult>;
}

impl<F> ScoreEvaluator for F
where
    F: Fn(&Point, &RunStats) -> MelifResult<SelectionResult> + Send + Sync,
{
    fn evaluate(&self, point: &Point, stats: &RunStats) -> MelifResult<SelectionResult> {
        self(point, stats)
    }
}

/// Wraps a plain score function of the point; no features are reported.
#[derive(Debug, Clone, Copy)]
pub struct ScoreFn<F>(pub F);

impl<F> ScoreEvaluator for ScoreFn<F>
where
    F: Fn(&Point) -> f64 + Send + Sync,
{
    fn evaluate(&self, point: &Point, _stats: &RunStats) -> MelifResult<SelectionResult> {
        Ok(SelectionResult::new(point.clone(), (self.0)(point), Vec::new()))
    }
}

/// How many of the ranked features are kept.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CuttingRule {
    /// Keep the `k` best-ranked features.
    PreferredSize(usize),
    /// Keep this percentage (0..=100) of the features, rounded down.
    Percent(f64),
}

impl CuttingRule {
    fn keep(&self, total: usize) -> usize {
        match *self {
            Self::PreferredSize(k) => k.min(total),
            Self::Percent(p) => ((total as f64 * p) / 100.0).floor() as usize,
        }
    }
}

/// Linear-form feature filter in front of an external scorer.
///
/// Each feature's precomputed relevance scores (one per measure) are combined
/// with the point's weights; features are ranked by the weighted sum, cut by
/// the [`CuttingRule`], and the kept indices are handed to `scorer`, which
/// stands for classifier training and cross-validation.
pub struct RankingEvaluator<S> {
    relevance: Vec<Vec<f64>>,
    rule: CuttingRule,
    scorer: S,
}

impl<S> RankingEvaluator<S>
where
    S: Fn(&[usize]) -> MelifResult<f64> + Send + Sync,
{
    /// `relevance[f][m]` is the score of feature `f` under measure `m`.
    pub fn new(relevance: Vec<Vec<f64>>, rule: CuttingRule, scorer: S) -> Result<Self, ConfigError> {
        let expected = relevance.first().map_or(0, Vec::len);
        if let Some((feature, row)) = relevance
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != expected)
        {
            return Err(ConfigError::RelevanceShape {
                feature,
                expected,
                actual: row.len(),
            });
        }
        if let CuttingRule::Percent(p) = rule {
            if !(0.0..=100.0).contains(&p) {
                return Err(ConfigError::InvalidCuttingRule {
                    message: format!("percent must be within 0..=100, got {p}"),
                });
            }
        }
        Ok(Self {
            relevance,
            rule,
            scorer,
        })
    }

    pub fn feature_count(&self) -> usize {
        self.relevance.len()
    }

    /// Feature indices ordered by descending weighted relevance; ties keep
    /// index order.
    pub fn rank(&self, point: &Point) -> Vec<usize> {
        let weights = point.coordinates();
        let mut ranked: Vec<(usize, f64)> = self
            .relevance
            .iter()
            .enumerate()
            .map(|(f, row)| (f, row.iter().zip(weights).map(|(r, w)| r * w).sum()))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.into_iter().map(|(f, _)| f).collect()
    }

    /// The features kept for `point`.
    pub fn select(&self, point: &Point) -> Vec<usize> {
        let mut ranked = self.rank(point);
        ranked.truncate(self.rule.keep(ranked.len()));
        ranked
    }
}

impl<S> ScoreEvaluator for RankingEvaluator<S>
where
    S: Fn(&[usize]) -> MelifResult<f64> + Send + Sync,
{
    fn evaluate(&self, point: &Point, stats: &RunStats) -> MelifResult<SelectionResult> {
        let measures = stats.measures().len();
        let row_len = self.relevance.first().map_or(measures, Vec::len);
        if point.dimension() != row_len {
            return Err(evaluation_error!(
                point,
                "point has {} weights but relevance rows have {} measures",
                point.dimension(),
                row_len
            ));
        }
        let selected = self.select(point);
        let score = (self.scorer)(&selected)?;
        Ok(SelectionResult::new(point.clone(), score, selected))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use melif_types::{MelifError, SearchConfig};

    fn stats() -> RunStats {
        RunStats::new("test", &SearchConfig::new(["m0", "m1"]))
    }

    fn relevance() -> Vec<Vec<f64>> {
        vec![
            vec![0.9, 0.1], // 0
            vec![0.1, 0.9], // 1
            vec![0.5, 0.5], // 2
            vec![0.0, 0.2], // 3
        ]
    }

    #[test]
    fn closures_are_evaluators() {
        let evaluator = |p: &Point, _: &RunStats| {
            Ok::<_, MelifError>(SelectionResult::new(p.clone(), p.coordinates()[0], vec![0]))
        };
        let result = evaluator.evaluate(&Point::unit(2, 0).unwrap(), &stats()).unwrap();
        assert_eq!(result.score, 1.0);

        let evaluator = ScoreFn(|p: &Point| 1.0 - p.coordinates()[1]);
        let result = evaluator.evaluate(&Point::unit(2, 1).unwrap(), &stats()).unwrap();
        assert_eq!(result.score, 0.0);
        assert!(result.selected_features.is_empty());
    }

    #[test]
    fn ranking_follows_the_weights() {
        let evaluator =
            RankingEvaluator::new(relevance(), CuttingRule::PreferredSize(2), |_: &[usize]| Ok(0.5))
                .unwrap();
        assert_eq!(evaluator.feature_count(), 4);
        assert_eq!(evaluator.rank(&Point::unit(2, 0).unwrap()), vec![0, 2, 1, 3]);
        assert_eq!(evaluator.select(&Point::unit(2, 0).unwrap()), vec![0, 2]);
        assert_eq!(evaluator.select(&Point::unit(2, 1).unwrap()), vec![1, 2]);
    }

    #[test]
    fn percent_rule_rounds_down() {
        let evaluator =
            RankingEvaluator::new(relevance(), CuttingRule::Percent(60.0), |_: &[usize]| Ok(0.5))
                .unwrap();
        assert_eq!(evaluator.select(&Point::unit(2, 0).unwrap()).len(), 2);

        assert!(matches!(
            RankingEvaluator::new(relevance(), CuttingRule::Percent(120.0), |_: &[usize]| Ok(0.5)),
            Err(ConfigError::InvalidCuttingRule { .. })
        ));
    }

    #[test]
    fn scorer_sees_selected_features() {
        // Reward selecting feature 1
        let evaluator = RankingEvaluator::new(relevance(), CuttingRule::PreferredSize(1), |f: &[usize]| {
            Ok(if f.contains(&1) { 1.0 } else { 0.25 })
        })
        .unwrap();
        let stats = stats();

        let good = evaluator.evaluate(&Point::unit(2, 1).unwrap(), &stats).unwrap();
        assert_eq!(good.score, 1.0);
        assert_eq!(good.selected_features, vec![1]);

        let bad = evaluator.evaluate(&Point::unit(2, 0).unwrap(), &stats).unwrap();
        assert_eq!(bad.score, 0.25);
    }

    #[test]
    fn rejects_ragged_relevance_and_wrong_dimension() {
        let ragged = vec![vec![0.1, 0.2], vec![0.3]];
        assert_eq!(
            RankingEvaluator::new(ragged, CuttingRule::PreferredSize(1), |_: &[usize]| Ok(0.0))
                .err(),
            Some(ConfigError::RelevanceShape {
                feature: 1,
                expected: 2,
                actual: 1
            })
        );

        let evaluator =
            RankingEvaluator::new(relevance(), CuttingRule::PreferredSize(1), |_: &[usize]| Ok(0.0))
                .unwrap();
        assert!(evaluator.evaluate(&Point::uniform(3).unwrap(), &stats()).is_err());
    }
}
