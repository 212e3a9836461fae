//! Arm selection policies for the frontier schedulers.

use melif_types::ConfigError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Chooses which frontier the next worker step pulls from.
///
/// Called under the scheduler's policy lock, so implementations need no
/// interior synchronization.
pub trait ArmSelector: Send {
    fn arms(&self) -> usize;

    /// Pick an arm. `available[i]` tells whether arm `i` currently holds
    /// candidates; `None` means nothing can be selected right now.
    fn select(&mut self, available: &[bool]) -> Option<usize>;

    /// Feed back the score obtained from a candidate of `arm`.
    fn record(&mut self, arm: usize, reward: f64);

    fn name(&self) -> &str;
}

/// Per-arm visit counts and reward sums.
#[derive(Debug, Clone)]
pub struct ArmStats {
    visits: Vec<u64>,
    reward_sums: Vec<f64>,
    tries: u64,
}

impl ArmStats {
    pub fn new(arms: usize) -> Self {
        Self {
            visits: vec![0; arms],
            reward_sums: vec![0.0; arms],
            tries: 0,
        }
    }

    pub fn arms(&self) -> usize {
        self.visits.len()
    }

    /// Selections made so far.
    pub fn tries(&self) -> u64 {
        self.tries
    }

    pub fn visits(&self, arm: usize) -> u64 {
        self.visits[arm]
    }

    pub fn reward_sum(&self, arm: usize) -> f64 {
        self.reward_sums[arm]
    }

    /// Mean reward of `arm`, `None` while it has no recorded reward.
    pub fn mean(&self, arm: usize) -> Option<f64> {
        match self.visits[arm] {
            0 => None,
            n => Some(self.reward_sums[arm] / n as f64),
        }
    }

    pub fn record(&mut self, arm: usize, reward: f64) {
        self.visits[arm] += 1;
        self.reward_sums[arm] += reward;
    }

    /// Round-robin over the arms until each was selected once, regardless of
    /// availability; an empty pick is handled by the caller.
    fn cold_start(&mut self) -> Option<usize> {
        if self.tries < self.arms() as u64 {
            let arm = self.tries as usize;
            self.tries += 1;
            Some(arm)
        } else {
            None
        }
    }
}

/// First available index with the largest value; ties keep the lower index.
fn argmax(values: impl Iterator<Item = (usize, f64)>) -> Option<usize> {
    values
        .fold(None, |best: Option<(usize, f64)>, (arm, value)| match best {
            Some((_, top)) if value <= top => best,
            _ => Some((arm, value)),
        })
        .map(|(arm, _)| arm)
}

fn available_arms(available: &[bool]) -> impl Iterator<Item = usize> + '_ {
    available
        .iter()
        .enumerate()
        .filter(|(_, ready)| **ready)
        .map(|(arm, _)| arm)
}

/// A single frontier: selected whenever it has candidates.
#[derive(Debug, Clone, Default)]
pub struct SingleArm {
    stats: ArmStats,
}

impl SingleArm {
    pub fn new() -> Self {
        Self {
            stats: ArmStats::new(1),
        }
    }
}

impl Default for ArmStats {
    fn default() -> Self {
        Self::new(1)
    }
}

impl ArmSelector for SingleArm {
    fn arms(&self) -> usize {
        1
    }

    fn select(&mut self, available: &[bool]) -> Option<usize> {
        if available.first().copied().unwrap_or(false) {
            self.stats.tries += 1;
            Some(0)
        } else {
            None
        }
    }

    fn record(&mut self, arm: usize, reward: f64) {
        self.stats.record(arm, reward);
    }

    fn name(&self) -> &str {
        "single"
    }
}

/// Upper confidence bound selection.
///
/// After the cold start the arm maximizing
/// `mean + sqrt(2 ln(tries) / visits)` is chosen; an arm without recorded
/// rewards scores infinity.
#[derive(Debug, Clone)]
pub struct Ucb1 {
    stats: ArmStats,
}

impl Ucb1 {
    pub fn new(arms: usize) -> Self {
        Self {
            stats: ArmStats::new(arms),
        }
    }

    pub fn stats(&self) -> &ArmStats {
        &self.stats
    }

    pub fn arm_cost(&self, arm: usize) -> f64 {
        match self.stats.mean(arm) {
            None => f64::INFINITY,
            Some(mean) => {
                let tries = self.stats.tries.max(1) as f64;
                mean + (2.0 * tries.ln() / self.stats.visits(arm) as f64).sqrt()
            }
        }
    }
}

impl ArmSelector for Ucb1 {
    fn arms(&self) -> usize {
        self.stats.arms()
    }

    fn select(&mut self, available: &[bool]) -> Option<usize> {
        if let Some(arm) = self.stats.cold_start() {
            return Some(arm);
        }
        let arm = argmax(available_arms(available).map(|arm| (arm, self.arm_cost(arm))))?;
        self.stats.tries += 1;
        Some(arm)
    }

    fn record(&mut self, arm: usize, reward: f64) {
        self.stats.record(arm, reward);
    }

    fn name(&self) -> &str {
        "ucb1"
    }
}

/// With probability `epsilon` a random available arm, otherwise the best mean.
#[derive(Debug, Clone)]
pub struct EpsilonGreedy {
    epsilon: f64,
    rng: StdRng,
    stats: ArmStats,
}

impl EpsilonGreedy {
    pub fn new(arms: usize, epsilon: f64, seed: u64) -> Result<Self, ConfigError> {
        if !(0.0..=1.0).contains(&epsilon) {
            return Err(ConfigError::InvalidPolicy {
                message: format!("epsilon must be within 0..=1, got {epsilon}"),
            });
        }
        Ok(Self {
            epsilon,
            rng: StdRng::seed_from_u64(seed),
            stats: ArmStats::new(arms),
        })
    }
}

impl ArmSelector for EpsilonGreedy {
    fn arms(&self) -> usize {
        self.stats.arms()
    }

    fn select(&mut self, available: &[bool]) -> Option<usize> {
        if let Some(arm) = self.stats.cold_start() {
            return Some(arm);
        }
        let candidates: Vec<usize> = available_arms(available).collect();
        if candidates.is_empty() {
            return None;
        }
        let arm = if self.rng.random::<f64>() < self.epsilon {
            candidates[self.rng.random_range(0..candidates.len())]
        } else {
            let stats = &self.stats;
            argmax(
                candidates
                    .iter()
                    .map(|&arm| (arm, stats.mean(arm).unwrap_or(f64::INFINITY))),
            )?
        };
        self.stats.tries += 1;
        Some(arm)
    }

    fn record(&mut self, arm: usize, reward: f64) {
        self.stats.record(arm, reward);
    }

    fn name(&self) -> &str {
        "epsilon-greedy"
    }
}

/// Boltzmann exploration: arms are drawn with probability proportional to
/// `exp(mean / temperature)`.
#[derive(Debug, Clone)]
pub struct SoftMax {
    temperature: f64,
    rng: StdRng,
    stats: ArmStats,
}

impl SoftMax {
    pub fn new(arms: usize, temperature: f64, seed: u64) -> Result<Self, ConfigError> {
        if !temperature.is_finite() || temperature <= 0.0 {
            return Err(ConfigError::InvalidPolicy {
                message: format!("temperature must be finite and positive, got {temperature}"),
            });
        }
        Ok(Self {
            temperature,
            rng: StdRng::seed_from_u64(seed),
            stats: ArmStats::new(arms),
        })
    }
}

impl ArmSelector for SoftMax {
    fn arms(&self) -> usize {
        self.stats.arms()
    }

    fn select(&mut self, available: &[bool]) -> Option<usize> {
        if let Some(arm) = self.stats.cold_start() {
            return Some(arm);
        }
        let candidates: Vec<usize> = available_arms(available).collect();
        if candidates.is_empty() {
            return None;
        }

        // Arms without rewards are valued like the best arm seen so far
        let top = candidates
            .iter()
            .filter_map(|&arm| self.stats.mean(arm))
            .fold(f64::NEG_INFINITY, f64::max);
        let top = if top.is_finite() { top } else { 0.0 };
        let weights: Vec<f64> = candidates
            .iter()
            .map(|&arm| {
                let mean = self.stats.mean(arm).unwrap_or(top);
                ((mean - top) / self.temperature).exp()
            })
            .collect();

        let mut draw = self.rng.random::<f64>() * weights.iter().sum::<f64>();
        let mut arm = candidates[candidates.len() - 1];
        for (&candidate, weight) in candidates.iter().zip(&weights) {
            if draw < *weight {
                arm = candidate;
                break;
            }
            draw -= weight;
        }
        self.stats.tries += 1;
        Some(arm)
    }

    fn record(&mut self, arm: usize, reward: f64) {
        self.stats.record(arm, reward);
    }

    fn name(&self) -> &str {
        "softmax"
    }
}

/// Serializable choice of bandit policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PolicyKind {
    Ucb1,
    EpsilonGreedy { epsilon: f64, seed: u64 },
    SoftMax { temperature: f64, seed: u64 },
}

impl Default for PolicyKind {
    fn default() -> Self {
        Self::Ucb1
    }
}

impl PolicyKind {
    pub fn build(&self, arms: usize) -> Result<Box<dyn ArmSelector>, ConfigError> {
        if arms == 0 {
            return Err(ConfigError::InvalidPolicy {
                message: "at least one arm is required".to_string(),
            });
        }
        Ok(match *self {
            Self::Ucb1 => Box::new(Ucb1::new(arms)),
            Self::EpsilonGreedy { epsilon, seed } => Box::new(EpsilonGreedy::new(arms, epsilon, seed)?),
            Self::SoftMax { temperature, seed } => Box::new(SoftMax::new(arms, temperature, seed)?),
        })
    }
}
