//! Arm configurations and the stochastic reward model.
//!
//! [`ArmConfig`] is the plain, serializable description of a bandit problem
//! (true means, plus variances for Normal rewards). [`ArmModel`] is the
//! validated, ready-to-sample form: it precomputes the optimal arm and the
//! per-arm distributions, and is shared read-only by every trial.

use rand::distr::Bernoulli;
use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::error::{Result, SimError};
use crate::utils::first_max;

/// Description of the arms of one bandit problem.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(tag = "model", rename_all = "snake_case")
)]
pub enum ArmConfig {
    /// Rewards are 1 with probability `mean`, else 0. Means must lie in `(0, 1]`.
    Bernoulli { means: Vec<f64> },
    /// Rewards are drawn from `Normal(mean, sqrt(variance))`.
    Normal { means: Vec<f64>, variances: Vec<f64> },
}

impl ArmConfig {
    pub fn bernoulli(means: impl Into<Vec<f64>>) -> Self {
        ArmConfig::Bernoulli {
            means: means.into(),
        }
    }

    pub fn normal(means: impl Into<Vec<f64>>, variances: impl Into<Vec<f64>>) -> Self {
        ArmConfig::Normal {
            means: means.into(),
            variances: variances.into(),
        }
    }

    pub fn means(&self) -> &[f64] {
        match self {
            ArmConfig::Bernoulli { means } | ArmConfig::Normal { means, .. } => means,
        }
    }

    /// Short name used for artifact file names, e.g. `[0.9, 0.85]` -> `900_850`.
    ///
    /// Means below 1 are scaled by 1000, others by 100 (truncating), so
    /// `[1.0, 0.5]` -> `100_500`.
    pub fn name(&self) -> String {
        let parts: Vec<String> = self
            .means()
            .iter()
            .map(|&a| {
                let scaled = if a < 1.0 { a * 1000.0 } else { a * 100.0 };
                // Nudge before truncating so representation error can't drop a unit.
                format!("{}", (scaled + 1e-9).trunc() as i64)
            })
            .collect();
        let prefix = match self {
            ArmConfig::Bernoulli { .. } => "",
            ArmConfig::Normal { .. } => "n",
        };
        format!("{prefix}{}", parts.join("_"))
    }

    /// Check the configuration without building samplers.
    pub fn validate(&self) -> Result<()> {
        let means = self.means();
        if means.len() < 2 {
            return Err(SimError::invalid(format!(
                "a bandit needs at least 2 arms, got {}",
                means.len()
            )));
        }
        match self {
            ArmConfig::Bernoulli { means } => {
                for (i, &m) in means.iter().enumerate() {
                    if !(m.is_finite() && m > 0.0 && m <= 1.0) {
                        return Err(SimError::invalid(format!(
                            "bernoulli arm {i}: mean {m} is outside (0, 1]"
                        )));
                    }
                }
            }
            ArmConfig::Normal { means, variances } => {
                if variances.len() != means.len() {
                    return Err(SimError::invalid(format!(
                        "normal arms: {} means but {} variances",
                        means.len(),
                        variances.len()
                    )));
                }
                for (i, (&m, &v)) in means.iter().zip(variances).enumerate() {
                    if !m.is_finite() {
                        return Err(SimError::invalid(format!("normal arm {i}: mean {m} is not finite")));
                    }
                    if !(v.is_finite() && v >= 0.0) {
                        return Err(SimError::invalid(format!(
                            "normal arm {i}: variance {v} must be finite and >= 0"
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Which bookkeeping bucket a reward falls into.
///
/// Bernoulli rewards are literally 0 or 1. Normal rewards have no such
/// values, so a reward at or below the arm's true mean counts as `Zero` and
/// one above it as `One`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewardBucket {
    Zero,
    One,
}

#[derive(Debug, Clone)]
enum Samplers {
    Bernoulli(Vec<Bernoulli>),
    Normal(Vec<Normal<f64>>),
}

/// Validated reward model for one bandit problem.
#[derive(Debug, Clone)]
pub struct ArmModel {
    config: ArmConfig,
    samplers: Samplers,
    optimal: usize,
}

impl ArmModel {
    pub fn new(config: ArmConfig) -> Result<Self> {
        config.validate()?;
        let samplers = match &config {
            ArmConfig::Bernoulli { means } => Samplers::Bernoulli(
                means
                    .iter()
                    .map(|&p| {
                        Bernoulli::new(p).map_err(|e| SimError::invalid(format!("mean {p}: {e}")))
                    })
                    .collect::<Result<_>>()?,
            ),
            ArmConfig::Normal { means, variances } => Samplers::Normal(
                means
                    .iter()
                    .zip(variances)
                    .map(|(&m, &v)| {
                        Normal::new(m, v.sqrt())
                            .map_err(|e| SimError::invalid(format!("normal({m}, {v}): {e}")))
                    })
                    .collect::<Result<_>>()?,
            ),
        };
        let optimal = first_max(config.means()).unwrap_or(0);
        Ok(Self {
            config,
            samplers,
            optimal,
        })
    }

    pub fn config(&self) -> &ArmConfig {
        &self.config
    }

    pub fn num_arms(&self) -> usize {
        self.config.means().len()
    }

    pub fn means(&self) -> &[f64] {
        self.config.means()
    }

    pub fn mean(&self, arm: usize) -> f64 {
        self.config.means()[arm]
    }

    /// Index of the optimal arm (first maximum of the true means).
    pub fn optimal_arm(&self) -> usize {
        self.optimal
    }

    pub fn optimal_mean(&self) -> f64 {
        self.mean(self.optimal)
    }

    /// Expected loss of pulling `arm` instead of the optimal arm.
    pub fn gap(&self, arm: usize) -> f64 {
        self.optimal_mean() - self.mean(arm)
    }

    pub fn is_normal(&self) -> bool {
        matches!(self.samplers, Samplers::Normal(_))
    }

    /// Draw one reward for `arm`.
    ///
    /// # Panics
    ///
    /// Panics if `arm >= self.num_arms()`; the trial runner bounds-checks
    /// policy output before sampling.
    pub fn sample<R: Rng + ?Sized>(&self, arm: usize, rng: &mut R) -> f64 {
        match &self.samplers {
            Samplers::Bernoulli(d) => {
                if d[arm].sample(rng) {
                    1.0
                } else {
                    0.0
                }
            }
            Samplers::Normal(d) => d[arm].sample(rng),
        }
    }

    /// Bucket a reward observed on `arm`.
    pub fn classify(&self, arm: usize, reward: f64) -> RewardBucket {
        match self.samplers {
            Samplers::Bernoulli(_) => {
                if reward == 0.0 {
                    RewardBucket::Zero
                } else {
                    RewardBucket::One
                }
            }
            Samplers::Normal(_) => {
                if reward <= self.mean(arm) {
                    RewardBucket::Zero
                } else {
                    RewardBucket::One
                }
            }
        }
    }
}
