//! Run configuration for a sweep.
//!
//! [`SweepConfig::default`] reproduces the reference sweep. With the `serde`
//! feature a config can be loaded from JSON; missing fields take their
//! default values.

use crate::arm::ArmConfig;
use crate::combos;
use crate::error::{Result, SimError};
use crate::experiment::DEFAULT_ITERATIONS;
use crate::policy::PolicyConfig;

/// Checkpoints of the reference sweep.
pub const REFERENCE_CHECKPOINTS: [u64; 16] = [
    2, 3, 100, 200, 2_000, 10_000, 20_000, 40_000, 60_000, 80_000, 100_000, 200_000, 400_000,
    600_000, 800_000, 1_000_000,
];

/// Value-at-Risk levels of the reference sweep.
pub const REFERENCE_ALPHAS: [f64; 3] = [0.01, 0.05, 0.1];

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default, deny_unknown_fields)
)]
pub struct SweepConfig {
    /// One entry per algorithm parameter set. UCB-Normal runs only when
    /// listed here; nothing stops pairing it with Bernoulli arms.
    pub algorithms: Vec<PolicyConfig>,
    /// Base arm configurations.
    pub arms: Vec<ArmConfig>,
    /// Run every ordering of each base configuration.
    pub permute: bool,
    /// Steps at which totals are recorded; the largest is the horizon.
    pub checkpoints: Vec<u64>,
    pub iterations: u32,
    pub seed: u64,
    /// Value-at-Risk levels.
    pub alphas: Vec<f64>,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            algorithms: PolicyConfig::reference_set(),
            arms: combos::reference_bases(),
            permute: true,
            checkpoints: REFERENCE_CHECKPOINTS.to_vec(),
            iterations: DEFAULT_ITERATIONS,
            seed: 0,
            alphas: REFERENCE_ALPHAS.to_vec(),
        }
    }
}

impl SweepConfig {
    /// Fail fast on anything that would make a later combination fail.
    pub fn validate(&self) -> Result<()> {
        if self.algorithms.is_empty() {
            return Err(SimError::invalid("no algorithms configured"));
        }
        for a in &self.algorithms {
            a.validate()?;
        }
        if self.arms.is_empty() {
            return Err(SimError::invalid("no arm configurations"));
        }
        for arms in &self.arms {
            arms.validate()?;
        }
        if self.checkpoints.is_empty() {
            return Err(SimError::invalid("checkpoint list is empty"));
        }
        if self.checkpoints.contains(&0) {
            return Err(SimError::invalid("checkpoints must be >= 1"));
        }
        if self.iterations == 0 {
            return Err(SimError::invalid("iterations must be >= 1"));
        }
        if let Some(a) = self.alphas.iter().find(|&&a| !(a > 0.0 && a < 1.0)) {
            return Err(SimError::invalid(format!("alpha={a} must lie in (0, 1)")));
        }
        let mut labels: Vec<String> = self.algorithms.iter().map(PolicyConfig::label).collect();
        labels.sort();
        if let Some(w) = labels.windows(2).find(|w| w[0] == w[1]) {
            return Err(SimError::invalid(format!("algorithm {} listed twice", w[0])));
        }
        Ok(())
    }

    /// The arm configurations actually run, after optional permutation.
    pub fn combinations(&self) -> Vec<ArmConfig> {
        if self.permute {
            combos::expand(&self.arms)
        } else {
            self.arms.clone()
        }
    }

    #[cfg(feature = "serde")]
    pub fn from_json_str(s: &str) -> Result<Self> {
        let cfg: SweepConfig = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    #[cfg(feature = "serde")]
    pub fn from_json_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let s = std::fs::read_to_string(path)?;
        Self::from_json_str(&s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_the_reference_sweep() {
        let cfg = SweepConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.algorithms.len(), 8);
        assert_eq!(cfg.checkpoints.last(), Some(&1_000_000));
        assert_eq!(cfg.iterations, 100);
        // 7 three-arm bases (two with a repeated value) and 10 two-arm bases.
        assert_eq!(cfg.combinations().len(), 6 * 5 + 3 * 2 + 10 * 2);
    }

    #[test]
    fn validation_rejects_bad_fields() {
        let base = SweepConfig::default();
        let cases: Vec<SweepConfig> = vec![
            SweepConfig {
                algorithms: vec![],
                ..base.clone()
            },
            SweepConfig {
                checkpoints: vec![0, 5],
                ..base.clone()
            },
            SweepConfig {
                iterations: 0,
                ..base.clone()
            },
            SweepConfig {
                alphas: vec![1.5],
                ..base.clone()
            },
            SweepConfig {
                algorithms: vec![PolicyConfig::Ucb, PolicyConfig::Ucb],
                ..base.clone()
            },
            SweepConfig {
                arms: vec![ArmConfig::bernoulli(vec![0.5, 1.5])],
                ..base
            },
        ];
        for cfg in cases {
            assert!(cfg.validate().is_err(), "{cfg:?}");
        }
    }

    #[test]
    fn ucb_normal_is_opt_in() {
        let reference = SweepConfig::default();
        assert!(!reference.algorithms.contains(&PolicyConfig::UcbNormal));
        assert!(reference
            .combinations()
            .iter()
            .all(|c| matches!(c, ArmConfig::Bernoulli { .. })));

        let cfg = SweepConfig {
            algorithms: vec![PolicyConfig::UcbNormal, PolicyConfig::Ucb],
            arms: vec![
                ArmConfig::normal(vec![0.5, 0.495], vec![0.25, 0.25]),
                ArmConfig::bernoulli(vec![0.9, 0.8]),
            ],
            ..reference
        };
        cfg.validate().unwrap();
        assert_eq!(cfg.combinations().len(), 4);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn json_fills_missing_fields_with_defaults() {
        let cfg = SweepConfig::from_json_str(
            r#"{
                "algorithms": [
                    {"algorithm": "UCB-V", "theta": 1.0, "c": 1.0, "b": 1.0},
                    {"algorithm": "ETC", "exploration_rounds": 10}
                ],
                "arms": [{"model": "bernoulli", "means": [0.9, 0.8]}],
                "checkpoints": [10, 100],
                "iterations": 3
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.algorithms[1], PolicyConfig::Etc { exploration_rounds: 10 });
        assert_eq!(cfg.alphas, REFERENCE_ALPHAS.to_vec());
        assert!(cfg.permute);
        assert_eq!(cfg.combinations().len(), 2);

        assert!(SweepConfig::from_json_str(r#"{"iterations": 0}"#).is_err());
        assert!(SweepConfig::from_json_str(r#"{"bogus": 1}"#).is_err());
    }
}
