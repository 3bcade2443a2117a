//! The `SelectionPolicy` trait and its nine implementations.
//!
//! Every policy shares the same two-method interface: `select_arm` picks the
//! arm for the current step from the trial's [`RunningStatistics`], and
//! `update` lets the policy adjust its own state after the runner has
//! recorded the reward. Statistics are owned by the trial, not the policy, so
//! one policy instance never sees more than one trial.
//!
//! [`PolicyConfig`] is the typed, serializable parameter set for each
//! algorithm. It is validated once, before any trial runs, and builds fresh
//! policy instances per trial.
//!
//! Shared conventions:
//! - Ties break to the lowest arm index.
//! - Any arm with zero pulls is played before a confidence bound is
//!   evaluated, so no bound ever divides by a zero count.
//! - A bound that still comes out non-finite is reported as
//!   [`SimError::NumericDegeneracy`] rather than compared.

use rand::RngCore;

use crate::error::{Result, SimError};
use crate::stats::RunningStatistics;
use crate::Selection;

mod etc;
mod eucbv;
mod greedy;
mod pac_ucb;
mod ucb1;
mod ucb_improved;
mod ucb_normal;
mod ucb_tuned;
mod ucb_v;

pub use etc::ExploreThenCommit;
pub use eucbv::Eucbv;
pub use greedy::EpsilonGreedy;
pub use pac_ucb::PacUcb;
pub use ucb1::Ucb1;
pub use ucb_improved::UcbImproved;
pub use ucb_normal::UcbNormal;
pub use ucb_tuned::UcbTuned;
pub use ucb_v::UcbV;

/// Common interface for arm-selection policies.
///
/// # Example
///
/// ```rust
/// use banditsim::{PolicyConfig, RunningStatistics, SelectionPolicy};
/// use rand::rngs::StdRng;
/// use rand::SeedableRng;
///
/// let mut policy = PolicyConfig::Ucb.build(2, 100).unwrap();
/// let mut stats = RunningStatistics::new(2);
/// let mut rng = StdRng::seed_from_u64(0);
///
/// let s = policy.select_arm(&stats, 1, &mut rng).unwrap();
/// stats.update(s.arm, 1.0);
/// policy.update(s.arm, 1.0, &stats).unwrap();
/// ```
pub trait SelectionPolicy {
    /// Display name, e.g. `"UCB-Tuned"`.
    fn name(&self) -> &'static str;

    /// Choose the arm for `step` (1-based).
    ///
    /// `stats` reflects every pull before this step. `rng` is the trial's
    /// stream; only randomized policies draw from it.
    fn select_arm(
        &mut self,
        stats: &RunningStatistics,
        step: u64,
        rng: &mut dyn RngCore,
    ) -> Result<Selection>;

    /// Called after every pull, once `stats` already includes `reward`.
    ///
    /// An error aborts the trial, exactly like an error from `select_arm`.
    fn update(&mut self, arm: usize, reward: f64, stats: &RunningStatistics) -> Result<()> {
        let _ = (arm, reward, stats);
        Ok(())
    }
}

/// Which family an algorithm belongs to, for group averages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AlgorithmGroup {
    VarianceAware,
    NotVarianceAware,
    Standard,
}

impl AlgorithmGroup {
    pub const ALL: [AlgorithmGroup; 3] = [
        AlgorithmGroup::VarianceAware,
        AlgorithmGroup::NotVarianceAware,
        AlgorithmGroup::Standard,
    ];

    pub fn label(self) -> &'static str {
        match self {
            AlgorithmGroup::VarianceAware => "Variance-aware UCB Variations",
            AlgorithmGroup::NotVarianceAware => "Not-variance-aware UCB Variations",
            AlgorithmGroup::Standard => "Standard Algorithms",
        }
    }
}

/// Algorithm choice plus exactly the parameters that algorithm needs.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(tag = "algorithm")
)]
pub enum PolicyConfig {
    /// Explore-then-commit.
    #[cfg_attr(feature = "serde", serde(rename = "ETC"))]
    Etc { exploration_rounds: u64 },
    /// Epsilon-greedy over incrementally updated value estimates.
    #[cfg_attr(feature = "serde", serde(rename = "Greedy"))]
    Greedy { epsilon: f64 },
    /// UCB1.
    #[cfg_attr(feature = "serde", serde(rename = "UCB"))]
    Ucb,
    #[cfg_attr(feature = "serde", serde(rename = "UCB-Normal"))]
    UcbNormal,
    #[cfg_attr(feature = "serde", serde(rename = "UCB-Tuned"))]
    UcbTuned,
    #[cfg_attr(feature = "serde", serde(rename = "UCB-V"))]
    UcbV { theta: f64, c: f64, b: f64 },
    #[cfg_attr(feature = "serde", serde(rename = "PAC-UCB"))]
    PacUcb { c: f64, b: f64, q: f64, beta: f64 },
    #[cfg_attr(feature = "serde", serde(rename = "UCB-Improved"))]
    UcbImproved { delta: f64 },
    #[cfg_attr(feature = "serde", serde(rename = "EUCBV"))]
    Eucbv { rho: f64 },
}

impl PolicyConfig {
    /// The parameter sets of the reference sweep.
    ///
    /// UCB-Normal is opt-in: the reference arms are all Bernoulli, and it is
    /// only added when a config lists it, usually next to Normal arms.
    pub fn reference_set() -> Vec<PolicyConfig> {
        vec![
            PolicyConfig::Etc {
                exploration_rounds: 1000,
            },
            PolicyConfig::Greedy { epsilon: 0.05 },
            PolicyConfig::Ucb,
            PolicyConfig::UcbTuned,
            PolicyConfig::UcbV {
                theta: 1.0,
                c: 1.0,
                b: 1.0,
            },
            PolicyConfig::PacUcb {
                c: 1.0,
                b: 1.0,
                q: 1.3,
                beta: 0.05,
            },
            PolicyConfig::UcbImproved { delta: 1.0 },
            PolicyConfig::Eucbv { rho: 0.5 },
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            PolicyConfig::Etc { .. } => "ETC",
            PolicyConfig::Greedy { .. } => "Greedy",
            PolicyConfig::Ucb => "UCB",
            PolicyConfig::UcbNormal => "UCB-Normal",
            PolicyConfig::UcbTuned => "UCB-Tuned",
            PolicyConfig::UcbV { .. } => "UCB-V",
            PolicyConfig::PacUcb { .. } => "PAC-UCB",
            PolicyConfig::UcbImproved { .. } => "UCB-Improved",
            PolicyConfig::Eucbv { .. } => "EUCBV",
        }
    }

    /// Name plus parameters; distinct parameter sets get distinct labels.
    ///
    /// Used for artifact names and seed derivation.
    pub fn label(&self) -> String {
        match self {
            PolicyConfig::Etc { exploration_rounds } => {
                format!("ETC(exploration_rounds={exploration_rounds})")
            }
            PolicyConfig::Greedy { epsilon } => format!("Greedy(epsilon={epsilon})"),
            PolicyConfig::Ucb | PolicyConfig::UcbNormal | PolicyConfig::UcbTuned => {
                self.name().to_string()
            }
            PolicyConfig::UcbV { theta, c, b } => format!("UCB-V(theta={theta},c={c},b={b})"),
            PolicyConfig::PacUcb { c, b, q, beta } => {
                format!("PAC-UCB(c={c},b={b},q={q},beta={beta})")
            }
            PolicyConfig::UcbImproved { delta } => format!("UCB-Improved(delta={delta})"),
            PolicyConfig::Eucbv { rho } => format!("EUCBV(rho={rho})"),
        }
    }

    pub fn group(&self) -> AlgorithmGroup {
        match self {
            PolicyConfig::UcbTuned | PolicyConfig::UcbV { .. } | PolicyConfig::Eucbv { .. } => {
                AlgorithmGroup::VarianceAware
            }
            PolicyConfig::PacUcb { .. } | PolicyConfig::UcbImproved { .. } => {
                AlgorithmGroup::NotVarianceAware
            }
            PolicyConfig::Etc { .. }
            | PolicyConfig::Greedy { .. }
            | PolicyConfig::Ucb
            | PolicyConfig::UcbNormal => AlgorithmGroup::Standard,
        }
    }

    /// Check the parameters without building a policy.
    pub fn validate(&self) -> Result<()> {
        let name = self.name();
        let finite = |field: &str, x: f64| -> Result<()> {
            if x.is_finite() {
                Ok(())
            } else {
                Err(SimError::invalid(format!("{name}: {field}={x} is not finite")))
            }
        };
        let positive = |field: &str, x: f64| -> Result<()> {
            finite(field, x)?;
            if x > 0.0 {
                Ok(())
            } else {
                Err(SimError::invalid(format!("{name}: {field}={x} must be > 0")))
            }
        };
        let non_negative = |field: &str, x: f64| -> Result<()> {
            finite(field, x)?;
            if x >= 0.0 {
                Ok(())
            } else {
                Err(SimError::invalid(format!("{name}: {field}={x} must be >= 0")))
            }
        };
        match *self {
            PolicyConfig::Etc { exploration_rounds } => {
                if exploration_rounds == 0 {
                    return Err(SimError::invalid("ETC: exploration_rounds must be >= 1"));
                }
            }
            PolicyConfig::Greedy { epsilon } => {
                finite("epsilon", epsilon)?;
                if !(epsilon > 0.0 && epsilon < 1.0) {
                    return Err(SimError::invalid(format!(
                        "Greedy: epsilon={epsilon} must lie in (0, 1)"
                    )));
                }
            }
            PolicyConfig::Ucb | PolicyConfig::UcbNormal | PolicyConfig::UcbTuned => {}
            PolicyConfig::UcbV { theta, c, b } => {
                positive("theta", theta)?;
                non_negative("c", c)?;
                non_negative("b", b)?;
            }
            PolicyConfig::PacUcb { c, b, q, beta } => {
                non_negative("c", c)?;
                non_negative("b", b)?;
                non_negative("q", q)?;
                positive("beta", beta)?;
            }
            PolicyConfig::UcbImproved { delta } => {
                positive("delta", delta)?;
                if delta > 1.0 {
                    return Err(SimError::invalid(format!(
                        "UCB-Improved: delta={delta} must lie in (0, 1]"
                    )));
                }
            }
            PolicyConfig::Eucbv { rho } => positive("rho", rho)?,
        }
        Ok(())
    }

    /// Build a fresh policy for a trial over `num_arms` arms and `horizon` steps.
    pub fn build(&self, num_arms: usize, horizon: u64) -> Result<Box<dyn SelectionPolicy>> {
        self.validate()?;
        if num_arms < 2 {
            return Err(SimError::invalid(format!(
                "{}: needs at least 2 arms, got {num_arms}",
                self.name()
            )));
        }
        if horizon == 0 {
            return Err(SimError::invalid(format!("{}: horizon must be >= 1", self.name())));
        }
        Ok(match *self {
            PolicyConfig::Etc { exploration_rounds } => {
                Box::new(ExploreThenCommit::new(num_arms, exploration_rounds))
            }
            PolicyConfig::Greedy { epsilon } => Box::new(EpsilonGreedy::new(num_arms, epsilon)),
            PolicyConfig::Ucb => Box::new(Ucb1::new()),
            PolicyConfig::UcbNormal => Box::new(UcbNormal::new(horizon)),
            PolicyConfig::UcbTuned => Box::new(UcbTuned::new()),
            PolicyConfig::UcbV { theta, c, b } => Box::new(UcbV::new(theta, c, b)),
            PolicyConfig::PacUcb { c, b, q, beta } => Box::new(PacUcb::new(c, b, q, beta)),
            PolicyConfig::UcbImproved { delta } => {
                Box::new(UcbImproved::new(num_arms, horizon, delta))
            }
            PolicyConfig::Eucbv { rho } => Box::new(Eucbv::new(num_arms, horizon, rho)),
        })
    }
}

/// Argmax of `score` over `candidates`, lowest index on ties.
///
/// Every score must be finite; the first that is not aborts the trial.
pub(crate) fn argmax_bound<I, F>(
    policy: &'static str,
    step: u64,
    candidates: I,
    mut score: F,
) -> Result<usize>
where
    I: IntoIterator<Item = usize>,
    F: FnMut(usize) -> Result<f64>,
{
    let mut best: Option<(usize, f64)> = None;
    for arm in candidates {
        let s = score(arm)?;
        if !s.is_finite() {
            return Err(SimError::NumericDegeneracy {
                policy,
                step,
                detail: format!("arm {arm}: bound evaluated to {s}"),
            });
        }
        match best {
            Some((_, b)) if s <= b => {}
            _ => best = Some((arm, s)),
        }
    }
    best.map(|(arm, _)| arm)
        .ok_or_else(|| SimError::NumericDegeneracy {
            policy,
            step,
            detail: "no candidate arms".to_string(),
        })
}

/// `(mean, variance, count)` for an arm that has been pulled at least once.
///
/// Callers run the untried-arm guard first; reaching this with a zero count
/// is a defect and is reported as such.
pub(crate) fn pulled_stats(
    policy: &'static str,
    step: u64,
    stats: &RunningStatistics,
    arm: usize,
) -> Result<(f64, f64, f64)> {
    let s = stats.arm(arm);
    match (s.mean(), s.variance()) {
        (Some(mean), Some(var)) => Ok((mean, var, s.count as f64)),
        _ => Err(SimError::NumericDegeneracy {
            policy,
            step,
            detail: format!("arm {arm} has no pulls"),
        }),
    }
}
