//! `banditsim`: seedable Monte Carlo evaluation of multi-armed bandit policies.
//!
//! You describe a bandit problem (true arm means, Bernoulli or Normal
//! rewards), pick a policy and a list of checkpoints, and `banditsim` plays
//! the policy for many independent trials, recording at each checkpoint:
//!
//! - `total_reward`: sum of observed rewards.
//! - `total_regret`: sum over pulls of `optimal_mean - pulled_mean` (expected
//!   regret, computed from the true means).
//! - `suboptimal_arm_count`: pulls of any arm other than the optimal one.
//! - `zeros_count` / `ones_count`: how many rewards fell in each bucket.
//!
//! Across trials it reports per-checkpoint means and the Value-at-Risk of
//! regret.
//!
//! **Policies** (one [`SelectionPolicy`] each, built from a [`PolicyConfig`]):
//! - Standard: explore-then-commit ([`ExploreThenCommit`]), epsilon-greedy
//!   ([`EpsilonGreedy`]), UCB1 ([`Ucb1`]), UCB-Normal ([`UcbNormal`]).
//! - Variance-aware: [`UcbTuned`], [`UcbV`], [`Eucbv`].
//! - Not variance-aware: [`PacUcb`], [`UcbImproved`].
//!
//! **Goals:**
//! - **Deterministic**: same config + seed → bit-identical output, for any
//!   number of worker threads. Each trial owns an RNG seeded from a stable
//!   hash of `(seed, policy label, arm configuration, iteration)`.
//! - **No silent `NaN`**: any arm with zero pulls is played before a bound is
//!   evaluated, and a bound that still comes out non-finite aborts the trial
//!   with [`SimError::NumericDegeneracy`].
//! - **Small K**: bandits of 2–10 arms; the policies scan arms linearly.
//!
//! **Non-goals:**
//! - No reward models besides Bernoulli and Normal.
//! - No plotting or dashboards; artifacts are plain JSON for other tools.
//!
//! # Example
//!
//! ```rust
//! use banditsim::{aggregate, value_at_risk, ArmConfig, Experiment, Interrupt, PolicyConfig};
//!
//! let exp = Experiment::new(
//!     PolicyConfig::UcbTuned,
//!     ArmConfig::bernoulli(vec![0.9, 0.8]),
//!     &[100, 1_000],
//! )
//! .unwrap()
//! .with_iterations(8)
//! .unwrap()
//! .with_seed(42);
//!
//! let rows = exp.run(&Interrupt::new()).unwrap();
//! assert_eq!(rows.len(), 8 * 2);
//!
//! let means = aggregate(&rows);
//! assert_eq!(means[1].timestep, 1_000);
//! assert!(means[1].total_regret <= 100.0);
//!
//! let var = value_at_risk(&rows, 0.05).unwrap();
//! assert!(var[1].value_at_risk >= 0.0);
//! ```
//!
//! # Layers
//!
//! - [`ArmModel`] samples rewards; [`RunningStatistics`] holds per-arm sums.
//! - [`TrialRunner`] drives one policy for one trial and feeds a [`StepSink`].
//! - [`Experiment`] repeats trials in parallel and keeps checkpoint rows.
//! - [`aggregate`] / [`value_at_risk`] / [`group_average`] summarize rows.
//! - (feature `serde`) [`Sweep`] runs algorithms × arm configurations from a
//!   [`SweepConfig`] and writes one JSON artifact per pair.
//!
//! # Features
//!
//! - `serde`: serialization for configs and results, JSON loading, [`Sweep`].
//! - `cli` (default): the `banditsim` binary.

#![forbid(unsafe_code)]

mod error;
pub use error::*;

mod decision;
pub use decision::*;

mod utils;
pub use utils::*;

mod stable_hash;
pub use stable_hash::*;

mod arm;
pub use arm::*;

mod stats;
pub use stats::*;

mod policy;
pub use policy::*;

mod trial;
pub use trial::*;

mod experiment;
pub use experiment::*;

mod aggregate;
pub use aggregate::*;

mod combos;
pub use combos::{expand, from_individual_means, permutations, reference_bases};

mod config;
pub use config::*;

#[cfg(feature = "serde")]
mod sweep;
#[cfg(feature = "serde")]
pub use sweep::*;
