//! Independent repetitions of one (policy, arm configuration) pair.
//!
//! Every iteration builds a fresh policy, fresh statistics, and its own RNG
//! seeded from `(seed, label, iteration)`, where the label names both the
//! policy parameters and the arm configuration. Iterations run on the rayon
//! pool; since no state is shared and seeds do not depend on scheduling,
//! the output is identical for any thread count.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;

use crate::arm::{ArmConfig, ArmModel};
use crate::error::{Result, SimError};
use crate::policy::PolicyConfig;
use crate::stable_hash::trial_seed;
use crate::trial::{CheckpointSink, TrialRunner};
use crate::utils::round2;

/// Iterations per experiment unless configured otherwise.
pub const DEFAULT_ITERATIONS: u32 = 100;

/// Cooperative cancellation flag, shared between whoever stops the run and the
/// workers. Cloning shares the flag.
#[derive(Debug, Clone, Default)]
pub struct Interrupt(Arc<AtomicBool>);

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// `Err(Interrupted)` once triggered.
    pub fn check(&self) -> Result<()> {
        if self.is_set() {
            Err(SimError::Interrupted)
        } else {
            Ok(())
        }
    }
}

/// Totals of one iteration at one checkpoint.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CheckpointRecord {
    pub timestep: u64,
    pub iteration: u32,
    pub total_reward: f64,
    pub suboptimal_arm_count: u64,
    /// Rounded to two decimals.
    pub total_regret: f64,
    pub zeros_count: u64,
    pub ones_count: u64,
}

/// One (policy, arm configuration) pair, repeated `iterations` times.
#[derive(Debug, Clone)]
pub struct Experiment {
    policy: PolicyConfig,
    arms: ArmModel,
    checkpoints: Vec<u64>,
    iterations: u32,
    seed: u64,
}

impl Experiment {
    /// Validates the policy, the arms and the checkpoints.
    ///
    /// Checkpoints must be non-empty and each `>= 1`; they are sorted and
    /// deduplicated, and the largest one is the trial horizon.
    pub fn new(policy: PolicyConfig, arms: ArmConfig, checkpoints: &[u64]) -> Result<Self> {
        policy.validate()?;
        let arms = ArmModel::new(arms)?;
        let checkpoints = normalize_checkpoints(checkpoints)?;
        Ok(Self {
            policy,
            arms,
            checkpoints,
            iterations: DEFAULT_ITERATIONS,
            seed: 0,
        })
    }

    pub fn with_iterations(mut self, iterations: u32) -> Result<Self> {
        if iterations == 0 {
            return Err(SimError::invalid("iterations must be >= 1"));
        }
        self.iterations = iterations;
        Ok(self)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn policy(&self) -> &PolicyConfig {
        &self.policy
    }

    pub fn arms(&self) -> &ArmModel {
        &self.arms
    }

    pub fn checkpoints(&self) -> &[u64] {
        &self.checkpoints
    }

    pub fn horizon(&self) -> u64 {
        // Non-empty by construction.
        self.checkpoints.last().copied().unwrap_or(1)
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Seed-derivation label: policy label plus arm configuration name.
    pub fn label(&self) -> String {
        format!("{}/{}", self.policy.label(), self.arms.config().name())
    }

    /// Run one iteration (1-based) and return its checkpoint rows.
    pub fn run_iteration(&self, iteration: u32) -> Result<Vec<CheckpointRecord>> {
        let label = self.label();
        let mut rng = StdRng::seed_from_u64(trial_seed(self.seed, &label, iteration));
        let mut policy = self.policy.build(self.arms.num_arms(), self.horizon())?;
        let runner = TrialRunner::new(&self.arms, self.horizon())?;
        let mut sink = CheckpointSink::new(&self.checkpoints);
        let last = runner.run(policy.as_mut(), &mut rng, &mut sink)?;
        tracing::debug!(
            label = %label,
            iteration,
            total_reward = last.total_reward,
            total_regret = last.total_regret,
            "trial finished"
        );
        Ok(sink
            .into_records()
            .into_iter()
            .map(|(timestep, r)| CheckpointRecord {
                timestep,
                iteration,
                total_reward: r.total_reward,
                suboptimal_arm_count: r.suboptimal,
                total_regret: round2(r.total_regret),
                zeros_count: r.zeros,
                ones_count: r.ones,
            })
            .collect())
    }

    /// Run every iteration in parallel.
    ///
    /// Rows are ordered by iteration, then by timestep. The interrupt flag is
    /// checked before each iteration starts; once set, the whole experiment
    /// fails with [`SimError::Interrupted`].
    pub fn run(&self, interrupt: &Interrupt) -> Result<Vec<CheckpointRecord>> {
        interrupt.check()?;
        let per_iteration: Vec<Vec<CheckpointRecord>> = (1..=self.iterations)
            .into_par_iter()
            .map(|it| {
                interrupt.check()?;
                self.run_iteration(it)
            })
            .collect::<Result<_>>()?;
        Ok(per_iteration.into_iter().flatten().collect())
    }
}

fn normalize_checkpoints(checkpoints: &[u64]) -> Result<Vec<u64>> {
    if checkpoints.is_empty() {
        return Err(SimError::invalid("checkpoint list is empty"));
    }
    if checkpoints.contains(&0) {
        return Err(SimError::invalid("checkpoints must be >= 1"));
    }
    let mut cps = checkpoints.to_vec();
    cps.sort_unstable();
    cps.dedup();
    Ok(cps)
}
