//! One trial: a single policy playing one bandit problem for `horizon` steps.
//!
//! Each step runs `select -> bounds check -> sample -> statistics update ->
//! policy update -> counters -> sink`. Counters use the true arm means, so
//! regret is the expected (pseudo-)regret, not the realized one.

use rand::RngCore;

use crate::arm::{ArmModel, RewardBucket};
use crate::error::{Result, SimError};
use crate::policy::SelectionPolicy;
use crate::stats::RunningStatistics;

/// Running totals after a step.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimestepRecord {
    pub total_reward: f64,
    /// Sum over pulls of `optimal_mean - pulled_mean`.
    pub total_regret: f64,
    /// Pulls of any arm other than the optimal one.
    pub suboptimal: u64,
    pub zeros: u64,
    pub ones: u64,
}

/// Receives the running totals after every step.
pub trait StepSink {
    fn record(&mut self, step: u64, record: &TimestepRecord);
}

/// Dense per-step series, one entry per step (index `step - 1`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrialSeries {
    pub total_reward: Vec<f64>,
    pub total_regret: Vec<f64>,
    pub suboptimal: Vec<u64>,
    pub zeros: Vec<u64>,
    pub ones: Vec<u64>,
}

impl TrialSeries {
    pub fn with_capacity(horizon: u64) -> Self {
        let n = usize::try_from(horizon).unwrap_or(0);
        Self {
            total_reward: Vec::with_capacity(n),
            total_regret: Vec::with_capacity(n),
            suboptimal: Vec::with_capacity(n),
            zeros: Vec::with_capacity(n),
            ones: Vec::with_capacity(n),
        }
    }

    pub fn len(&self) -> usize {
        self.total_reward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total_reward.is_empty()
    }

    /// Totals after `step` (1-based).
    pub fn at(&self, step: u64) -> Option<TimestepRecord> {
        let i = usize::try_from(step.checked_sub(1)?).ok()?;
        Some(TimestepRecord {
            total_reward: *self.total_reward.get(i)?,
            total_regret: self.total_regret[i],
            suboptimal: self.suboptimal[i],
            zeros: self.zeros[i],
            ones: self.ones[i],
        })
    }
}

impl StepSink for TrialSeries {
    fn record(&mut self, _step: u64, r: &TimestepRecord) {
        self.total_reward.push(r.total_reward);
        self.total_regret.push(r.total_regret);
        self.suboptimal.push(r.suboptimal);
        self.zeros.push(r.zeros);
        self.ones.push(r.ones);
    }
}

/// Keeps only the records at requested steps.
///
/// Checkpoints are sorted and deduplicated on construction; the output is in
/// ascending step order.
#[derive(Debug, Clone)]
pub struct CheckpointSink {
    checkpoints: Vec<u64>,
    next: usize,
    hits: Vec<(u64, TimestepRecord)>,
}

impl CheckpointSink {
    pub fn new(checkpoints: &[u64]) -> Self {
        let mut cps = checkpoints.to_vec();
        cps.sort_unstable();
        cps.dedup();
        Self {
            hits: Vec::with_capacity(cps.len()),
            checkpoints: cps,
            next: 0,
        }
    }

    pub fn into_records(self) -> Vec<(u64, TimestepRecord)> {
        self.hits
    }
}

impl StepSink for CheckpointSink {
    fn record(&mut self, step: u64, record: &TimestepRecord) {
        if self.checkpoints.get(self.next) == Some(&step) {
            self.hits.push((step, *record));
            self.next += 1;
        }
    }
}

/// Runs trials of one bandit problem.
#[derive(Debug, Clone, Copy)]
pub struct TrialRunner<'a> {
    arms: &'a ArmModel,
    horizon: u64,
}

impl<'a> TrialRunner<'a> {
    pub fn new(arms: &'a ArmModel, horizon: u64) -> Result<Self> {
        if horizon == 0 {
            return Err(SimError::invalid("horizon must be >= 1"));
        }
        Ok(Self { arms, horizon })
    }

    pub fn horizon(&self) -> u64 {
        self.horizon
    }

    /// Play `policy` for the full horizon and return the final totals.
    ///
    /// `policy` must be fresh: it is driven from step 1 against empty
    /// statistics. Any policy error aborts the trial.
    pub fn run(
        &self,
        policy: &mut dyn SelectionPolicy,
        rng: &mut dyn RngCore,
        sink: &mut dyn StepSink,
    ) -> Result<TimestepRecord> {
        let k = self.arms.num_arms();
        let optimal = self.arms.optimal_arm();
        let mut stats = RunningStatistics::new(k);
        let mut totals = TimestepRecord::default();

        for step in 1..=self.horizon {
            let selection = policy.select_arm(&stats, step, rng)?;
            let arm = selection.arm;
            if arm >= k {
                return Err(SimError::ArmOutOfRange {
                    policy: policy.name(),
                    step,
                    arm,
                    arms: k,
                });
            }
            let reward = self.arms.sample(arm, rng);
            stats.update(arm, reward);
            policy.update(arm, reward, &stats)?;

            totals.total_reward += reward;
            totals.total_regret += self.arms.gap(arm);
            if arm != optimal {
                totals.suboptimal += 1;
            }
            match self.arms.classify(arm, reward) {
                RewardBucket::Zero => totals.zeros += 1,
                RewardBucket::One => totals.ones += 1,
            }
            sink.record(step, &totals);
        }
        Ok(totals)
    }

    /// Convenience wrapper collecting the dense series.
    pub fn run_series(
        &self,
        policy: &mut dyn SelectionPolicy,
        rng: &mut dyn RngCore,
    ) -> Result<TrialSeries> {
        let mut series = TrialSeries::with_capacity(self.horizon);
        self.run(policy, rng, &mut series)?;
        Ok(series)
    }
}
