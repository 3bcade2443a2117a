//! Explore-then-commit.

use rand::RngCore;

use super::SelectionPolicy;
use crate::error::{Result, SimError};
use crate::stats::RunningStatistics;
use crate::utils::first_max;
use crate::{Selection, SelectionReason};

/// Round-robin for `exploration_rounds * K` steps, then play the empirical
/// best arm of that phase forever.
///
/// The committed arm is fixed at the first exploitation step and never
/// revisited, even though later pulls keep updating its statistics.
#[derive(Debug, Clone)]
pub struct ExploreThenCommit {
    num_arms: usize,
    exploration_rounds: u64,
    committed: Option<usize>,
}

impl ExploreThenCommit {
    pub fn new(num_arms: usize, exploration_rounds: u64) -> Self {
        Self {
            num_arms,
            exploration_rounds,
            committed: None,
        }
    }

    /// Last step of the exploration phase.
    pub fn exploration_steps(&self) -> u64 {
        self.exploration_rounds.saturating_mul(self.num_arms as u64)
    }

    pub fn committed_arm(&self) -> Option<usize> {
        self.committed
    }
}

impl SelectionPolicy for ExploreThenCommit {
    fn name(&self) -> &'static str {
        "ETC"
    }

    fn select_arm(
        &mut self,
        stats: &RunningStatistics,
        step: u64,
        _rng: &mut dyn RngCore,
    ) -> Result<Selection> {
        if step <= self.exploration_steps() {
            let arm = ((step - 1) % self.num_arms as u64) as usize;
            return Ok(Selection::new(arm, SelectionReason::RoundRobin));
        }
        if let Some(arm) = self.committed {
            return Ok(Selection::new(arm, SelectionReason::Committed));
        }
        // Every arm was pulled exploration_rounds >= 1 times, so all means exist.
        let means: Vec<f64> = (0..self.num_arms)
            .map(|a| stats.mean_of(a).unwrap_or(f64::NAN))
            .collect();
        let arm = first_max(&means).ok_or_else(|| SimError::NumericDegeneracy {
            policy: "ETC",
            step,
            detail: format!("cannot commit: empirical means {means:?}"),
        })?;
        tracing::debug!(step, arm, "ETC committed");
        self.committed = Some(arm);
        Ok(Selection::new(arm, SelectionReason::Committed))
    }
}
