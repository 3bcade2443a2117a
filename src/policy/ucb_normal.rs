//! UCB-Normal (Auer et al. 2002), for Normally distributed rewards.

use rand::RngCore;

use super::{argmax_bound, pulled_stats, SelectionPolicy};
use crate::error::Result;
use crate::stats::RunningStatistics;
use crate::{Selection, SelectionReason};

/// Play the least-pulled arm until every arm has `ceil(8 ln T)` pulls, then
/// `mean + sqrt(16 * variance * ln(t - 1) / n)`.
///
/// The variance term needs at least two samples, so the forced quota is
/// never below 2 even when `8 ln T` is.
#[derive(Debug, Clone)]
pub struct UcbNormal {
    min_pulls: u64,
}

impl UcbNormal {
    pub fn new(horizon: u64) -> Self {
        let quota = (8.0 * (horizon.max(1) as f64).ln()).ceil() as u64;
        Self {
            min_pulls: quota.max(2),
        }
    }

    /// Forced pulls per arm before the bound is used.
    pub fn min_pulls(&self) -> u64 {
        self.min_pulls
    }
}

impl SelectionPolicy for UcbNormal {
    fn name(&self) -> &'static str {
        "UCB-Normal"
    }

    fn select_arm(
        &mut self,
        stats: &RunningStatistics,
        step: u64,
        _rng: &mut dyn RngCore,
    ) -> Result<Selection> {
        if let Some(arm) = stats.least_pulled() {
            if stats.count(arm) < self.min_pulls {
                return Ok(Selection::force_play(arm));
            }
        }
        let ln_t = ((step.saturating_sub(1)) as f64).ln();
        let arm = argmax_bound("UCB-Normal", step, 0..stats.num_arms(), |a| {
            let (mean, var, n) = pulled_stats("UCB-Normal", step, stats, a)?;
            Ok(mean + (16.0 * var * ln_t / n).sqrt())
        })?;
        Ok(Selection::new(arm, SelectionReason::ConfidenceBound))
    }
}
