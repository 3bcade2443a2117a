//! UCB1 (Auer, Cesa-Bianchi & Fischer 2002).

use rand::RngCore;

use super::{argmax_bound, pulled_stats, SelectionPolicy};
use crate::error::Result;
use crate::stats::RunningStatistics;
use crate::{Selection, SelectionReason};

/// `mean + sqrt(2 ln N / n)`, with `N` the total number of pulls so far.
#[derive(Debug, Clone, Default)]
pub struct Ucb1;

impl Ucb1 {
    pub fn new() -> Self {
        Self
    }
}

impl SelectionPolicy for Ucb1 {
    fn name(&self) -> &'static str {
        "UCB"
    }

    fn select_arm(
        &mut self,
        stats: &RunningStatistics,
        step: u64,
        _rng: &mut dyn RngCore,
    ) -> Result<Selection> {
        if let Some(arm) = stats.first_untried() {
            return Ok(Selection::force_play(arm));
        }
        let ln_total = (stats.total_pulls() as f64).ln();
        let arm = argmax_bound("UCB", step, 0..stats.num_arms(), |a| {
            let (mean, _, n) = pulled_stats("UCB", step, stats, a)?;
            Ok(mean + (2.0 * ln_total / n).sqrt())
        })?;
        Ok(Selection::new(arm, SelectionReason::ConfidenceBound))
    }
}
