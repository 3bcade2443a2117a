//! UCB-V (Audibert, Munos & Szepesvari 2009).

use rand::RngCore;

use super::{argmax_bound, pulled_stats, SelectionPolicy};
use crate::error::Result;
use crate::stats::RunningStatistics;
use crate::{Selection, SelectionReason};

/// Empirical-Bernstein bound with exploration function `E = theta * ln t`:
/// `mean + sqrt(2 * variance * E / n) + 3 * c * b * E / n`.
///
/// `b` bounds the reward range and `c` scales the range term.
#[derive(Debug, Clone)]
pub struct UcbV {
    theta: f64,
    c: f64,
    b: f64,
}

impl UcbV {
    pub fn new(theta: f64, c: f64, b: f64) -> Self {
        Self { theta, c, b }
    }
}

impl SelectionPolicy for UcbV {
    fn name(&self) -> &'static str {
        "UCB-V"
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
        let e = self.theta * (step as f64).ln();
        let arm = argmax_bound("UCB-V", step, 0..stats.num_arms(), |a| {
            let (mean, var, n) = pulled_stats("UCB-V", step, stats, a)?;
            Ok(mean + (2.0 * var * e / n).sqrt() + self.c * 3.0 * self.b * e / n)
        })?;
        Ok(Selection::new(arm, SelectionReason::ConfidenceBound))
    }
}
