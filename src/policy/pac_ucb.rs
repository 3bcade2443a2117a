//! PAC-UCB.

use rand::RngCore;

use super::{argmax_bound, pulled_stats, SelectionPolicy};
use crate::error::Result;
use crate::stats::RunningStatistics;
use crate::{Selection, SelectionReason};

/// Same bound shape as UCB-V, but the exploration function depends on the
/// arm's own count rather than on time:
/// `E = max(ln(K * n^q / beta), 2)`.
#[derive(Debug, Clone)]
pub struct PacUcb {
    c: f64,
    b: f64,
    q: f64,
    beta: f64,
}

impl PacUcb {
    pub fn new(c: f64, b: f64, q: f64, beta: f64) -> Self {
        Self { c, b, q, beta }
    }

    /// Exploration function for an arm with `n` pulls out of `num_arms`.
    pub fn exploration(&self, num_arms: usize, n: f64) -> f64 {
        (num_arms as f64 * n.powf(self.q) / self.beta).ln().max(2.0)
    }
}

impl SelectionPolicy for PacUcb {
    fn name(&self) -> &'static str {
        "PAC-UCB"
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
        let k = stats.num_arms();
        let arm = argmax_bound("PAC-UCB", step, 0..k, |a| {
            let (mean, var, n) = pulled_stats("PAC-UCB", step, stats, a)?;
            let e = self.exploration(k, n);
            Ok(mean + (2.0 * var * e / n).sqrt() + self.c * (3.0 * self.b * e / n))
        })?;
        Ok(Selection::new(arm, SelectionReason::ConfidenceBound))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn exploration_is_floored_at_two() {
        let p = PacUcb::new(1.0, 1.0, 1.3, 0.05);
        // ln(2 * 1 / 0.05) = ln 40 ~ 3.69
        assert!((p.exploration(2, 1.0) - 40f64.ln()).abs() < 1e-12);
        // A huge beta drives the log below the floor.
        let loose = PacUcb::new(1.0, 1.0, 1.3, 1e6);
        assert_eq!(loose.exploration(2, 1.0), 2.0);
    }

    #[test]
    fn selects_by_bound_after_force_play() {
        let mut p = PacUcb::new(1.0, 1.0, 1.3, 0.05);
        let mut stats = RunningStatistics::new(2);
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(p.select_arm(&stats, 1, &mut rng).unwrap().arm, 0);
        stats.update(0, 1.0);
        assert_eq!(p.select_arm(&stats, 2, &mut rng).unwrap().arm, 1);
        stats.update(1, 1.0);
        for _ in 0..100 {
            stats.update(0, 1.0);
        }
        // Arm 1 has one pull and the same mean, so its bound is larger.
        let s = p.select_arm(&stats, 103, &mut rng).unwrap();
        assert_eq!(s.arm, 1);
        assert_eq!(s.reason, SelectionReason::ConfidenceBound);
    }
}
