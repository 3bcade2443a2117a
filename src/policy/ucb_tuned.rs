//! UCB-Tuned.

use rand::RngCore;

use super::{argmax_bound, pulled_stats, SelectionPolicy};
use crate::error::Result;
use crate::stats::RunningStatistics;
use crate::{Selection, SelectionReason};

/// `mean + sqrt(ln t / n * min(1/4, V))` with
/// `V = variance + sqrt(2 ln t / n)`.
///
/// `1/4` is the largest variance a reward in `[0, 1]` can have.
#[derive(Debug, Clone, Default)]
pub struct UcbTuned;

impl UcbTuned {
    pub fn new() -> Self {
        Self
    }
}

impl SelectionPolicy for UcbTuned {
    fn name(&self) -> &'static str {
        "UCB-Tuned"
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
        let ln_t = (step as f64).ln();
        let arm = argmax_bound("UCB-Tuned", step, 0..stats.num_arms(), |a| {
            let (mean, var, n) = pulled_stats("UCB-Tuned", step, stats, a)?;
            let v = var + (2.0 * ln_t / n).sqrt();
            Ok(mean + (ln_t / n * v.min(0.25)).sqrt())
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
    fn variance_cap_bounds_the_bonus() {
        // With many pulls both arms hit the 1/4 cap; the bonus depends only
        // on n, so the better mean wins at equal counts.
        let mut stats = RunningStatistics::new(2);
        for i in 0..20 {
            stats.update(0, if i % 2 == 0 { 1.0 } else { 0.0 });
            stats.update(1, if i % 4 == 0 { 1.0 } else { 0.0 });
        }
        let mut rng = StdRng::seed_from_u64(0);
        let s = UcbTuned::new().select_arm(&stats, 41, &mut rng).unwrap();
        assert_eq!(s.arm, 0);
        assert_eq!(s.reason, SelectionReason::ConfidenceBound);
    }

    #[test]
    fn under_sampled_arm_gets_explored() {
        let mut stats = RunningStatistics::new(2);
        for _ in 0..50 {
            stats.update(0, 0.7);
        }
        stats.update(1, 0.6);
        let mut rng = StdRng::seed_from_u64(0);
        let s = UcbTuned::new().select_arm(&stats, 52, &mut rng).unwrap();
        assert_eq!(s.arm, 1);
    }
}
