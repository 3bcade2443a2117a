//! Epsilon-greedy.

use rand::{Rng, RngCore};

use super::SelectionPolicy;
use crate::error::{Result, SimError};
use crate::stats::RunningStatistics;
use crate::utils::first_max;
use crate::{Selection, SelectionReason};

/// With probability `epsilon` play a uniformly random arm, otherwise the arm
/// with the highest value estimate `Q`.
///
/// `Q` is maintained incrementally (`Q += (r - Q) / n`) rather than read off
/// the running statistics. Untried arms are played first.
#[derive(Debug, Clone)]
pub struct EpsilonGreedy {
    epsilon: f64,
    q: Vec<f64>,
    n: Vec<u64>,
}

impl EpsilonGreedy {
    pub fn new(num_arms: usize, epsilon: f64) -> Self {
        Self {
            epsilon,
            q: vec![0.0; num_arms],
            n: vec![0; num_arms],
        }
    }

    /// Current value estimates.
    pub fn values(&self) -> &[f64] {
        &self.q
    }
}

impl SelectionPolicy for EpsilonGreedy {
    fn name(&self) -> &'static str {
        "Greedy"
    }

    fn select_arm(
        &mut self,
        stats: &RunningStatistics,
        step: u64,
        rng: &mut dyn RngCore,
    ) -> Result<Selection> {
        if let Some(arm) = stats.first_untried() {
            return Ok(Selection::force_play(arm));
        }
        if rng.random::<f64>() < self.epsilon {
            let arm = rng.random_range(0..self.q.len());
            return Ok(Selection::new(arm, SelectionReason::RandomExplore));
        }
        let arm = first_max(&self.q).ok_or_else(|| SimError::NumericDegeneracy {
            policy: "Greedy",
            step,
            detail: format!("value estimates {:?}", self.q),
        })?;
        Ok(Selection::new(arm, SelectionReason::Greedy))
    }

    fn update(&mut self, arm: usize, reward: f64, _stats: &RunningStatistics) -> Result<()> {
        self.n[arm] += 1;
        self.q[arm] += (reward - self.q[arm]) / self.n[arm] as f64;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn incremental_q_equals_sample_mean() {
        let mut p = EpsilonGreedy::new(2, 0.1);
        let mut stats = RunningStatistics::new(2);
        for r in [1.0, 0.0, 1.0, 1.0] {
            stats.update(0, r);
            p.update(0, r, &stats).unwrap();
        }
        assert!((p.values()[0] - 0.75).abs() < 1e-12);
        assert_eq!(p.values()[1], 0.0);
    }

    #[test]
    fn exploration_rate_is_close_to_epsilon() {
        let mut p = EpsilonGreedy::new(2, 0.2);
        let mut stats = RunningStatistics::new(2);
        let mut rng = StdRng::seed_from_u64(42);
        stats.update(0, 1.0);
        p.update(0, 1.0, &stats).unwrap();
        stats.update(1, 0.0);
        p.update(1, 0.0, &stats).unwrap();

        let n = 10_000;
        let mut random = 0;
        let mut on_worse = 0;
        for step in 3..3 + n {
            let s = p.select_arm(&stats, step, &mut rng).unwrap();
            match s.reason {
                SelectionReason::RandomExplore => random += 1,
                SelectionReason::Greedy => assert_eq!(s.arm, 0),
                other => panic!("unexpected reason {other:?}"),
            }
            if s.arm == 1 {
                on_worse += 1;
            }
        }
        let rate = f64::from(random) / n as f64;
        assert!((rate - 0.2).abs() < 0.02, "rate={rate}");
        // Half of the random picks land on the worse arm.
        let worse = f64::from(on_worse) / n as f64;
        assert!((worse - 0.1).abs() < 0.02, "worse={worse}");
    }
}
