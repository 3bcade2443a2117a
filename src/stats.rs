//! Per-arm sufficient statistics for one trial.

/// Sufficient statistics of a single arm.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ArmStats {
    /// Number of pulls.
    pub count: u64,
    /// Sum of observed rewards.
    pub reward_sum: f64,
    /// Sum of squared observed rewards.
    pub reward_sq_sum: f64,
}

impl ArmStats {
    /// Empirical mean, or `None` before the first pull.
    pub fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.reward_sum / self.count as f64)
        }
    }

    /// Empirical (population) variance `E[x^2] - E[x]^2`, clamped at zero.
    ///
    /// `None` before the first pull.
    pub fn variance(&self) -> Option<f64> {
        let mean = self.mean()?;
        let v = self.reward_sq_sum / self.count as f64 - mean * mean;
        Some(v.max(0.0))
    }
}

/// Statistics for every arm of a trial, indexed by arm.
#[derive(Debug, Clone, PartialEq)]
pub struct RunningStatistics {
    arms: Vec<ArmStats>,
    total_pulls: u64,
}

impl RunningStatistics {
    pub fn new(num_arms: usize) -> Self {
        Self {
            arms: vec![ArmStats::default(); num_arms],
            total_pulls: 0,
        }
    }

    pub fn num_arms(&self) -> usize {
        self.arms.len()
    }

    /// Record one reward for `arm`. No other arm changes.
    pub fn update(&mut self, arm: usize, reward: f64) {
        let s = &mut self.arms[arm];
        s.count += 1;
        s.reward_sum += reward;
        s.reward_sq_sum += reward * reward;
        self.total_pulls += 1;
    }

    pub fn arm(&self, arm: usize) -> &ArmStats {
        &self.arms[arm]
    }

    pub fn arms(&self) -> &[ArmStats] {
        &self.arms
    }

    pub fn count(&self, arm: usize) -> u64 {
        self.arms[arm].count
    }

    pub fn mean_of(&self, arm: usize) -> Option<f64> {
        self.arms[arm].mean()
    }

    pub fn variance_of(&self, arm: usize) -> Option<f64> {
        self.arms[arm].variance()
    }

    /// Pulls across all arms.
    pub fn total_pulls(&self) -> u64 {
        self.total_pulls
    }

    /// Lowest-index arm that has never been pulled.
    pub fn first_untried(&self) -> Option<usize> {
        self.arms.iter().position(|s| s.count == 0)
    }

    /// Lowest-index arm among those with the fewest pulls.
    pub fn least_pulled(&self) -> Option<usize> {
        self.least_pulled_among(0..self.arms.len())
    }

    /// Like [`least_pulled`](Self::least_pulled), restricted to `arms`.
    pub fn least_pulled_among(&self, arms: impl IntoIterator<Item = usize>) -> Option<usize> {
        let mut best: Option<(usize, u64)> = None;
        for a in arms {
            let c = self.arms[a].count;
            match best {
                Some((b, bc)) if c > bc || (c == bc && a > b) => {}
                _ => best = Some((a, c)),
            }
        }
        best.map(|(a, _)| a)
    }
}
