//! EUCBV (Mukherjee et al. 2018): UCB with variance estimates and arm
//! elimination.

use rand::RngCore;

use super::{argmax_bound, pulled_stats, SelectionPolicy};
use crate::error::{Result, SimError};
use crate::stats::RunningStatistics;
use crate::utils::ln_floor0;
use crate::{Selection, SelectionReason};

/// Efficient UCB-Variance.
///
/// Each arm is played once, then the policy picks the active arm with the
/// largest `mean + w`, where
///
/// ```text
/// w = sqrt(rho * (variance + 2) * ln(psi * T * delta) / (4 * n)),   psi = T / K^2
/// ```
///
/// After every pull the active set drops each arm whose `mean + w` is below
/// the best `mean - w` in the set. Phases shrink `delta` by half whenever
/// the step count passes `N0`; the next `N0` leaves room for `n0` more pulls
/// per surviving arm.
#[derive(Debug, Clone)]
pub struct Eucbv {
    num_arms: usize,
    horizon: f64,
    psi: f64,
    rho: f64,
    delta: f64,
    active: Vec<usize>,
    phase: u64,
    max_phase: i64,
    n0: u64,
    phase_end: u64,
}

impl Eucbv {
    pub fn new(num_arms: usize, horizon: u64, rho: f64) -> Self {
        let t = horizon as f64;
        let psi = t / (num_arms * num_arms) as f64;
        let max_phase = (0.5 * (t / std::f64::consts::E).log2()).floor() as i64;
        let mut p = Self {
            num_arms,
            horizon: t,
            psi,
            rho,
            delta: 1.0,
            active: (0..num_arms).collect(),
            phase: 0,
            max_phase,
            n0: 0,
            phase_end: 0,
        };
        p.n0 = p.pulls_per_phase();
        p.phase_end = num_arms as u64 * p.n0;
        p
    }

    pub fn active_arms(&self) -> &[usize] {
        &self.active
    }

    pub fn delta(&self) -> f64 {
        self.delta
    }

    /// Step count (zero-based) at which the current phase ends.
    pub fn phase_end(&self) -> u64 {
        self.phase_end
    }

    fn pulls_per_phase(&self) -> u64 {
        let x = ln_floor0(self.psi * self.horizon * self.delta * self.delta) / (2.0 * self.delta);
        x.ceil() as u64
    }

    fn width(&self, var: f64, n: f64) -> f64 {
        let log = ln_floor0(self.psi * self.horizon * self.delta);
        (self.rho * (var + 2.0) * log / (4.0 * n)).sqrt()
    }

    fn eliminate(&mut self, stats: &RunningStatistics, step: u64) -> Result<()> {
        let mut bounds = Vec::with_capacity(self.active.len());
        for &a in &self.active {
            let (mean, var, n) = pulled_stats("EUCBV", step, stats, a)?;
            bounds.push((a, mean, self.width(var, n)));
        }
        let best_lcb = bounds
            .iter()
            .map(|&(_, mean, w)| mean - w)
            .fold(f64::NEG_INFINITY, f64::max);
        if !best_lcb.is_finite() {
            return Err(SimError::NumericDegeneracy {
                policy: "EUCBV",
                step,
                detail: format!("best lower bound {best_lcb}"),
            });
        }
        let before = self.active.len();
        self.active = bounds
            .into_iter()
            .filter(|&(_, mean, w)| mean + w >= best_lcb)
            .map(|(a, _, _)| a)
            .collect();
        if self.active.len() < before {
            tracing::debug!(step, active = ?self.active, "EUCBV eliminated arms");
        }
        Ok(())
    }
}

impl SelectionPolicy for Eucbv {
    fn name(&self) -> &'static str {
        "EUCBV"
    }

    fn select_arm(
        &mut self,
        stats: &RunningStatistics,
        step: u64,
        _rng: &mut dyn RngCore,
    ) -> Result<Selection> {
        if step <= self.num_arms as u64 {
            return Ok(Selection::force_play((step - 1) as usize));
        }
        if let [only] = self.active[..] {
            return Ok(Selection::new(only, SelectionReason::Exploit));
        }
        if let Some(&arm) = self.active.iter().find(|&&a| stats.count(a) == 0) {
            return Ok(Selection::force_play(arm));
        }
        let arm = argmax_bound("EUCBV", step, self.active.iter().copied(), |a| {
            let (mean, var, n) = pulled_stats("EUCBV", step, stats, a)?;
            Ok(mean + self.width(var, n))
        })?;
        Ok(Selection::new(arm, SelectionReason::ConfidenceBound))
    }

    fn update(&mut self, _arm: usize, _reward: f64, stats: &RunningStatistics) -> Result<()> {
        let step = stats.total_pulls();
        if step <= self.num_arms as u64 || self.active.len() <= 1 {
            return Ok(());
        }
        // All arms were pulled in the first K steps, so elimination never
        // sees an untried arm.
        self.eliminate(stats, step)?;
        let t = step - 1;
        if t >= self.phase_end && (self.phase as i64) <= self.max_phase {
            self.delta /= 2.0;
            self.n0 = self.pulls_per_phase();
            self.phase_end = t + self.active.len() as u64 * self.n0;
            self.phase += 1;
            tracing::debug!(
                step,
                phase = self.phase,
                delta = self.delta,
                next_end = self.phase_end,
                "EUCBV phase advanced"
            );
        }
        Ok(())
    }
}
