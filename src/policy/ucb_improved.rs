//! UCB-Improved (Auer & Ortner 2010): phased elimination with a shrinking
//! gap estimate.
//!
//! Phase `m` uses gap estimate `delta_m` (starting at `delta_0`, halved after
//! every phase). Within a phase each surviving arm is pulled until it has
//!
//! ```text
//! n_m = ceil(2 * ln(T * delta_m^2) / delta_m^2)
//! ```
//!
//! pulls. At the end of the phase, with radius
//! `r = sqrt(ln(T * delta_m^2) / (2 * n_m))`, every arm whose upper bound
//! `mean + r` falls below the best lower bound `max(mean - r)` is dropped.
//!
//! After `floor(0.5 * log2(T / e))` phases, or once a single arm survives,
//! the policy exploits the best empirical mean among the survivors.

use rand::RngCore;

use super::{pulled_stats, SelectionPolicy};
use crate::error::{Result, SimError};
use crate::stats::RunningStatistics;
use crate::utils::{first_max, ln_floor0};
use crate::{Selection, SelectionReason};

#[derive(Debug, Clone)]
pub struct UcbImproved {
    horizon: f64,
    delta: f64,
    active: Vec<usize>,
    phase: i64,
    phase_limit: i64,
}

impl UcbImproved {
    pub fn new(num_arms: usize, horizon: u64, delta: f64) -> Self {
        let horizon = horizon as f64;
        let phase_limit = (0.5 * (horizon / std::f64::consts::E).log2()).floor() as i64;
        Self {
            horizon,
            delta,
            active: (0..num_arms).collect(),
            phase: 0,
            phase_limit,
        }
    }

    /// Arms still in contention, in index order.
    pub fn active_arms(&self) -> &[usize] {
        &self.active
    }

    /// Number of completed elimination phases.
    pub fn phase(&self) -> i64 {
        self.phase
    }

    pub fn phase_limit(&self) -> i64 {
        self.phase_limit
    }

    fn exploring(&self) -> bool {
        self.phase < self.phase_limit && self.active.len() > 1
    }

    fn log_term(&self) -> f64 {
        ln_floor0(self.horizon * self.delta * self.delta)
    }

    /// Pulls each active arm needs in the current phase.
    pub fn phase_budget(&self) -> u64 {
        let d2 = self.delta * self.delta;
        (2.0 * self.log_term() / d2).ceil().max(1.0) as u64
    }

    fn end_phase(&mut self, stats: &RunningStatistics, step: u64) -> Result<()> {
        let budget = self.phase_budget() as f64;
        let r = (self.log_term() / (2.0 * budget)).sqrt();
        let mut means = Vec::with_capacity(self.active.len());
        for &a in &self.active {
            means.push(pulled_stats("UCB-Improved", step, stats, a)?.0);
        }
        let best_lcb = means
            .iter()
            .map(|m| m - r)
            .fold(f64::NEG_INFINITY, f64::max);
        if !best_lcb.is_finite() {
            return Err(SimError::NumericDegeneracy {
                policy: "UCB-Improved",
                step,
                detail: format!("best lower bound {best_lcb} at phase {}", self.phase),
            });
        }
        let before = self.active.len();
        let survivors: Vec<usize> = self
            .active
            .iter()
            .zip(&means)
            .filter(|&(_, &m)| m + r >= best_lcb)
            .map(|(&a, _)| a)
            .collect();
        self.active = survivors;
        self.delta /= 2.0;
        self.phase += 1;
        tracing::debug!(
            step,
            phase = self.phase,
            eliminated = before - self.active.len(),
            active = ?self.active,
            "UCB-Improved phase ended"
        );
        Ok(())
    }
}

impl SelectionPolicy for UcbImproved {
    fn name(&self) -> &'static str {
        "UCB-Improved"
    }

    fn select_arm(
        &mut self,
        stats: &RunningStatistics,
        step: u64,
        _rng: &mut dyn RngCore,
    ) -> Result<Selection> {
        while self.exploring() {
            let budget = self.phase_budget();
            let pending = self
                .active
                .iter()
                .copied()
                .filter(|&a| stats.count(a) < budget);
            if let Some(arm) = stats.least_pulled_among(pending) {
                return Ok(Selection::new(arm, SelectionReason::PhaseExplore));
            }
            self.end_phase(stats, step)?;
        }

        if let Some(&arm) = self.active.iter().find(|&&a| stats.count(a) == 0) {
            return Ok(Selection::force_play(arm));
        }
        let means: Vec<f64> = self
            .active
            .iter()
            .map(|&a| stats.mean_of(a).unwrap_or(f64::NAN))
            .collect();
        let idx = first_max(&means).ok_or_else(|| SimError::NumericDegeneracy {
            policy: "UCB-Improved",
            step,
            detail: format!("no exploitable arm among {:?}", self.active),
        })?;
        Ok(Selection::new(self.active[idx], SelectionReason::Exploit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn schedule_constants() {
        let p = UcbImproved::new(2, 10_000, 1.0);
        // 0.5 * log2(10000 / e) ~ 5.92
        assert_eq!(p.phase_limit(), 5);
        // 2 * ln(10000) ~ 18.42
        assert_eq!(p.phase_budget(), 19);
        assert!(UcbImproved::new(2, 4, 1.0).phase_limit() <= 0);
    }

    #[test]
    fn explores_evenly_then_eliminates_clear_loser() {
        let mut p = UcbImproved::new(2, 10_000, 1.0);
        let mut stats = RunningStatistics::new(2);
        let mut rng = StdRng::seed_from_u64(0);
        for step in 1..=38u64 {
            let s = p.select_arm(&stats, step, &mut rng).unwrap();
            assert_eq!(s.reason, SelectionReason::PhaseExplore);
            assert_eq!(s.arm as u64, (step - 1) % 2);
            stats.update(s.arm, if s.arm == 0 { 1.0 } else { 0.0 });
        }
        // r = sqrt(ln 10000 / 38) ~ 0.49: arm 1's upper bound 0.49 < 0.51.
        let s = p.select_arm(&stats, 39, &mut rng).unwrap();
        assert_eq!(s, Selection::new(0, SelectionReason::Exploit));
        assert_eq!(p.active_arms(), &[0]);
        assert_eq!(p.phase(), 1);
    }

    #[test]
    fn ambiguous_arms_survive_the_phase() {
        let mut p = UcbImproved::new(2, 10_000, 1.0);
        let mut stats = RunningStatistics::new(2);
        let mut rng = StdRng::seed_from_u64(0);
        for step in 1..=38u64 {
            let s = p.select_arm(&stats, step, &mut rng).unwrap();
            stats.update(s.arm, (step % 3 == 0) as u8 as f64);
        }
        let s = p.select_arm(&stats, 39, &mut rng).unwrap();
        assert_eq!(p.active_arms(), &[0, 1]);
        // Phase 1 uses delta = 1/2 and a larger budget, so exploration continues.
        assert_eq!(s.reason, SelectionReason::PhaseExplore);
        assert!(p.phase_budget() > 19);
    }

    #[test]
    fn non_finite_mean_aborts_the_phase() {
        let mut p = UcbImproved::new(2, 10_000, 1.0);
        let mut stats = RunningStatistics::new(2);
        let mut rng = StdRng::seed_from_u64(0);
        for step in 1..=38u64 {
            let s = p.select_arm(&stats, step, &mut rng).unwrap();
            stats.update(s.arm, if s.arm == 0 { f64::INFINITY } else { 0.5 });
        }
        let err = p.select_arm(&stats, 39, &mut rng).unwrap_err();
        assert!(matches!(
            err,
            SimError::NumericDegeneracy {
                policy: "UCB-Improved",
                step: 39,
                ..
            }
        ));
        assert_eq!(p.phase(), 0);
    }

    #[test]
    fn short_horizon_skips_straight_to_exploitation() {
        let mut p = UcbImproved::new(2, 4, 1.0);
        let mut stats = RunningStatistics::new(2);
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(p.select_arm(&stats, 1, &mut rng).unwrap(), Selection::force_play(0));
        stats.update(0, 0.0);
        assert_eq!(p.select_arm(&stats, 2, &mut rng).unwrap(), Selection::force_play(1));
        stats.update(1, 1.0);
        assert_eq!(
            p.select_arm(&stats, 3, &mut rng).unwrap(),
            Selection::new(1, SelectionReason::Exploit)
        );
    }
}
