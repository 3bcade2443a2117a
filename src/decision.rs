//! What a policy returns for one step: the arm, and why.
//!
//! The reason is not needed to run a trial, but it makes the policies
//! auditable: tests use it to check that no confidence bound is ever
//! compared while an arm is still untried, and that phase-based policies move
//! through their phases in order.

/// Why a policy picked the arm it did.
///
/// Variants are small and stable. Prefer adding new variants over changing
/// existing semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SelectionReason {
    /// An arm lacked the minimum number of pulls and was played unconditionally.
    ForcePlay,
    /// Fixed exploration schedule (ETC's round-robin).
    RoundRobin,
    /// The arm fixed at the end of ETC's exploration phase.
    Committed,
    /// Uniformly random exploration (epsilon-greedy).
    RandomExplore,
    /// Greedy argmax of the value estimates.
    Greedy,
    /// Argmax of an upper confidence bound.
    ConfidenceBound,
    /// Scheduled pull within an elimination phase.
    PhaseExplore,
    /// Exploitation after elimination finished, or of the last surviving arm.
    Exploit,
}

/// One step's decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Selection {
    pub arm: usize,
    pub reason: SelectionReason,
}

impl Selection {
    pub fn new(arm: usize, reason: SelectionReason) -> Self {
        Self { arm, reason }
    }

    pub fn force_play(arm: usize) -> Self {
        Self::new(arm, SelectionReason::ForcePlay)
    }
}
