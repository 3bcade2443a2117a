//! Error type shared by configuration, simulation, and artifact writing.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SimError>;

/// Everything that can stop a run.
///
/// Configuration problems are reported before any trial starts. A non-finite
/// bound mid-trial aborts that trial; `NaN` never reaches the output series.
#[derive(Debug, Error)]
pub enum SimError {
    /// Rejected configuration (arm means, horizon, checkpoints, policy parameters).
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A confidence bound evaluated to a non-finite value.
    #[error("{policy}: numeric degeneracy at step {step}: {detail}")]
    NumericDegeneracy {
        policy: &'static str,
        step: u64,
        detail: String,
    },

    /// A policy returned an arm index that does not exist.
    #[error("{policy}: selected arm {arm} at step {step}, but only {arms} arms exist")]
    ArmOutOfRange {
        policy: &'static str,
        step: u64,
        arm: usize,
        arms: usize,
    },

    /// The run was interrupted before this unit of work completed.
    #[error("interrupted")]
    Interrupted,

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "serde")]
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SimError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        SimError::InvalidConfig(msg.into())
    }
}
