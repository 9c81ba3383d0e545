//! Error types for the simulation engine.
//!
//! Configuration problems are fatal at construction time, invariant
//! violations mean the run is corrupted, and `AlreadyTerminated` is the only
//! error a caller is expected to recover from (by stopping its loop).

use crate::agent::AgentId;

/// Errors produced by the grid, the scheduler and the orchestrator.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// The configuration failed validation.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// Grid dimensions must both be positive.
    #[error("grid dimensions out of range: {width}x{height}")]
    OutOfRange { width: usize, height: usize },

    /// The agent is not present in the grid or scheduler.
    #[error("agent not found: {0}")]
    NotFound(AgentId),

    /// Internal bookkeeping disagreed with itself. The run cannot continue.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// `step()` was called after the run reached its terminal state.
    #[error("simulation already terminated at step {step}")]
    AlreadyTerminated { step: u64 },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, SimError>;

impl SimError {
    /// Re-tag a lookup failure that happened during step resolution.
    ///
    /// A missing agent mid-step means the grid and scheduler disagree, which
    /// is a defect rather than a caller mistake.
    pub(crate) fn into_invariant(self, context: &str) -> Self {
        match self {
            SimError::NotFound(id) => {
                SimError::InvariantViolation(format!("{context}: agent {id} missing"))
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_becomes_invariant_violation() {
        let err = SimError::NotFound(7).into_invariant("moving prey");
        match err {
            SimError::InvariantViolation(msg) => {
                assert!(msg.contains("moving prey"));
                assert!(msg.contains('7'));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_other_errors_pass_through() {
        let err = SimError::AlreadyTerminated { step: 3 }.into_invariant("ctx");
        assert!(matches!(err, SimError::AlreadyTerminated { step: 3 }));
    }
}
