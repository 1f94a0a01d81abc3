//! Error taxonomy for planning outcomes

use thiserror::Error;

/// Everything a planner can report instead of a trajectory.
///
/// `NoSolution` is a definitive "no" within the requested bound while
/// `ResourceExhausted` leaves the answer unknown.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    /// Start, goal or a box is off the grid, on a wall, or overlaps another entity
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The bound was searched exhaustively without reaching the goal
    #[error("no solution within {bound} moves")]
    NoSolution { bound: usize },

    /// A node, time or solver budget ran out before a conclusive answer
    #[error("resource exhausted: {reason}")]
    ResourceExhausted { reason: String },

    /// A decoded model disagrees with the simulator replay
    #[error("encoding inconsistency at step {step}: {detail}")]
    EncodingInconsistency { step: usize, detail: String },

    /// Failure inside the SAT plumbing or the worker pool
    #[error("solver failure: {0}")]
    Solver(String),
}

impl PlanError {
    /// True when the planner proved there is no plan within the bound
    pub fn is_no_solution(&self) -> bool {
        matches!(self, PlanError::NoSolution { .. })
    }

    /// True when the answer is unknown rather than negative
    pub fn is_resource_exhausted(&self) -> bool {
        matches!(self, PlanError::ResourceExhausted { .. })
    }
}

impl From<anyhow::Error> for PlanError {
    fn from(err: anyhow::Error) -> Self {
        PlanError::Solver(format!("{:#}", err))
    }
}

pub type PlanResult<T> = std::result::Result<T, PlanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_classification() {
        assert!(PlanError::NoSolution { bound: 4 }.is_no_solution());
        assert!(!PlanError::NoSolution { bound: 4 }.is_resource_exhausted());

        let exhausted = PlanError::ResourceExhausted { reason: "node limit".to_string() };
        assert!(exhausted.is_resource_exhausted());
        assert!(!exhausted.is_no_solution());
    }

    #[test]
    fn test_anyhow_conversion_keeps_context() {
        let err = anyhow::anyhow!("inner").context("outer");
        let plan_err: PlanError = err.into();
        assert_eq!(plan_err, PlanError::Solver("outer: inner".to_string()));
    }
}
