//! Replay validation of trajectories against the simulator

use super::Trajectory;
use crate::error::{PlanError, PlanResult};
use crate::world::{Cell, Configuration, Simulator};
use std::time::{Duration, Instant};

/// Replays trajectories through the simulator and reports where they diverge
pub struct TrajectoryValidator<'g> {
    simulator: Simulator<'g>,
}

/// Result of trajectory validation
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub starts_at_initial: bool,
    pub reaches_goal: bool,
    /// First state index whose replayed configuration differs
    pub first_divergence: Option<usize>,
    pub error_message: Option<String>,
    pub validation_time: Duration,
}

impl<'g> TrajectoryValidator<'g> {
    pub fn new(simulator: Simulator<'g>) -> Self {
        Self { simulator }
    }

    /// Check that `trajectory` starts at `start`, follows the simulator at every
    /// step and ends with the robot on `goal`
    pub fn validate(&self, trajectory: &Trajectory, start: &Configuration, goal: Cell) -> ValidationResult {
        let started = Instant::now();

        if trajectory.states.len() != trajectory.moves.len() + 1 {
            return ValidationResult {
                is_valid: false,
                starts_at_initial: false,
                reaches_goal: false,
                first_divergence: Some(0),
                error_message: Some(format!(
                    "{} states recorded for {} moves",
                    trajectory.states.len(),
                    trajectory.moves.len()
                )),
                validation_time: started.elapsed(),
            };
        }

        let starts_at_initial = trajectory.initial() == start;
        let replayed = self.simulator.replay(start, &trajectory.moves);
        let first_divergence = replayed
            .iter()
            .zip(&trajectory.states)
            .position(|(expected, recorded)| expected != recorded);
        let reaches_goal = replayed.last().is_some_and(|state| state.robot == goal);

        let is_valid = starts_at_initial && first_divergence.is_none() && reaches_goal;
        let error_message = if is_valid {
            None
        } else if let Some(step) = first_divergence {
            Some(format!(
                "state {} is {:?} but the simulator gives {:?}",
                step, trajectory.states[step], replayed[step]
            ))
        } else if !reaches_goal {
            Some(format!("robot ends on {} instead of the goal {}", trajectory.last().robot, goal))
        } else {
            Some("trajectory does not start at the initial configuration".to_string())
        };

        ValidationResult {
            is_valid,
            starts_at_initial,
            reaches_goal,
            first_divergence,
            error_message,
            validation_time: started.elapsed(),
        }
    }

    /// Like [`validate`](Self::validate), but as an error for the solver pipeline
    pub fn ensure_consistent(&self, trajectory: &Trajectory, start: &Configuration, goal: Cell) -> PlanResult<()> {
        let result = self.validate(trajectory, start, goal);
        if result.is_valid {
            return Ok(());
        }

        Err(PlanError::EncodingInconsistency {
            step: result.first_divergence.unwrap_or(trajectory.horizon()),
            detail: result
                .error_message
                .unwrap_or_else(|| "trajectory rejected by replay".to_string()),
        })
    }
}

impl std::fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Validation Result:")?;
        writeln!(f, "  Valid: {}", if self.is_valid { "✓" } else { "✗" })?;
        writeln!(f, "  Starts at initial state: {}", self.starts_at_initial)?;
        writeln!(f, "  Reaches goal: {}", self.reaches_goal)?;
        if let Some(error) = &self.error_message {
            writeln!(f, "  Error: {}", error)?;
        }
        writeln!(f, "  Validation time: {:.3}ms", self.validation_time.as_secs_f64() * 1000.0)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PushModel;
    use crate::world::{Direction, Grid};

    fn setup() -> (Grid, Configuration) {
        let grid = Grid::new(4, 1);
        (grid, Configuration::new(Cell::new(0, 0), vec![Cell::new(0, 2)]))
    }

    #[test]
    fn test_replayed_trajectory_is_valid() {
        let (grid, start) = setup();
        let sim = Simulator::new(&grid, PushModel::Chain);
        let states = sim.replay(&start, &[Direction::Right]);
        let trajectory = Trajectory::new(vec![Direction::Right], states);

        let validator = TrajectoryValidator::new(sim);
        let result = validator.validate(&trajectory, &start, Cell::new(0, 2));
        assert!(result.is_valid, "{}", result);
        assert!(validator.ensure_consistent(&trajectory, &start, Cell::new(0, 2)).is_ok());
    }

    #[test]
    fn test_divergent_state_reported() {
        let (grid, start) = setup();
        let sim = Simulator::new(&grid, PushModel::Chain);
        // Claims the robot slid through the box
        let bogus = Configuration::new(Cell::new(0, 3), vec![Cell::new(0, 2)]);
        let trajectory = Trajectory::new(vec![Direction::Right], vec![start.clone(), bogus]);

        let validator = TrajectoryValidator::new(sim);
        let result = validator.validate(&trajectory, &start, Cell::new(0, 3));
        assert!(!result.is_valid);
        assert_eq!(result.first_divergence, Some(1));

        let err = validator.ensure_consistent(&trajectory, &start, Cell::new(0, 3)).unwrap_err();
        assert!(matches!(err, PlanError::EncodingInconsistency { step: 1, .. }));
    }

    #[test]
    fn test_goal_not_reached() {
        let (grid, start) = setup();
        let sim = Simulator::new(&grid, PushModel::Chain);
        let trajectory = Trajectory::stationary(start.clone());

        let result = TrajectoryValidator::new(sim).validate(&trajectory, &start, Cell::new(0, 3));
        assert!(!result.is_valid);
        assert!(!result.reaches_goal);
        assert!(result.first_divergence.is_none());
    }
}
