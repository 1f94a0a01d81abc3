//! Trajectories: the move sequence and every configuration along it

use crate::world::{Cell, Configuration, Direction};
use serde::{Deserialize, Serialize};

/// `states[0]` is the initial configuration and `states[i + 1]` the result of
/// applying `moves[i]`. Always `states.len() == moves.len() + 1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trajectory {
    pub moves: Vec<Direction>,
    pub states: Vec<Configuration>,
}

impl Trajectory {
    pub fn new(moves: Vec<Direction>, states: Vec<Configuration>) -> Self {
        debug_assert_eq!(states.len(), moves.len() + 1);
        Self { moves, states }
    }

    /// A plan with no moves, for a robot that already stands on the goal
    pub fn stationary(start: Configuration) -> Self {
        Self {
            moves: Vec::new(),
            states: vec![start],
        }
    }

    /// Number of moves
    pub fn horizon(&self) -> usize {
        self.moves.len()
    }

    pub fn initial(&self) -> &Configuration {
        &self.states[0]
    }

    pub fn last(&self) -> &Configuration {
        &self.states[self.states.len() - 1]
    }

    pub fn robot_path(&self) -> Vec<Cell> {
        self.states.iter().map(|state| state.robot).collect()
    }

    /// One position sequence per box, in box identity order
    pub fn box_paths(&self) -> Vec<Vec<Cell>> {
        let box_count = self.initial().boxes.len();
        (0..box_count)
            .map(|b| self.states.iter().map(|state| state.boxes[b]).collect())
            .collect()
    }

    /// Compact move listing such as `RDLU`
    pub fn move_string(&self) -> String {
        self.moves.iter().map(|m| m.symbol()).collect()
    }
}
