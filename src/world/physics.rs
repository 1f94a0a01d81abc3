//! Ice physics: one commanded slide, including box pushes

use super::grid::{Cell, Direction, Grid};
use crate::config::PushModel;
use crate::error::{PlanError, PlanResult};
use serde::{Deserialize, Serialize};

/// Robot cell plus one cell per box. Box identities are stable across time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Configuration {
    pub robot: Cell,
    pub boxes: Vec<Cell>,
}

/// Order-independent identity of a configuration, used for deduplication
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConfigKey {
    robot: Cell,
    boxes: Vec<Cell>,
}

impl Configuration {
    pub fn new(robot: Cell, boxes: Vec<Cell>) -> Self {
        Self { robot, boxes }
    }

    /// Index of the box occupying `cell`, if any
    pub fn box_at(&self, cell: Cell) -> Option<usize> {
        self.boxes.iter().position(|&b| b == cell)
    }

    pub fn has_box(&self, cell: Cell) -> bool {
        self.boxes.contains(&cell)
    }

    /// Robot cell and the sorted box multiset
    pub fn canonical_key(&self) -> ConfigKey {
        let mut boxes = self.boxes.clone();
        boxes.sort_unstable();
        ConfigKey { robot: self.robot, boxes }
    }

    /// Check the occupancy invariants against `grid`
    pub fn validate(&self, grid: &Grid) -> PlanResult<()> {
        if !grid.is_free(self.robot) {
            return Err(PlanError::InvalidInput(format!(
                "robot cell {} is outside the grid or on a wall",
                self.robot
            )));
        }

        for (i, &cell) in self.boxes.iter().enumerate() {
            if !grid.is_free(cell) {
                return Err(PlanError::InvalidInput(format!(
                    "box {} at {} is outside the grid or on a wall",
                    i, cell
                )));
            }
            if cell == self.robot {
                return Err(PlanError::InvalidInput(format!(
                    "box {} at {} overlaps the robot",
                    i, cell
                )));
            }
            if self.boxes[..i].contains(&cell) {
                return Err(PlanError::InvalidInput(format!(
                    "box {} at {} overlaps another box",
                    i, cell
                )));
            }
        }

        Ok(())
    }
}

/// Stateless transition function over configurations
#[derive(Debug, Clone, Copy)]
pub struct Simulator<'g> {
    grid: &'g Grid,
    push_model: PushModel,
}

impl<'g> Simulator<'g> {
    pub fn new(grid: &'g Grid, push_model: PushModel) -> Self {
        Self { grid, push_model }
    }

    pub fn grid(&self) -> &'g Grid {
        self.grid
    }

    pub fn push_model(&self) -> PushModel {
        self.push_model
    }

    /// Apply one commanded move. A blocked direction yields the same configuration.
    pub fn step(&self, config: &Configuration, direction: Direction) -> Configuration {
        let mut next = config.clone();
        let mut robot = config.robot;

        loop {
            let Some(ahead) = self.grid.step_free(robot, direction) else {
                break;
            };

            match config.box_at(ahead) {
                None => robot = ahead,
                Some(first) => {
                    robot = match self.push_model {
                        PushModel::Chain => self.push_chain(&mut next, first, robot, direction),
                        PushModel::Slide => self.push_slide(&mut next, first, robot, direction),
                    };
                    // A single push ends the move
                    break;
                }
            }
        }

        next.robot = robot;
        next
    }

    /// Replay `moves` from `start`, returning every intermediate configuration
    pub fn replay(&self, start: &Configuration, moves: &[Direction]) -> Vec<Configuration> {
        let mut states = Vec::with_capacity(moves.len() + 1);
        states.push(start.clone());
        let mut current = start.clone();
        for &direction in moves {
            current = self.step(&current, direction);
            states.push(current.clone());
        }
        states
    }

    /// Shift the contiguous run starting at box `first` by one cell if the cell
    /// past the run is open. Returns the robot's resting cell.
    fn push_chain(&self, config: &mut Configuration, first: usize, robot: Cell, direction: Direction) -> Cell {
        let mut chain = vec![first];
        let mut lead = config.boxes[first];

        let blocked = loop {
            match self.grid.step_free(lead, direction) {
                None => break true,
                Some(beyond) => match config.box_at(beyond) {
                    Some(other) => {
                        chain.push(other);
                        lead = beyond;
                    }
                    None => break false,
                },
            }
        };

        if blocked {
            return robot;
        }

        let vacated = config.boxes[first];
        for &b in &chain {
            // The run was checked to be free one cell ahead of the lead box
            if let Some(shifted) = self.grid.step_free(config.boxes[b], direction) {
                config.boxes[b] = shifted;
            }
        }
        vacated
    }

    /// Slide box `first` until the next cell is a wall, the boundary or another
    /// box. Returns the robot's resting cell, one behind the box.
    fn push_slide(&self, config: &mut Configuration, first: usize, robot: Cell, direction: Direction) -> Cell {
        let start = config.boxes[first];
        let mut stop = start;
        while let Some(next) = self.grid.step_free(stop, direction) {
            if config.has_box(next) {
                break;
            }
            stop = next;
        }

        if stop == start {
            return robot;
        }

        config.boxes[first] = stop;
        self.grid.neighbor(stop, direction.opposite()).unwrap_or(robot)
    }
}
