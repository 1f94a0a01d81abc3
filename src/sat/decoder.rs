//! Turning a satisfying assignment back into a trajectory

use super::solver::SolverSolution;
use super::variables::{VariableManager, VariableType};
use crate::error::{PlanError, PlanResult};
use crate::plan::Trajectory;
use crate::world::{Cell, Configuration, Direction, Grid};

/// Reads robot, box and move indicators out of a model
pub struct TrajectoryDecoder<'a> {
    variables: &'a VariableManager,
    free_cells: Vec<Cell>,
}

impl<'a> TrajectoryDecoder<'a> {
    pub fn new(grid: &Grid, variables: &'a VariableManager) -> Self {
        Self {
            variables,
            free_cells: grid.free_cells(),
        }
    }

    /// Decode the full trajectory. Every time step must place each entity on
    /// exactly one cell and choose exactly one move.
    pub fn decode(&self, solution: &SolverSolution) -> PlanResult<Trajectory> {
        let horizon = self.variables.horizon();
        let mut states = Vec::with_capacity(horizon + 1);
        for t in 0..=horizon {
            states.push(self.decode_configuration(solution, t)?);
        }

        let mut moves = Vec::with_capacity(horizon);
        for t in 0..horizon {
            moves.push(self.decode_move(solution, t)?);
        }

        Ok(Trajectory::new(moves, states))
    }

    pub fn decode_configuration(&self, solution: &SolverSolution, t: usize) -> PlanResult<Configuration> {
        let robot = self.unique_cell(solution, t, "robot", |cell| VariableType::Robot { cell, t })?;

        let mut boxes = Vec::with_capacity(self.variables.box_count());
        for id in 0..self.variables.box_count() {
            let what = format!("box {}", id);
            boxes.push(self.unique_cell(solution, t, &what, |cell| VariableType::Box { id, cell, t })?);
        }

        Ok(Configuration::new(robot, boxes))
    }

    pub fn decode_move(&self, solution: &SolverSolution, t: usize) -> PlanResult<Direction> {
        let chosen: Vec<Direction> = Direction::ALL
            .into_iter()
            .filter(|&direction| self.is_true(solution, &VariableType::Move { direction, t }))
            .collect();

        match chosen.as_slice() {
            [direction] => Ok(*direction),
            _ => Err(PlanError::EncodingInconsistency {
                step: t,
                detail: format!("expected one move, model chose {:?}", chosen),
            }),
        }
    }

    fn unique_cell(
        &self,
        solution: &SolverSolution,
        t: usize,
        what: &str,
        var_type: impl Fn(Cell) -> VariableType,
    ) -> PlanResult<Cell> {
        let cells: Vec<Cell> = self
            .free_cells
            .iter()
            .copied()
            .filter(|&cell| self.is_true(solution, &var_type(cell)))
            .collect();

        match cells.as_slice() {
            [cell] => Ok(*cell),
            _ => Err(PlanError::EncodingInconsistency {
                step: t,
                detail: format!("{} placed on {} cells", what, cells.len()),
            }),
        }
    }

    fn is_true(&self, solution: &SolverSolution, var_type: &VariableType) -> bool {
        self.variables
            .lookup(var_type)
            .is_some_and(|var| solution.value(var))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::Duration;

    fn setup() -> (Grid, VariableManager) {
        let grid = Grid::new(3, 1);
        let mut vm = VariableManager::new(&grid, 1, 1);
        for t in 0..=1 {
            for col in 0..3 {
                vm.robot(Cell::new(0, col), t).unwrap();
                vm.box_at(0, Cell::new(0, col), t).unwrap();
            }
        }
        for direction in Direction::ALL {
            vm.chosen(direction, 0).unwrap();
        }
        (grid, vm)
    }

    fn solution(vm: &mut VariableManager, robot: [usize; 2], boxes: [usize; 2], moves: &[Direction]) -> SolverSolution {
        let mut assignment = HashMap::new();
        for t in 0..=1 {
            for col in 0..3 {
                let r = vm.robot(Cell::new(0, col), t).unwrap();
                let b = vm.box_at(0, Cell::new(0, col), t).unwrap();
                assignment.insert(r, robot[t] == col);
                assignment.insert(b, boxes[t] == col);
            }
        }
        for direction in Direction::ALL {
            let m = vm.chosen(direction, 0).unwrap();
            assignment.insert(m, moves.contains(&direction));
        }
        SolverSolution {
            assignment,
            solve_time: Duration::from_millis(1),
        }
    }

    #[test]
    fn test_decode_valid_model() {
        let (grid, mut vm) = setup();
        let model = solution(&mut vm, [0, 1], [1, 2], &[Direction::Right]);

        let trajectory = TrajectoryDecoder::new(&grid, &vm).decode(&model).unwrap();
        assert_eq!(trajectory.moves, vec![Direction::Right]);
        assert_eq!(trajectory.robot_path(), vec![Cell::new(0, 0), Cell::new(0, 1)]);
        assert_eq!(trajectory.last().boxes, vec![Cell::new(0, 2)]);
    }

    #[test]
    fn test_two_moves_is_inconsistent() {
        let (grid, mut vm) = setup();
        let model = solution(&mut vm, [0, 1], [1, 2], &[Direction::Right, Direction::Up]);

        let err = TrajectoryDecoder::new(&grid, &vm).decode(&model).unwrap_err();
        assert!(matches!(err, PlanError::EncodingInconsistency { step: 0, .. }));
    }

    #[test]
    fn test_missing_robot_is_inconsistent() {
        let (grid, mut vm) = setup();
        let mut model = solution(&mut vm, [0, 1], [1, 2], &[Direction::Right]);
        let r = vm.robot(Cell::new(0, 1), 1).unwrap();
        model.assignment.insert(r, false);

        let err = TrajectoryDecoder::new(&grid, &vm).decode(&model).unwrap_err();
        assert!(matches!(err, PlanError::EncodingInconsistency { step: 1, .. }));
    }
}
