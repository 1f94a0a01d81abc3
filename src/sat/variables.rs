//! Variable management for the bounded-horizon encoding

use crate::world::{Cell, Direction, Grid};
use anyhow::Result;
use std::collections::{HashMap, HashSet};

/// Types of variables used in the SAT encoding
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VariableType {
    /// Robot occupies `cell` at time `t`
    Robot { cell: Cell, t: usize },
    /// Box `id` occupies `cell` at time `t`
    Box { id: usize, cell: Cell, t: usize },
    /// Some box occupies `cell` at time `t`
    Occupied { cell: Cell, t: usize },
    /// `direction` is the move chosen at time `t`
    Move { direction: Direction, t: usize },
    /// Transition case `case` of the move from `origin` in `direction` fires at `t`
    Event { t: usize, origin: Cell, direction: Direction, case: usize },
    /// The box at `cell` is shifted by the move at time `t`
    Vacated { cell: Cell, t: usize },
    /// Helper variable for cardinality encodings
    Auxiliary { id: usize },
}

/// Manages SAT variables and their mapping to integers
#[derive(Debug)]
pub struct VariableManager {
    /// Map from variable type to SAT variable ID (positive integer)
    variable_map: HashMap<VariableType, i32>,
    /// Next available variable ID
    next_id: i32,
    next_auxiliary: usize,
    free_cells: HashSet<Cell>,
    box_count: usize,
    horizon: usize,
}

impl VariableManager {
    pub fn new(grid: &Grid, box_count: usize, horizon: usize) -> Self {
        Self {
            variable_map: HashMap::new(),
            next_id: 1, // SAT variables start from 1
            next_auxiliary: 0,
            free_cells: grid.free_cells().into_iter().collect(),
            box_count,
            horizon,
        }
    }

    /// Get or create a variable ID for the given variable type
    pub fn get_variable(&mut self, var_type: VariableType) -> Result<i32> {
        if let Some(&id) = self.variable_map.get(&var_type) {
            return Ok(id);
        }

        self.validate_variable(&var_type)?;

        let id = self.next_id;
        self.next_id += 1;
        self.variable_map.insert(var_type, id);
        Ok(id)
    }

    /// Look up a variable without creating it
    pub fn lookup(&self, var_type: &VariableType) -> Option<i32> {
        self.variable_map.get(var_type).copied()
    }

    pub fn robot(&mut self, cell: Cell, t: usize) -> Result<i32> {
        self.get_variable(VariableType::Robot { cell, t })
    }

    pub fn box_at(&mut self, id: usize, cell: Cell, t: usize) -> Result<i32> {
        self.get_variable(VariableType::Box { id, cell, t })
    }

    pub fn occupied(&mut self, cell: Cell, t: usize) -> Result<i32> {
        self.get_variable(VariableType::Occupied { cell, t })
    }

    pub fn chosen(&mut self, direction: Direction, t: usize) -> Result<i32> {
        self.get_variable(VariableType::Move { direction, t })
    }

    pub fn event(&mut self, t: usize, origin: Cell, direction: Direction, case: usize) -> Result<i32> {
        self.get_variable(VariableType::Event { t, origin, direction, case })
    }

    pub fn vacated(&mut self, cell: Cell, t: usize) -> Result<i32> {
        self.get_variable(VariableType::Vacated { cell, t })
    }

    /// Allocate a fresh helper variable
    pub fn auxiliary(&mut self) -> Result<i32> {
        let id = self.next_auxiliary;
        self.next_auxiliary += 1;
        self.get_variable(VariableType::Auxiliary { id })
    }

    /// Get the total number of variables created
    pub fn variable_count(&self) -> usize {
        (self.next_id - 1) as usize
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }

    pub fn box_count(&self) -> usize {
        self.box_count
    }

    fn validate_variable(&self, var_type: &VariableType) -> Result<()> {
        match var_type {
            VariableType::Robot { cell, t } | VariableType::Occupied { cell, t } => {
                self.check_cell(*cell)?;
                self.check_state_time(*t)?;
            }
            VariableType::Box { id, cell, t } => {
                if *id >= self.box_count {
                    anyhow::bail!("Box {} out of bounds (box count: {})", id, self.box_count);
                }
                self.check_cell(*cell)?;
                self.check_state_time(*t)?;
            }
            VariableType::Move { t, .. } => self.check_move_time(*t)?,
            VariableType::Event { t, origin, .. } => {
                self.check_cell(*origin)?;
                self.check_move_time(*t)?;
            }
            VariableType::Vacated { cell, t } => {
                self.check_cell(*cell)?;
                self.check_move_time(*t)?;
            }
            VariableType::Auxiliary { .. } => {}
        }
        Ok(())
    }

    fn check_cell(&self, cell: Cell) -> Result<()> {
        if !self.free_cells.contains(&cell) {
            anyhow::bail!("Cell {} is not a free cell of the grid", cell);
        }
        Ok(())
    }

    fn check_state_time(&self, t: usize) -> Result<()> {
        if t > self.horizon {
            anyhow::bail!("Time step {} out of bounds (horizon: {})", t, self.horizon);
        }
        Ok(())
    }

    fn check_move_time(&self, t: usize) -> Result<()> {
        if t >= self.horizon {
            anyhow::bail!("Move step {} out of bounds (horizon: {})", t, self.horizon);
        }
        Ok(())
    }

    /// Get statistics about variable usage
    pub fn statistics(&self) -> VariableStatistics {
        let mut stats = VariableStatistics {
            total_variables: self.variable_count(),
            ..Default::default()
        };

        for var_type in self.variable_map.keys() {
            match var_type {
                VariableType::Robot { .. } | VariableType::Box { .. } => stats.position_variables += 1,
                VariableType::Move { .. } => stats.move_variables += 1,
                _ => stats.auxiliary_variables += 1,
            }
        }

        stats
    }
}

/// Statistics about variable usage
#[derive(Debug, Clone, Default)]
pub struct VariableStatistics {
    pub total_variables: usize,
    pub position_variables: usize,
    pub move_variables: usize,
    pub auxiliary_variables: usize,
}

impl std::fmt::Display for VariableStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Variable Statistics:")?;
        writeln!(f, "  Total variables: {}", self.total_variables)?;
        writeln!(f, "  Position variables: {}", self.position_variables)?;
        writeln!(f, "  Move variables: {}", self.move_variables)?;
        writeln!(f, "  Auxiliary variables: {}", self.auxiliary_variables)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::CellKind;

    fn manager() -> VariableManager {
        let mut grid = Grid::new(3, 3);
        grid.set(1, 1, CellKind::Wall).unwrap();
        VariableManager::new(&grid, 2, 2)
    }

    #[test]
    fn test_variable_creation() {
        let mut vm = manager();

        let var1 = vm.robot(Cell::new(0, 0), 0).unwrap();
        let var2 = vm.box_at(1, Cell::new(2, 2), 1).unwrap();

        assert_eq!(var1, 1);
        assert_eq!(var2, 2);

        // Same variable returns the same ID
        assert_eq!(vm.robot(Cell::new(0, 0), 0).unwrap(), var1);
        assert_eq!(vm.lookup(&VariableType::Robot { cell: Cell::new(0, 0), t: 0 }), Some(var1));
        assert_eq!(vm.lookup(&VariableType::Robot { cell: Cell::new(0, 1), t: 0 }), None);
    }

    #[test]
    fn test_variable_bounds() {
        let mut vm = manager();

        assert!(vm.robot(Cell::new(0, 0), 2).is_ok());
        assert!(vm.chosen(Direction::Up, 1).is_ok());

        assert!(vm.robot(Cell::new(1, 1), 0).is_err()); // wall
        assert!(vm.robot(Cell::new(3, 0), 0).is_err()); // off grid
        assert!(vm.robot(Cell::new(0, 0), 3).is_err()); // past horizon
        assert!(vm.chosen(Direction::Up, 2).is_err()); // no move at the last step
        assert!(vm.box_at(2, Cell::new(0, 0), 0).is_err()); // unknown box
    }

    #[test]
    fn test_auxiliary_variables_are_fresh() {
        let mut vm = manager();
        let a = vm.auxiliary().unwrap();
        let b = vm.auxiliary().unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_statistics() {
        let mut vm = manager();

        vm.robot(Cell::new(0, 0), 0).unwrap();
        vm.box_at(0, Cell::new(0, 1), 0).unwrap();
        vm.chosen(Direction::Left, 0).unwrap();
        vm.auxiliary().unwrap();

        let stats = vm.statistics();
        assert_eq!(stats.total_variables, 4);
        assert_eq!(stats.position_variables, 2);
        assert_eq!(stats.move_variables, 1);
        assert_eq!(stats.auxiliary_variables, 1);
    }
}
