//! Constraint generation for the bounded-horizon ice encoding

use super::transitions::{transition_cases, TransitionCase};
use super::VariableManager;
use crate::config::{AtMostOneEncoding, PushModel};
use crate::world::{Cell, Configuration, Direction, Grid};
use anyhow::Result;
use itertools::Itertools;
use std::collections::HashMap;

/// Group size up to which `Auto` uses the pairwise at-most-one encoding
const AMO_PAIRWISE_THRESHOLD: usize = 6;

/// Represents a SAT clause (disjunction of literals)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    pub literals: Vec<i32>, // Positive for variable, negative for negation
}

impl Clause {
    pub fn new(literals: Vec<i32>) -> Self {
        Self { literals }
    }

    pub fn unit(literal: i32) -> Self {
        Self { literals: vec![literal] }
    }

    pub fn binary(lit1: i32, lit2: i32) -> Self {
        Self { literals: vec![lit1, lit2] }
    }

    pub fn ternary(lit1: i32, lit2: i32, lit3: i32) -> Self {
        Self { literals: vec![lit1, lit2, lit3] }
    }

    /// Check if clause is empty (unsatisfiable)
    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    pub fn is_unit(&self) -> bool {
        self.literals.len() == 1
    }
}

/// Generates the clauses asserting "there is a `horizon`-move plan"
pub struct ConstraintGenerator {
    variable_manager: VariableManager,
    free_cells: Vec<Cell>,
    box_count: usize,
    horizon: usize,
    at_most_one: AtMostOneEncoding,
    /// Transition cases per (origin, direction), shared by every time step
    case_table: HashMap<(Cell, Direction), Vec<TransitionCase>>,
}

impl ConstraintGenerator {
    pub fn new(
        grid: &Grid,
        box_count: usize,
        horizon: usize,
        push_model: PushModel,
        at_most_one: AtMostOneEncoding,
    ) -> Self {
        let free_cells = grid.free_cells();
        let mut case_table = HashMap::new();
        for &origin in &free_cells {
            for direction in Direction::ALL {
                let mut cases = transition_cases(grid, origin, direction, push_model);
                if box_count == 0 {
                    // Only the box-free slide can ever match
                    cases.truncate(1);
                }
                case_table.insert((origin, direction), cases);
            }
        }

        Self {
            variable_manager: VariableManager::new(grid, box_count, horizon),
            free_cells,
            box_count,
            horizon,
            at_most_one,
            case_table,
        }
    }

    /// Generate every clause of the instance
    pub fn generate_all_constraints(&mut self, start: &Configuration, goal: Cell) -> Result<Vec<Clause>> {
        if start.boxes.len() != self.box_count {
            anyhow::bail!(
                "Start configuration has {} boxes, generator expects {}",
                start.boxes.len(),
                self.box_count
            );
        }

        let mut clauses = Vec::new();

        // 1. Frame: unique positions per entity, no stacked boxes
        for t in 0..=self.horizon {
            clauses.extend(self.generate_frame_constraints(t)?);
            clauses.extend(self.generate_occupancy_constraints(t)?);
        }

        // 2. Initial configuration
        clauses.extend(self.generate_initial_constraints(start)?);

        // 3. Goal
        clauses.push(Clause::unit(self.variable_manager.robot(goal, self.horizon)?));

        // 4 and 5. One action per step and its physical effect
        for t in 0..self.horizon {
            clauses.extend(self.generate_action_constraints(t)?);
            clauses.extend(self.generate_transition_constraints(t)?);
        }

        Ok(clauses)
    }

    /// Every entity occupies exactly one free cell; boxes never share a cell
    fn generate_frame_constraints(&mut self, t: usize) -> Result<Vec<Clause>> {
        let mut clauses = Vec::new();
        let cells = self.free_cells.clone();

        let robot_vars = cells
            .iter()
            .map(|&cell| self.variable_manager.robot(cell, t))
            .collect::<Result<Vec<_>>>()?;
        clauses.extend(self.exactly_one(&robot_vars)?);

        for id in 0..self.box_count {
            let box_vars = cells
                .iter()
                .map(|&cell| self.variable_manager.box_at(id, cell, t))
                .collect::<Result<Vec<_>>>()?;
            clauses.extend(self.exactly_one(&box_vars)?);
        }

        if self.box_count > 1 {
            for &cell in &cells {
                let stacked = (0..self.box_count)
                    .map(|id| self.variable_manager.box_at(id, cell, t))
                    .collect::<Result<Vec<_>>>()?;
                clauses.extend(self.at_most_one(&stacked)?);
            }
        }

        Ok(clauses)
    }

    /// Define `occupied(cell, t)` as the disjunction of the box indicators and
    /// keep the robot off occupied cells
    fn generate_occupancy_constraints(&mut self, t: usize) -> Result<Vec<Clause>> {
        let mut clauses = Vec::new();

        for cell in self.free_cells.clone() {
            let occupied = self.variable_manager.occupied(cell, t)?;
            let mut definition = vec![-occupied];

            for id in 0..self.box_count {
                let box_var = self.variable_manager.box_at(id, cell, t)?;
                clauses.push(Clause::binary(-box_var, occupied));
                definition.push(box_var);
            }
            clauses.push(Clause::new(definition));

            let robot = self.variable_manager.robot(cell, t)?;
            clauses.push(Clause::binary(-robot, -occupied));
        }

        Ok(clauses)
    }

    fn generate_initial_constraints(&mut self, start: &Configuration) -> Result<Vec<Clause>> {
        let mut clauses = vec![Clause::unit(self.variable_manager.robot(start.robot, 0)?)];

        for (id, &cell) in start.boxes.iter().enumerate() {
            clauses.push(Clause::unit(self.variable_manager.box_at(id, cell, 0)?));
        }

        Ok(clauses)
    }

    /// Exactly one direction is chosen at step `t`
    fn generate_action_constraints(&mut self, t: usize) -> Result<Vec<Clause>> {
        let moves = Direction::ALL
            .iter()
            .map(|&direction| self.variable_manager.chosen(direction, t))
            .collect::<Result<Vec<_>>>()?;
        self.exactly_one(&moves)
    }

    /// Transition constraints between `t` and `t + 1`.
    ///
    /// For each origin and direction the cases partition the box occupancy of the
    /// slide ray, so `robot(origin, t) ∧ chosen(direction, t)` always triggers
    /// exactly one case and its consequent is asserted directly. Cases that move
    /// boxes go through an event variable that is equivalent to the case
    /// condition; a box stays put unless an event vacates its cell.
    fn generate_transition_constraints(&mut self, t: usize) -> Result<Vec<Clause>> {
        let mut clauses = Vec::new();
        let mut vacating: HashMap<Cell, Vec<i32>> = HashMap::new();

        for origin in self.free_cells.clone() {
            for direction in Direction::ALL {
                let cases = self.case_table.get(&(origin, direction)).cloned().unwrap_or_default();
                let robot = self.variable_manager.robot(origin, t)?;
                let chosen = self.variable_manager.chosen(direction, t)?;

                for (index, case) in cases.iter().enumerate() {
                    let mut condition = Vec::with_capacity(case.requires_empty.len() + case.requires_box.len());
                    for &cell in &case.requires_empty {
                        condition.push(-self.variable_manager.occupied(cell, t)?);
                    }
                    for &cell in &case.requires_box {
                        condition.push(self.variable_manager.occupied(cell, t)?);
                    }
                    let robot_next = self.variable_manager.robot(case.robot_next, t + 1)?;

                    // robot ∧ chosen ∧ condition → consequence
                    let mut premise = vec![-robot, -chosen];
                    premise.extend(condition.iter().map(|&lit| -lit));

                    if !case.moves_boxes() {
                        premise.push(robot_next);
                        clauses.push(Clause::new(premise));
                        continue;
                    }

                    let event = self.variable_manager.event(t, origin, direction, index)?;
                    premise.push(event);
                    clauses.push(Clause::new(premise));

                    clauses.push(Clause::binary(-event, robot));
                    clauses.push(Clause::binary(-event, chosen));
                    for &lit in &condition {
                        clauses.push(Clause::binary(-event, lit));
                    }
                    clauses.push(Clause::binary(-event, robot_next));

                    for &(from, to) in &case.shifts {
                        for id in 0..self.box_count {
                            let before = self.variable_manager.box_at(id, from, t)?;
                            let after = self.variable_manager.box_at(id, to, t + 1)?;
                            clauses.push(Clause::ternary(-event, -before, after));
                        }
                        let vacated = self.variable_manager.vacated(from, t)?;
                        clauses.push(Clause::binary(-event, vacated));
                        vacating.entry(from).or_default().push(event);
                    }
                }
            }
        }

        if self.box_count == 0 {
            return Ok(clauses);
        }

        // Boxes whose cell is not vacated keep their position
        for cell in self.free_cells.clone() {
            let vacated = self.variable_manager.vacated(cell, t)?;
            let mut definition = vec![-vacated];
            if let Some(events) = vacating.get(&cell) {
                definition.extend(events.iter().copied());
            }
            clauses.push(Clause::new(definition));

            for id in 0..self.box_count {
                let before = self.variable_manager.box_at(id, cell, t)?;
                let after = self.variable_manager.box_at(id, cell, t + 1)?;
                clauses.push(Clause::ternary(-before, vacated, after));
            }
        }

        Ok(clauses)
    }

    /// At-least-one plus at-most-one over `vars`
    fn exactly_one(&mut self, vars: &[i32]) -> Result<Vec<Clause>> {
        let mut clauses = vec![Clause::new(vars.to_vec())];
        clauses.extend(self.at_most_one(vars)?);
        Ok(clauses)
    }

    fn at_most_one(&mut self, vars: &[i32]) -> Result<Vec<Clause>> {
        let pairwise = match self.at_most_one {
            AtMostOneEncoding::Pairwise => true,
            AtMostOneEncoding::Sequential => false,
            AtMostOneEncoding::Auto => vars.len() <= AMO_PAIRWISE_THRESHOLD,
        };

        if pairwise {
            Ok(Self::at_most_one_pairwise(vars))
        } else {
            self.at_most_one_sequential(vars)
        }
    }

    fn at_most_one_pairwise(vars: &[i32]) -> Vec<Clause> {
        vars.iter()
            .tuple_combinations()
            .map(|(&a, &b)| Clause::binary(-a, -b))
            .collect()
    }

    /// Sequential counter: `s[i]` holds when some of `vars[..=i]` is true
    fn at_most_one_sequential(&mut self, vars: &[i32]) -> Result<Vec<Clause>> {
        let k = vars.len();
        if k <= 1 {
            return Ok(Vec::new());
        }

        let mut s = Vec::with_capacity(k - 1);
        for _ in 0..k - 1 {
            s.push(self.variable_manager.auxiliary()?);
        }

        let mut clauses = vec![Clause::binary(-vars[0], s[0])];
        for i in 1..k - 1 {
            clauses.push(Clause::binary(-vars[i], s[i]));
            clauses.push(Clause::binary(-s[i - 1], s[i]));
        }
        for i in 1..k {
            clauses.push(Clause::binary(-vars[i], -s[i - 1]));
        }
        Ok(clauses)
    }

    pub fn variable_manager(&mut self) -> &mut VariableManager {
        &mut self.variable_manager
    }

    pub fn variables(&self) -> &VariableManager {
        &self.variable_manager
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }

    pub fn statistics(&self) -> ConstraintStatistics {
        ConstraintStatistics {
            free_cells: self.free_cells.len(),
            boxes: self.box_count,
            horizon: self.horizon,
            transition_cases: self.case_table.values().map(Vec::len).sum(),
            total_variables: self.variable_manager.variable_count(),
        }
    }
}

/// Statistics about constraint generation
#[derive(Debug, Clone)]
pub struct ConstraintStatistics {
    pub free_cells: usize,
    pub boxes: usize,
    pub horizon: usize,
    /// Cases per time step, summed over all origins and directions
    pub transition_cases: usize,
    pub total_variables: usize,
}

impl std::fmt::Display for ConstraintStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Constraint Generation Statistics:")?;
        writeln!(f, "  Free cells: {}", self.free_cells)?;
        writeln!(f, "  Boxes: {}", self.boxes)?;
        writeln!(f, "  Horizon: {}", self.horizon)?;
        writeln!(f, "  Transition cases per step: {}", self.transition_cases)?;
        writeln!(f, "  Total variables: {}", self.total_variables)?;
        Ok(())
    }
}
