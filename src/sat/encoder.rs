//! SAT encoder for fixed-horizon ice planning problems

use super::decoder::TrajectoryDecoder;
use super::solver::{Interrupt, SolveOutcome, SolverOptions, SolverResultType};
use super::solver_factory::UnifiedSatSolver;
use super::ConstraintGenerator;
use crate::config::{Settings, SolverBackend};
use crate::error::PlanResult;
use crate::plan::{Trajectory, TrajectoryValidator};
use crate::world::{Level, Simulator};
use anyhow::Context;
use std::time::Duration;
use tracing::debug;

/// Answer for a single horizon
#[derive(Debug, Clone)]
pub enum HorizonOutcome {
    /// A decoded (and, if enabled, replay-verified) trajectory of exactly this length
    Plan(Trajectory),
    /// Proven: no plan of this length exists
    Unsatisfiable,
    /// The solver was stopped before it decided
    Unknown,
}

/// One encode-and-solve run
#[derive(Debug, Clone)]
pub struct HorizonAttempt {
    pub horizon: usize,
    pub outcome: HorizonOutcome,
    pub statistics: EncodingStatistics,
}

/// Builds and solves the CNF instance "a plan of exactly `T` moves exists".
///
/// Every horizon gets a fresh generator and solver, so one encoder can be
/// shared by workers solving different horizons at once.
pub struct SatEncoder<'l> {
    settings: Settings,
    level: &'l Level,
}

impl<'l> SatEncoder<'l> {
    pub fn new(settings: Settings, level: &'l Level) -> Self {
        Self { settings, level }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn level(&self) -> &'l Level {
        self.level
    }

    fn simulator(&self) -> Simulator<'l> {
        Simulator::new(&self.level.grid, self.settings.planning.push_model)
    }

    /// Encode horizon `horizon`, solve it and decode the model if there is one
    pub fn solve_horizon(&self, horizon: usize, interrupt: Interrupt) -> PlanResult<HorizonAttempt> {
        let start = self.level.initial_configuration();
        let mut generator = ConstraintGenerator::new(
            &self.level.grid,
            start.boxes.len(),
            horizon,
            self.settings.planning.push_model,
            self.settings.encoding.at_most_one,
        );

        let clauses = generator
            .generate_all_constraints(&start, self.level.goal)
            .context("Failed to generate SAT constraints")?;

        debug!(
            horizon,
            variables = generator.variables().variable_count(),
            clauses = clauses.len(),
            "encoded horizon"
        );

        let mut solver = UnifiedSatSolver::new(self.settings.solver.backend);
        solver.configure(&SolverOptions {
            timeout: self.settings.solver.timeout_seconds.map(Duration::from_secs),
        });
        solver.set_interrupt(interrupt);
        solver
            .add_clauses(&clauses)
            .context("Failed to add clauses to SAT solver")?;

        let outcome = match solver.solve().context("SAT solving failed")? {
            SolveOutcome::Satisfiable(solution) => {
                let trajectory = TrajectoryDecoder::new(&self.level.grid, generator.variables()).decode(&solution)?;
                if self.settings.solver.verify_plans {
                    TrajectoryValidator::new(self.simulator()).ensure_consistent(
                        &trajectory,
                        &start,
                        self.level.goal,
                    )?;
                }
                HorizonOutcome::Plan(trajectory)
            }
            SolveOutcome::Unsatisfiable => HorizonOutcome::Unsatisfiable,
            SolveOutcome::Interrupted => HorizonOutcome::Unknown,
        };

        let constraint_stats = generator.statistics();
        let solver_stats = solver.statistics();
        let statistics = EncodingStatistics {
            horizon,
            free_cells: constraint_stats.free_cells,
            boxes: constraint_stats.boxes,
            total_variables: constraint_stats.total_variables,
            total_clauses: solver_stats.clause_count,
            transition_cases: constraint_stats.transition_cases,
            solve_time: solver_stats.solve_time,
            result: solver_stats.result,
            backend: solver.backend(),
        };

        debug!(
            horizon,
            result = ?statistics.result,
            solve_ms = statistics.solve_time.as_millis() as u64,
            "solver finished"
        );

        Ok(HorizonAttempt {
            horizon,
            outcome,
            statistics,
        })
    }

    /// Rough size of the instance for `horizon`, without building it
    pub fn estimate_complexity(&self, horizon: usize) -> ComplexityEstimate {
        let free_cells = self.level.grid.free_count();
        let boxes = self.level.boxes.len();
        let states = horizon + 1;

        // robot, boxes and occupancy per state, plus directions and vacated flags per move
        let estimated_variables = free_cells * (boxes + 2) * states + horizon * (4 + free_cells);
        // Rough multiplier covering frame and transition clauses
        let estimated_clauses = estimated_variables * (boxes + 1) * 8;

        let complexity_level = if estimated_variables < 1_000 {
            ComplexityLevel::Low
        } else if estimated_variables < 10_000 {
            ComplexityLevel::Medium
        } else if estimated_variables < 100_000 {
            ComplexityLevel::High
        } else {
            ComplexityLevel::VeryHigh
        };

        ComplexityEstimate {
            complexity_level,
            estimated_variables,
            estimated_clauses,
            free_cells,
            boxes,
            horizon,
        }
    }
}

/// Statistics about the SAT encoding of one horizon
#[derive(Debug, Clone)]
pub struct EncodingStatistics {
    pub horizon: usize,
    pub free_cells: usize,
    pub boxes: usize,
    pub total_variables: usize,
    pub total_clauses: usize,
    pub transition_cases: usize,
    pub solve_time: Duration,
    pub result: Option<SolverResultType>,
    pub backend: SolverBackend,
}

/// Complexity estimate for the problem
#[derive(Debug, Clone)]
pub struct ComplexityEstimate {
    pub complexity_level: ComplexityLevel,
    pub estimated_variables: usize,
    pub estimated_clauses: usize,
    pub free_cells: usize,
    pub boxes: usize,
    pub horizon: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComplexityLevel {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl std::fmt::Display for EncodingStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SAT Encoding Statistics (horizon {}):", self.horizon)?;
        writeln!(f, "  Free cells: {}", self.free_cells)?;
        writeln!(f, "  Boxes: {}", self.boxes)?;
        writeln!(f, "  Total variables: {}", self.total_variables)?;
        writeln!(f, "  Total clauses: {}", self.total_clauses)?;
        writeln!(f, "  Transition cases per step: {}", self.transition_cases)?;
        writeln!(f, "  Backend: {:?}", self.backend)?;
        writeln!(f, "  Solve time: {:.3}s", self.solve_time.as_secs_f64())?;
        match self.result {
            Some(result) => writeln!(f, "  Result: {:?}", result)?,
            None => writeln!(f, "  Result: not solved")?,
        }
        Ok(())
    }
}

impl std::fmt::Display for ComplexityEstimate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Problem Complexity Estimate (horizon {}):", self.horizon)?;
        writeln!(f, "  Complexity level: {:?}", self.complexity_level)?;
        writeln!(f, "  Estimated variables: {}", self.estimated_variables)?;
        writeln!(f, "  Estimated clauses: {}", self.estimated_clauses)?;
        writeln!(f, "  Free cells: {}", self.free_cells)?;
        writeln!(f, "  Boxes: {}", self.boxes)?;

        let recommendation = match self.complexity_level {
            ComplexityLevel::Low => "Should solve quickly",
            ComplexityLevel::Medium => "May take some time to solve",
            ComplexityLevel::High => "Likely to be challenging, consider a smaller horizon",
            ComplexityLevel::VeryHigh => "Very challenging, consider the search engine or a solver timeout",
        };
        writeln!(f, "  Recommendation: {}", recommendation)?;

        Ok(())
    }
}
