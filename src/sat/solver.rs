//! SAT solver integration using CaDiCaL

use super::constraints::Clause;
use anyhow::Result;
use cadical::Solver;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Cooperative stop condition polled by the solver while it searches.
///
/// Stops on a wall-clock deadline, or when a shared "best horizon" drops below
/// the horizon this solver is working on.
#[derive(Debug, Clone, Default)]
pub struct Interrupt {
    deadline: Option<Instant>,
    horizon: usize,
    best: Option<Arc<AtomicUsize>>,
}

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Give up `timeout` after now
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.deadline = timeout.map(|limit| Instant::now() + limit);
        self
    }

    /// Give up as soon as `best` holds a value below `horizon`
    pub fn with_shared_best(mut self, horizon: usize, best: Arc<AtomicUsize>) -> Self {
        self.horizon = horizon;
        self.best = Some(best);
        self
    }

    pub fn should_stop(&self) -> bool {
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return true;
            }
        }
        match &self.best {
            Some(best) => best.load(Ordering::Relaxed) < self.horizon,
            None => false,
        }
    }
}

impl cadical::Callbacks for Interrupt {
    fn terminate(&mut self) -> bool {
        self.should_stop()
    }
}

/// Outcome of a single solver call
#[derive(Debug, Clone)]
pub enum SolveOutcome {
    Satisfiable(SolverSolution),
    Unsatisfiable,
    /// The solver stopped before deciding (timeout or cancellation)
    Interrupted,
}

impl SolveOutcome {
    pub fn result_type(&self) -> SolverResultType {
        match self {
            SolveOutcome::Satisfiable(_) => SolverResultType::Satisfiable,
            SolveOutcome::Unsatisfiable => SolverResultType::Unsatisfiable,
            SolveOutcome::Interrupted => SolverResultType::Timeout,
        }
    }
}

/// SAT solver wrapper for CaDiCaL
pub struct SatSolver {
    solver: Solver<Interrupt>,
    variable_count: usize,
    clause_count: usize,
    options: SolverOptions,
    interrupt: Interrupt,
    last_solve_time: Duration,
    last_result: Option<SolverResultType>,
}

/// Result of SAT solving
#[derive(Debug, Clone)]
pub struct SolverSolution {
    pub assignment: HashMap<i32, bool>,
    pub solve_time: Duration,
}

impl SolverSolution {
    /// Value of `var`; unassigned variables read as false
    pub fn value(&self, var: i32) -> bool {
        self.assignment.get(&var).copied().unwrap_or(false)
    }
}

/// Statistics about the solving process
#[derive(Debug, Clone)]
pub struct SolverStatistics {
    pub variable_count: usize,
    pub clause_count: usize,
    pub solve_time: Duration,
    pub result: Option<SolverResultType>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverResultType {
    Satisfiable,
    Unsatisfiable,
    Timeout,
}

impl SatSolver {
    /// Create a new SAT solver instance
    pub fn new() -> Self {
        Self {
            solver: Solver::new(),
            variable_count: 0,
            clause_count: 0,
            options: SolverOptions::default(),
            interrupt: Interrupt::new(),
            last_solve_time: Duration::ZERO,
            last_result: None,
        }
    }

    /// Install a stop condition; the timeout from the options still applies
    pub fn set_interrupt(&mut self, interrupt: Interrupt) {
        self.interrupt = interrupt;
    }

    /// Add clauses to the solver
    pub fn add_clauses(&mut self, clauses: &[Clause]) -> Result<()> {
        for clause in clauses {
            self.add_clause(clause)?;
        }
        Ok(())
    }

    /// Add a single clause to the solver
    pub fn add_clause(&mut self, clause: &Clause) -> Result<()> {
        if clause.is_empty() {
            anyhow::bail!("Cannot add empty clause (unsatisfiable)");
        }

        for &literal in &clause.literals {
            let var = literal.unsigned_abs() as usize;
            if var > self.variable_count {
                self.variable_count = var;
            }
        }

        self.solver.add_clause(clause.literals.iter().copied());

        self.clause_count += 1;
        Ok(())
    }

    /// Run the solver until it decides or the interrupt fires
    pub fn solve(&mut self) -> Result<SolveOutcome> {
        let interrupt = self.interrupt.clone().with_timeout(self.options.timeout);
        let start_time = Instant::now();

        let outcome = if interrupt.should_stop() {
            SolveOutcome::Interrupted
        } else {
            self.solver.set_callbacks(Some(interrupt));
            match self.solver.solve() {
                Some(true) => SolveOutcome::Satisfiable(SolverSolution {
                    assignment: self.extract_assignment(),
                    solve_time: start_time.elapsed(),
                }),
                Some(false) => SolveOutcome::Unsatisfiable,
                None => SolveOutcome::Interrupted,
            }
        };

        self.last_solve_time = start_time.elapsed();
        self.last_result = Some(outcome.result_type());
        Ok(outcome)
    }

    /// Extract variable assignment from the solver
    fn extract_assignment(&self) -> HashMap<i32, bool> {
        let mut assignment = HashMap::new();

        for var in 1..=self.variable_count as i32 {
            if let Some(value) = self.solver.value(var) {
                assignment.insert(var, value);
            }
        }

        assignment
    }

    /// Get solver statistics
    pub fn statistics(&self) -> SolverStatistics {
        SolverStatistics {
            variable_count: self.variable_count,
            clause_count: self.clause_count,
            solve_time: self.last_solve_time,
            result: self.last_result,
        }
    }

    /// Reset the solver (clear all clauses)
    pub fn reset(&mut self) {
        self.solver = Solver::new();
        self.variable_count = 0;
        self.clause_count = 0;
        self.last_solve_time = Duration::ZERO;
        self.last_result = None;
    }

    /// Get the number of variables
    pub fn variable_count(&self) -> usize {
        self.variable_count
    }

    /// Get the number of clauses
    pub fn clause_count(&self) -> usize {
        self.clause_count
    }

    /// Set solver configuration options
    pub fn configure(&mut self, options: &SolverOptions) {
        self.options = options.clone();
    }
}

impl Default for SatSolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration options for the SAT solver
#[derive(Debug, Clone, Default)]
pub struct SolverOptions {
    /// Wall-clock budget per solve call
    pub timeout: Option<Duration>,
}

impl std::fmt::Display for SolverStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SAT Solver Statistics:")?;
        writeln!(f, "  Variables: {}", self.variable_count)?;
        writeln!(f, "  Clauses: {}", self.clause_count)?;
        writeln!(f, "  Solve time: {:.3}s", self.solve_time.as_secs_f64())?;
        match self.result {
            Some(result) => writeln!(f, "  Result: {:?}", result)?,
            None => writeln!(f, "  Result: not solved")?,
        }
        Ok(())
    }
}

impl std::fmt::Display for SolverSolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SAT Solution:")?;
        writeln!(f, "  Solve time: {:.3}s", self.solve_time.as_secs_f64())?;
        writeln!(f, "  Variables assigned: {}", self.assignment.len())?;
        writeln!(
            f,
            "  True variables: {}",
            self.assignment.values().filter(|&&value| value).count()
        )?;
        Ok(())
    }
}
