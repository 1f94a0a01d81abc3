//! Varisat SAT solver integration

use super::constraints::Clause;
use super::solver::{Interrupt, SolveOutcome, SolverOptions, SolverResultType, SolverSolution, SolverStatistics};
use anyhow::Result;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use varisat::{CnfFormula, ExtendFormula, Lit, Solver};

/// SAT solver wrapper for Varisat.
///
/// Varisat has no termination hook, so the interrupt is only consulted before
/// the solver starts.
pub struct VarisatSatSolver {
    solver: Solver<'static>,
    variable_count: usize,
    clause_count: usize,
    options: SolverOptions,
    interrupt: Interrupt,
    last_solve_time: Duration,
    last_result: Option<SolverResultType>,
}

impl VarisatSatSolver {
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

    pub fn set_interrupt(&mut self, interrupt: Interrupt) {
        self.interrupt = interrupt;
    }

    /// Add clauses to the solver as one formula
    pub fn add_clauses(&mut self, clauses: &[Clause]) -> Result<()> {
        let mut formula = CnfFormula::new();
        for clause in clauses {
            formula.add_clause(&self.to_lits(clause)?);
        }
        self.solver.add_formula(&formula);
        self.clause_count += clauses.len();
        Ok(())
    }

    pub fn add_clause(&mut self, clause: &Clause) -> Result<()> {
        let lits = self.to_lits(clause)?;
        self.solver.add_clause(&lits);
        self.clause_count += 1;
        Ok(())
    }

    fn to_lits(&mut self, clause: &Clause) -> Result<Vec<Lit>> {
        if clause.is_empty() {
            anyhow::bail!("Cannot add empty clause (unsatisfiable)");
        }

        let mut lits = Vec::with_capacity(clause.literals.len());
        for &literal in &clause.literals {
            let var = literal.unsigned_abs() as usize;
            if var == 0 {
                anyhow::bail!("Literal 0 is not a valid DIMACS literal");
            }
            self.variable_count = self.variable_count.max(var);
            lits.push(Lit::from_dimacs(literal as isize));
        }
        Ok(lits)
    }

    pub fn solve(&mut self) -> Result<SolveOutcome> {
        let interrupt = self.interrupt.clone().with_timeout(self.options.timeout);
        let start_time = Instant::now();

        let outcome = if interrupt.should_stop() {
            SolveOutcome::Interrupted
        } else if self
            .solver
            .solve()
            .map_err(|e| anyhow::anyhow!("Varisat error: {}", e))?
        {
            let model = self
                .solver
                .model()
                .ok_or_else(|| anyhow::anyhow!("Varisat reported SAT without a model"))?;
            let assignment: HashMap<i32, bool> = model
                .iter()
                .map(|lit| (lit.var().to_dimacs() as i32, lit.is_positive()))
                .collect();
            SolveOutcome::Satisfiable(SolverSolution {
                assignment,
                solve_time: start_time.elapsed(),
            })
        } else {
            SolveOutcome::Unsatisfiable
        };

        self.last_solve_time = start_time.elapsed();
        self.last_result = Some(outcome.result_type());
        Ok(outcome)
    }

    pub fn statistics(&self) -> SolverStatistics {
        SolverStatistics {
            variable_count: self.variable_count,
            clause_count: self.clause_count,
            solve_time: self.last_solve_time,
            result: self.last_result,
        }
    }

    pub fn reset(&mut self) {
        self.solver = Solver::new();
        self.variable_count = 0;
        self.clause_count = 0;
        self.last_solve_time = Duration::ZERO;
        self.last_result = None;
    }

    pub fn variable_count(&self) -> usize {
        self.variable_count
    }

    pub fn clause_count(&self) -> usize {
        self.clause_count
    }

    pub fn configure(&mut self, options: &SolverOptions) {
        self.options = options.clone();
    }
}

impl Default for VarisatSatSolver {
    fn default() -> Self {
        Self::new()
    }
}
