//! Planning problem definition: one level, one set of settings, two engines

use super::{HorizonDriver, Plan, PlanMethod, SearchEngine};
use crate::config::Settings;
use crate::error::{PlanError, PlanResult};
use crate::sat::{ComplexityEstimate, SatEncoder};
use crate::world::{load_level_from_file, Level, Simulator};
use anyhow::{Context, Result};
use std::time::{Duration, Instant};
use tracing::info;

/// A validated level together with the settings used to solve it
pub struct PlanningProblem {
    settings: Settings,
    level: Level,
}

/// Outcome of running one engine
#[derive(Debug, Clone)]
pub struct EngineRun {
    pub method: PlanMethod,
    pub result: PlanResult<Plan>,
    pub elapsed: Duration,
    /// Nodes expanded for search, horizons solved for SAT
    pub effort: usize,
}

impl EngineRun {
    pub fn plan(&self) -> Option<&Plan> {
        self.result.as_ref().ok()
    }

    pub fn moves(&self) -> Option<usize> {
        self.plan().map(Plan::moves)
    }
}

/// Both engines run on the same problem
#[derive(Debug, Clone)]
pub struct ComparisonReport {
    pub search: EngineRun,
    pub sat: EngineRun,
}

impl ComparisonReport {
    /// `Some(true)` when both engines found plans of equal length
    pub fn moves_agree(&self) -> Option<bool> {
        match (self.search.moves(), self.sat.moves()) {
            (Some(a), Some(b)) => Some(a == b),
            _ => None,
        }
    }
}

impl PlanningProblem {
    /// Create a problem from the level file named in the settings
    pub fn new(settings: Settings) -> Result<Self> {
        let level = load_level_from_file(&settings.input.level_file).context("Failed to load level file")?;
        Ok(Self::with_level(settings, level)?)
    }

    /// Create a problem with an explicit level (useful for testing)
    pub fn with_level(settings: Settings, level: Level) -> PlanResult<Self> {
        level.initial_configuration().validate(&level.grid)?;
        if !level.grid.is_free(level.goal) {
            return Err(PlanError::InvalidInput(format!(
                "goal cell {} is outside the grid or on a wall",
                level.goal
            )));
        }
        Ok(Self { settings, level })
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Breadth-first search within `search.depth_limit`
    pub fn solve_with_search(&self) -> PlanResult<Plan> {
        self.run_search().result
    }

    /// SAT horizon driver up to `planning.max_horizon`
    pub fn solve_with_sat(&self) -> PlanResult<Plan> {
        self.run_sat().result
    }

    pub fn run_search(&self) -> EngineRun {
        let push_model = self.settings.planning.push_model;
        let simulator = Simulator::new(&self.level.grid, push_model);
        let mut engine = SearchEngine::new(simulator, self.settings.search.depth_limit)
            .with_node_limit(self.settings.search.max_nodes);

        let started = Instant::now();
        let result = engine.search(&self.level.initial_configuration(), self.level.goal);
        let elapsed = started.elapsed();
        let effort = engine.statistics().nodes_expanded;

        EngineRun {
            method: PlanMethod::Search,
            result: result.map(|trajectory| {
                Plan::new(self.level.clone(), PlanMethod::Search, push_model, trajectory, elapsed, effort)
            }),
            elapsed,
            effort,
        }
    }

    pub fn run_sat(&self) -> EngineRun {
        let push_model = self.settings.planning.push_model;
        let mut driver = HorizonDriver::new(SatEncoder::new(self.settings.clone(), &self.level));

        let started = Instant::now();
        let result = driver.find_plan();
        let elapsed = started.elapsed();
        let effort = driver.attempts().len();

        EngineRun {
            method: PlanMethod::Sat,
            result: result.map(|trajectory| {
                Plan::new(self.level.clone(), PlanMethod::Sat, push_model, trajectory, elapsed, effort)
            }),
            elapsed,
            effort,
        }
    }

    /// Run both engines and collect their results side by side
    pub fn compare(&self) -> ComparisonReport {
        let search = self.run_search();
        let sat = self.run_sat();

        let report = ComparisonReport { search, sat };
        info!(
            search_moves = ?report.search.moves(),
            sat_moves = ?report.sat.moves(),
            agree = ?report.moves_agree(),
            "compared engines"
        );
        report
    }

    /// Size estimate for the largest horizon the driver may try
    pub fn estimate_complexity(&self) -> ComplexityEstimate {
        SatEncoder::new(self.settings.clone(), &self.level).estimate_complexity(self.settings.planning.max_horizon)
    }
}
