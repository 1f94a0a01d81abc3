//! Ice Push Planner
//!
//! Plans robot moves on an ice grid where every move slides until something
//! stops it, with boxes that can be pushed to create new stopping points. Two
//! engines answer the same question: breadth-first search over configurations
//! and a bounded-horizon SAT encoding solved for increasing horizons.

pub mod config;
pub mod error;
pub mod plan;
pub mod sat;
pub mod utils;
pub mod world;

pub use config::Settings;
pub use error::{PlanError, PlanResult};
pub use plan::{Plan, PlanningProblem, Trajectory};
pub use world::{Cell, Configuration, Direction, Grid, Level, Simulator};

use anyhow::Result;

/// Main entry point: load the configured level and plan with the SAT driver
pub fn solve_level(settings: Settings) -> Result<Plan> {
    let problem = PlanningProblem::new(settings)?;
    Ok(problem.solve_with_sat()?)
}
