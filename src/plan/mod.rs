//! Planning engines, trajectories and plan handling

pub mod driver;
pub mod problem;
pub mod search;
pub mod solution;
pub mod trajectory;
pub mod validator;

pub use driver::HorizonDriver;
pub use problem::{ComparisonReport, EngineRun, PlanningProblem};
pub use search::{SearchEngine, SearchStatistics};
pub use solution::{Plan, PlanMethod, PlanSummary};
pub use trajectory::Trajectory;
pub use validator::{TrajectoryValidator, ValidationResult};
