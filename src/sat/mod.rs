//! SAT encoding of bounded-horizon ice planning

pub mod constraints;
pub mod decoder;
pub mod encoder;
pub mod solver;
pub mod solver_factory;
pub mod transitions;
pub mod variables;
pub mod varisat_solver;

pub use constraints::{Clause, ConstraintGenerator};
pub use decoder::TrajectoryDecoder;
pub use encoder::{ComplexityEstimate, EncodingStatistics, HorizonAttempt, HorizonOutcome, SatEncoder};
pub use solver::{Interrupt, SatSolver, SolveOutcome, SolverOptions, SolverSolution};
pub use solver_factory::UnifiedSatSolver;
pub use transitions::{transition_cases, TransitionCase};
pub use variables::VariableManager;
