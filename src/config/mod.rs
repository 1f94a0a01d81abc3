//! Configuration management for the ice planner

pub mod settings;

pub use settings::{
    AtMostOneEncoding, CliOverrides, EncodingConfig, InputConfig, OutputConfig, OutputFormat, ParallelConfig,
    PlanningConfig, PushModel, SearchConfig, Settings, SolverBackend, SolverConfig,
};
