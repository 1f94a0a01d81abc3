//! Configuration settings for the ice planner

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub planning: PlanningConfig,
    pub search: SearchConfig,
    pub solver: SolverConfig,
    pub encoding: EncodingConfig,
    pub input: InputConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanningConfig {
    /// Largest horizon the SAT driver will try
    pub max_horizon: usize,
    pub push_model: PushModel,
}

/// How a slide that runs into a box resolves.
///
/// `Chain` is the default. `Slide` gives the classic ice-puzzle push where the
/// struck box keeps sliding, and is the model to pick when reproducing plans
/// made for that rule set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PushModel {
    /// The contiguous run of boxes shifts one cell; the robot takes the first box's cell
    Chain,
    /// Only the first box moves, sliding until blocked; the robot stops behind it
    Slide,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Nodes at this depth are not expanded
    pub depth_limit: usize,
    /// Cap on distinct configurations kept in the visited set
    pub max_nodes: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverConfig {
    pub backend: SolverBackend,
    /// Per-horizon limit handed to the SAT backend
    pub timeout_seconds: Option<u64>,
    /// Replay every decoded plan through the simulator before returning it
    pub verify_plans: bool,
    pub parallel: ParallelConfig,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SolverBackend {
    Cadical,
    Varisat,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParallelConfig {
    pub enabled: bool,
    /// Worker threads; 0 lets rayon pick
    pub threads: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodingConfig {
    pub at_most_one: AtMostOneEncoding,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AtMostOneEncoding {
    Pairwise,
    Sequential,
    /// Pairwise for small groups, sequential counter otherwise
    Auto,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    pub level_file: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub save_plans: bool,
    pub output_directory: PathBuf,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    Text,
    Json,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            planning: PlanningConfig {
                max_horizon: 20,
                push_model: PushModel::Chain,
            },
            search: SearchConfig {
                depth_limit: 50,
                max_nodes: Some(5_000_000),
            },
            solver: SolverConfig {
                backend: SolverBackend::Cadical,
                timeout_seconds: None,
                verify_plans: true,
                parallel: ParallelConfig {
                    enabled: false,
                    threads: 0,
                },
            },
            encoding: EncodingConfig {
                at_most_one: AtMostOneEncoding::Auto,
            },
            input: InputConfig {
                level_file: PathBuf::from("input/levels/icepath.txt"),
            },
            output: OutputConfig {
                format: OutputFormat::Text,
                save_plans: false,
                output_directory: PathBuf::from("output/plans"),
            },
        }
    }
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let settings: Settings = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to a YAML file
    pub fn to_file(&self, path: &PathBuf) -> Result<()> {
        let content = serde_yaml::to_string(self).context("Failed to serialize settings")?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Validate value ranges. The level file is checked when it is loaded.
    pub fn validate(&self) -> Result<()> {
        if self.planning.max_horizon == 0 {
            anyhow::bail!("Maximum horizon must be positive");
        }

        if self.search.max_nodes == Some(0) {
            anyhow::bail!("Search node limit must be positive when set");
        }

        if self.solver.timeout_seconds == Some(0) {
            anyhow::bail!("Solver timeout must be positive when set");
        }

        Ok(())
    }

    /// Merge settings with command line overrides
    pub fn merge_with_cli(&mut self, cli_overrides: &CliOverrides) {
        if let Some(max_horizon) = cli_overrides.max_horizon {
            self.planning.max_horizon = max_horizon;
        }
        if let Some(depth_limit) = cli_overrides.depth_limit {
            self.search.depth_limit = depth_limit;
        }
        if let Some(push_model) = cli_overrides.push_model {
            self.planning.push_model = push_model;
        }
        if let Some(parallel) = cli_overrides.parallel {
            self.solver.parallel.enabled = parallel;
        }
        if let Some(ref level_file) = cli_overrides.level_file {
            self.input.level_file = level_file.clone();
        }
        if let Some(ref output_dir) = cli_overrides.output_dir {
            self.output.output_directory = output_dir.clone();
        }
    }
}

/// Command line overrides for settings
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub max_horizon: Option<usize>,
    pub depth_limit: Option<usize>,
    pub push_model: Option<PushModel>,
    pub parallel: Option<bool>,
    pub level_file: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_settings_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.planning.push_model, PushModel::Chain);
        assert_eq!(settings.solver.backend, SolverBackend::Cadical);
    }

    #[test]
    fn test_yaml_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config/default.yaml");

        let mut settings = Settings::default();
        settings.planning.push_model = PushModel::Slide;
        settings.solver.parallel.enabled = true;
        settings.to_file(&path).unwrap();

        let loaded = Settings::from_file(&path).unwrap();
        assert_eq!(loaded.planning.push_model, PushModel::Slide);
        assert!(loaded.solver.parallel.enabled);
        assert_eq!(loaded.encoding.at_most_one, AtMostOneEncoding::Auto);
    }

    #[test]
    fn test_yaml_uses_snake_case_names() {
        let yaml = serde_yaml::to_string(&Settings::default()).unwrap();
        assert!(yaml.contains("push_model: chain"));
        assert!(yaml.contains("backend: cadical"));
    }

    #[test]
    fn test_push_model_from_yaml() {
        let yaml = serde_yaml::to_string(&Settings::default())
            .unwrap()
            .replace("push_model: chain", "push_model: slide");
        let settings: Settings = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(settings.planning.push_model, PushModel::Slide);
        assert_eq!(Settings::default().planning.push_model, PushModel::Chain);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut settings = Settings::default();
        settings.planning.max_horizon = 0;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.solver.timeout_seconds = Some(0);
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_cli_overrides() {
        let mut settings = Settings::default();
        let overrides = CliOverrides {
            max_horizon: Some(7),
            push_model: Some(PushModel::Slide),
            parallel: Some(true),
            level_file: Some(PathBuf::from("maps/a.txt")),
            ..Default::default()
        };
        settings.merge_with_cli(&overrides);

        assert_eq!(settings.planning.max_horizon, 7);
        assert_eq!(settings.planning.push_model, PushModel::Slide);
        assert!(settings.solver.parallel.enabled);
        assert_eq!(settings.input.level_file, PathBuf::from("maps/a.txt"));
        assert_eq!(settings.search.depth_limit, 50);
    }
}
