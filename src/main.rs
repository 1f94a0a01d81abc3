//! Main CLI application for the ice push planner

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use ice_push_planner::{
    config::{CliOverrides, PushModel, Settings},
    plan::{Plan, PlanningProblem, TrajectoryValidator},
    utils::{ColorOutput, PlanFormatter},
    world::{create_example_levels, load_level_from_file, Simulator},
    PlanResult,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ice_push_planner")]
#[command(about = "Ice sliding planner with pushable boxes (BFS and SAT)")]
#[command(version = "0.1.0")]
struct Cli {
    /// Verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModelArg {
    Chain,
    Slide,
}

impl From<ModelArg> for PushModel {
    fn from(arg: ModelArg) -> Self {
        match arg {
            ModelArg::Chain => PushModel::Chain,
            ModelArg::Slide => PushModel::Slide,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Find a shortest plan with the SAT horizon driver
    Solve {
        /// Configuration file path
        #[arg(short, long, default_value = "config/default.yaml")]
        config: PathBuf,

        /// Level map file (overrides config)
        #[arg(short, long)]
        level: Option<PathBuf>,

        /// Largest horizon to try (overrides config)
        #[arg(long)]
        max_horizon: Option<usize>,

        /// Box push model (overrides config)
        #[arg(long, value_enum)]
        push_model: Option<ModelArg>,

        /// Solve horizons concurrently
        #[arg(long)]
        parallel: bool,

        /// Output directory (overrides config)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the map after every move
        #[arg(long)]
        show_steps: bool,
    },

    /// Find a shortest plan with breadth-first search
    Search {
        /// Configuration file path
        #[arg(short, long, default_value = "config/default.yaml")]
        config: PathBuf,

        /// Level map file (overrides config)
        #[arg(short, long)]
        level: Option<PathBuf>,

        /// Search depth limit (overrides config)
        #[arg(short, long)]
        depth_limit: Option<usize>,

        /// Box push model (overrides config)
        #[arg(long, value_enum)]
        push_model: Option<ModelArg>,

        /// Output directory (overrides config)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the map after every move
        #[arg(long)]
        show_steps: bool,
    },

    /// Run both engines on the same level and compare them
    Compare {
        /// Configuration file path
        #[arg(short, long, default_value = "config/default.yaml")]
        config: PathBuf,

        /// Level map file (overrides config)
        #[arg(short, long)]
        level: Option<PathBuf>,

        /// Largest horizon to try (overrides config)
        #[arg(long)]
        max_horizon: Option<usize>,

        /// Search depth limit (overrides config)
        #[arg(short, long)]
        depth_limit: Option<usize>,

        /// Box push model (overrides config)
        #[arg(long, value_enum)]
        push_model: Option<ModelArg>,
    },

    /// Replay a saved JSON plan and check it against the physics
    Validate {
        /// Plan file produced with JSON output
        #[arg(short, long)]
        plan: PathBuf,

        /// Level map to replay against instead of the one stored in the plan
        #[arg(short, long)]
        level: Option<PathBuf>,

        /// Print the map after every move
        #[arg(long)]
        show_steps: bool,
    },

    /// Create example configuration and level files
    Setup {
        /// Directory to create files in
        #[arg(short, long, default_value = ".")]
        directory: PathBuf,

        /// Force overwrite existing files
        #[arg(short, long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Solve {
            config,
            level,
            max_horizon,
            push_model,
            parallel,
            output,
            show_steps,
        } => {
            let overrides = CliOverrides {
                max_horizon,
                push_model: push_model.map(Into::into),
                parallel: parallel.then_some(true),
                level_file: level,
                output_dir: output,
                ..Default::default()
            };
            solve_command(&config, &overrides, show_steps, cli.verbose)
        }
        Commands::Search {
            config,
            level,
            depth_limit,
            push_model,
            output,
            show_steps,
        } => {
            let overrides = CliOverrides {
                depth_limit,
                push_model: push_model.map(Into::into),
                level_file: level,
                output_dir: output,
                ..Default::default()
            };
            search_command(&config, &overrides, show_steps)
        }
        Commands::Compare {
            config,
            level,
            max_horizon,
            depth_limit,
            push_model,
        } => {
            let overrides = CliOverrides {
                max_horizon,
                depth_limit,
                push_model: push_model.map(Into::into),
                level_file: level,
                ..Default::default()
            };
            compare_command(&config, &overrides)
        }
        Commands::Validate { plan, level, show_steps } => validate_command(&plan, level.as_deref(), show_steps),
        Commands::Setup { directory, force } => setup_command(directory, force),
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("ice_push_planner=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_settings(config_path: &Path, overrides: &CliOverrides) -> Result<Settings> {
    let mut settings = if config_path.exists() {
        Settings::from_file(&config_path.to_path_buf())
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?
    } else {
        println!(
            "{}",
            ColorOutput::warning(&format!("Config file {} not found, using defaults", config_path.display()))
        );
        Settings::default()
    };

    settings.merge_with_cli(overrides);
    settings.validate().context("Configuration validation failed")?;
    Ok(settings)
}

fn solve_command(config_path: &Path, overrides: &CliOverrides, show_steps: bool, verbose: bool) -> Result<()> {
    println!("{}", ColorOutput::info("🧊 Starting SAT planner"));

    let settings = load_settings(config_path, overrides)?;
    let problem = PlanningProblem::new(settings.clone()).context("Failed to create planning problem")?;

    println!("Level ({}):", settings.input.level_file.display());
    println!("{}", problem.level());

    if verbose {
        println!("{}", problem.estimate_complexity());
    }

    report_plan(problem.solve_with_sat(), &settings, show_steps)
}

fn search_command(config_path: &Path, overrides: &CliOverrides, show_steps: bool) -> Result<()> {
    println!("{}", ColorOutput::info("🧊 Starting breadth-first search"));

    let settings = load_settings(config_path, overrides)?;
    let problem = PlanningProblem::new(settings.clone()).context("Failed to create planning problem")?;

    println!("Level ({}):", settings.input.level_file.display());
    println!("{}", problem.level());

    report_plan(problem.solve_with_search(), &settings, show_steps)
}

/// Print a planner outcome and save the plan if configured
fn report_plan(result: PlanResult<Plan>, settings: &Settings, show_steps: bool) -> Result<()> {
    let plan = match result {
        Ok(plan) => plan,
        Err(e) if e.is_no_solution() || e.is_resource_exhausted() => {
            println!("{}", ColorOutput::warning(&format!("❌ {}", e)));
            return Ok(());
        }
        Err(e) => return Err(e).context("Planning failed"),
    };

    println!(
        "{}",
        ColorOutput::success(&format!(
            "✅ Found a {}-move plan in {:.3}s",
            plan.moves(),
            plan.solve_time.as_secs_f64()
        ))
    );
    println!("\n{}", PlanFormatter::format_plan(&plan, show_steps));

    if settings.output.save_plans {
        PlanFormatter::save_plans(
            std::slice::from_ref(&plan),
            &settings.output.output_directory,
            &settings.output.format,
        )
        .context("Failed to save plan")?;
        println!(
            "{}",
            ColorOutput::success(&format!("Plan saved to {}", settings.output.output_directory.display()))
        );
    }

    Ok(())
}

fn compare_command(config_path: &Path, overrides: &CliOverrides) -> Result<()> {
    println!("{}", ColorOutput::info("⚖️  Comparing search and SAT planners"));

    let settings = load_settings(config_path, overrides)?;
    let problem = PlanningProblem::new(settings).context("Failed to create planning problem")?;
    println!("{}", problem.level());

    let report = problem.compare();
    println!("{}", PlanFormatter::format_comparison(&report));

    for run in [&report.search, &report.sat] {
        if let Err(e) = &run.result {
            println!("{}", ColorOutput::warning(&format!("{}: {}", run.method, e)));
        }
    }

    match report.moves_agree() {
        Some(true) => println!("{}", ColorOutput::success("✅ Both engines found plans of the same length")),
        Some(false) => println!("{}", ColorOutput::error("❌ Engines disagree on the shortest plan length")),
        None => {}
    }

    Ok(())
}

fn validate_command(plan_path: &Path, level_path: Option<&Path>, show_steps: bool) -> Result<()> {
    println!("{}", ColorOutput::info("🔍 Validating plan..."));

    let plan = Plan::load_from_file(plan_path)
        .with_context(|| format!("Failed to load plan from {}", plan_path.display()))?;
    let level = match level_path {
        Some(path) => load_level_from_file(path)?,
        None => plan.level.clone(),
    };

    let simulator = Simulator::new(&level.grid, plan.push_model);
    let result = TrajectoryValidator::new(simulator).validate(
        &plan.trajectory,
        &level.initial_configuration(),
        level.goal,
    );

    println!("{}", plan.summary());
    println!("{}", result);

    if result.is_valid {
        if show_steps {
            println!("{}", PlanFormatter::format_plan(&plan, true));
        }
        println!("{}", ColorOutput::success("✅ Plan is valid!"));
    } else {
        println!("{}", ColorOutput::error("❌ Plan is invalid"));
    }

    Ok(())
}

fn setup_command(directory: PathBuf, force: bool) -> Result<()> {
    println!("{}", ColorOutput::info("🛠️  Setting up project structure..."));

    let config_dir = directory.join("config");
    let input_dir = directory.join("input/levels");
    let output_dir = directory.join("output/plans");

    for dir in [&config_dir, &input_dir, &output_dir] {
        std::fs::create_dir_all(dir).with_context(|| format!("Failed to create directory {}", dir.display()))?;
    }

    let config_path = config_dir.join("default.yaml");
    if !config_path.exists() || force {
        Settings::default()
            .to_file(&config_path)
            .context("Failed to create default configuration")?;
        println!("Created: {}", config_path.display());
    } else {
        println!("Skipped: {} (already exists)", config_path.display());
    }

    create_example_levels(&input_dir).context("Failed to create example levels")?;
    println!("Created example levels in: {}", input_dir.display());

    let examples_dir = config_dir.join("examples");
    std::fs::create_dir_all(&examples_dir)?;

    // Boxes slide on after a push, as in the classic ice puzzles
    let mut slide_config = Settings::default();
    slide_config.planning.push_model = PushModel::Slide;
    slide_config.input.level_file = PathBuf::from("input/levels/push_to_stop.txt");
    slide_config.to_file(&examples_dir.join("slide.yaml"))?;

    let mut parallel_config = Settings::default();
    parallel_config.planning.max_horizon = 30;
    parallel_config.solver.parallel.enabled = true;
    parallel_config.solver.timeout_seconds = Some(60);
    parallel_config.output.save_plans = true;
    parallel_config.to_file(&examples_dir.join("parallel.yaml"))?;

    println!("Created example configurations in: {}", examples_dir.display());

    println!("\n{}", ColorOutput::success("✅ Setup complete!"));
    println!("\nNext steps:");
    println!("1. Edit configuration files in {}", config_dir.display());
    println!("2. Draw your own maps in {}", input_dir.display());
    println!("3. Run: cargo run -- solve --config config/default.yaml");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ice_push_planner::config::OutputFormat;
    use tempfile::tempdir;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from([
            "ice_push_planner",
            "solve",
            "--config",
            "test.yaml",
            "--max-horizon",
            "5",
            "--push-model",
            "slide",
            "--parallel",
        ]);
        assert!(cli.is_ok());

        let cli = Cli::try_parse_from(["ice_push_planner", "--verbose", "search", "--depth-limit", "9"]);
        assert!(cli.unwrap().verbose);

        assert!(Cli::try_parse_from(["ice_push_planner", "solve", "--push-model", "teleport"]).is_err());
    }

    #[test]
    fn test_setup_command() {
        let temp_dir = tempdir().unwrap();
        setup_command(temp_dir.path().to_path_buf(), false).unwrap();

        assert!(temp_dir.path().join("config/default.yaml").exists());
        assert!(temp_dir.path().join("config/examples/slide.yaml").exists());
        assert!(temp_dir.path().join("input/levels/icepath.txt").exists());
    }

    #[test]
    fn test_search_saves_and_validates_plan() {
        let temp_dir = tempdir().unwrap();
        let level_path = temp_dir.path().join("level.txt");
        std::fs::write(&level_path, "S.#\n.G.\n.#.\n").unwrap();

        let mut settings = Settings::default();
        settings.input.level_file = level_path.clone();
        settings.output.save_plans = true;
        settings.output.format = OutputFormat::Json;
        settings.output.output_directory = temp_dir.path().join("plans");
        let config_path = temp_dir.path().join("config.yaml");
        settings.to_file(&config_path).unwrap();

        search_command(&config_path, &CliOverrides::default(), false).unwrap();

        let saved: Vec<_> = std::fs::read_dir(temp_dir.path().join("plans"))
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect();
        assert_eq!(saved.len(), 1);
        validate_command(&saved[0], Some(&level_path), false).unwrap();
    }

    #[test]
    fn test_validate_tolerates_malformed_trajectory() {
        let temp_dir = tempdir().unwrap();
        let level = ice_push_planner::Level::parse("S.#\n.G.\n.#.\n").unwrap();
        let problem = PlanningProblem::with_level(Settings::default(), level).unwrap();
        let mut plan = problem.solve_with_search().unwrap();

        let extra = plan.trajectory.last().clone();
        plan.trajectory.states.push(extra);
        let plan_path = temp_dir.path().join("plan.json");
        plan.save_to_file(&plan_path).unwrap();

        validate_command(&plan_path, None, true).unwrap();
    }
}
