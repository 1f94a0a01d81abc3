//! Display and output formatting utilities

use crate::config::OutputFormat;
use crate::error::PlanError;
use crate::plan::{ComparisonReport, EngineRun, Plan};
use crate::world::{Configuration, Level};
use anyhow::Result;
use std::path::Path;

/// Format plans for display
pub struct PlanFormatter;

impl PlanFormatter {
    /// Format a single plan for console output
    pub fn format_plan(plan: &Plan, show_steps: bool) -> String {
        let mut output = String::new();

        output.push_str(&format!("=== Plan {} ===\n", plan.metadata.id));
        output.push_str(&format!("Method: {} ({:?} pushes)\n", plan.method, plan.push_model));
        output.push_str(&format!("Solve Time: {:.3}s\n", plan.solve_time.as_secs_f64()));
        output.push_str(&format!("Moves: {} [{}]\n", plan.moves(), plan.trajectory.move_string()));
        output.push_str(&format!(
            "Pushes: {}, robot travel: {}, box travel: {}\n",
            plan.metadata.pushes, plan.metadata.robot_distance, plan.metadata.box_distance
        ));
        output.push('\n');

        if show_steps {
            let states = &plan.trajectory.states;
            if let Some(start) = states.first() {
                output.push_str("Start:\n");
                output.push_str(&Self::format_state_with_coords(&plan.level, start));
                output.push('\n');
            }
            for (t, (direction, state)) in plan.trajectory.moves.iter().zip(states.iter().skip(1)).enumerate() {
                output.push_str(&format!("Move {} ({}):\n", t + 1, direction));
                output.push_str(&Self::format_state_with_coords(&plan.level, state));
                output.push('\n');
            }
        } else {
            output.push_str("Initial State:\n");
            output.push_str(&plan.level.render(plan.trajectory.initial()));
            output.push('\n');
            output.push_str("Final State:\n");
            output.push_str(&plan.level.render(plan.trajectory.last()));
        }

        output
    }

    /// Format a state with row and column numbers
    pub fn format_state_with_coords(level: &Level, state: &Configuration) -> String {
        let mut output = String::new();

        output.push_str("   ");
        for col in 0..level.grid.width {
            output.push_str(&format!("{}", col % 10));
        }
        output.push('\n');

        for (row, line) in level.render(state).lines().enumerate() {
            output.push_str(&format!("{:2} {}\n", row, line));
        }

        output
    }

    /// Side-by-side report of the two engines
    pub fn format_comparison(report: &ComparisonReport) -> String {
        let mut output = String::new();

        output.push_str("Engine Comparison:\n");
        output.push_str("Engine | Status      | Time(ms) | Moves | Effort\n");
        output.push_str("-------|-------------|----------|-------|-----------------\n");
        output.push_str(&Self::format_engine_row("search", &report.search, "nodes expanded"));
        output.push_str(&Self::format_engine_row("sat", &report.sat, "horizons solved"));
        output.push('\n');

        let agreement = match report.moves_agree() {
            Some(true) => "yes",
            Some(false) => "NO",
            None => "n/a",
        };
        output.push_str(&format!("Move counts agree: {}\n", agreement));

        output
    }

    fn format_engine_row(name: &str, run: &EngineRun, effort_unit: &str) -> String {
        let status = match &run.result {
            Ok(_) => "solved",
            Err(PlanError::NoSolution { .. }) => "no solution",
            Err(PlanError::ResourceExhausted { .. }) => "exhausted",
            Err(_) => "error",
        };
        let moves = run
            .moves()
            .map_or_else(|| "-".to_string(), |moves| moves.to_string());

        format!(
            "{:6} | {:11} | {:8} | {:5} | {} {}\n",
            name,
            status,
            run.elapsed.as_millis(),
            moves,
            run.effort,
            effort_unit
        )
    }

    /// Save plans to files based on output format
    pub fn save_plans<P: AsRef<Path>>(plans: &[Plan], output_dir: P, format: &OutputFormat) -> Result<()> {
        let output_dir = output_dir.as_ref();
        std::fs::create_dir_all(output_dir)?;

        match format {
            OutputFormat::Text => {
                for plan in plans {
                    let filepath = output_dir.join(format!("{}_{}.txt", plan.method, plan.metadata.id));
                    std::fs::write(filepath, plan.format_steps())?;
                }
            }
            OutputFormat::Json => {
                for plan in plans {
                    let filepath = output_dir.join(format!("{}_{}.json", plan.method, plan.metadata.id));
                    plan.save_to_file(filepath)?;
                }
            }
        }

        Ok(())
    }
}

/// Color output utilities
pub struct ColorOutput;

impl ColorOutput {
    /// Format text with color (if terminal supports it)
    pub fn colored(text: &str, color: Color) -> String {
        if Self::supports_color() {
            format!("\x1b[{}m{}\x1b[0m", color.code(), text)
        } else {
            text.to_string()
        }
    }

    fn supports_color() -> bool {
        std::env::var("NO_COLOR").is_err() && (std::env::var("TERM").unwrap_or_default() != "dumb")
    }

    pub fn success(text: &str) -> String {
        Self::colored(text, Color::Green)
    }

    pub fn error(text: &str) -> String {
        Self::colored(text, Color::Red)
    }

    pub fn warning(text: &str) -> String {
        Self::colored(text, Color::Yellow)
    }

    pub fn info(text: &str) -> String {
        Self::colored(text, Color::Blue)
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Color {
    Red,
    Green,
    Yellow,
    Blue,
}

impl Color {
    fn code(self) -> u8 {
        match self {
            Color::Red => 31,
            Color::Green => 32,
            Color::Yellow => 33,
            Color::Blue => 34,
        }
    }
}
