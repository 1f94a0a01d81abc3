//! Plan representation and persistence

use super::Trajectory;
use crate::config::PushModel;
use crate::world::Level;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Which engine produced a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanMethod {
    Search,
    Sat,
}

impl std::fmt::Display for PlanMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlanMethod::Search => write!(f, "search"),
            PlanMethod::Sat => write!(f, "sat"),
        }
    }
}

/// A trajectory together with the level it solves and how it was found
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub level: Level,
    pub method: PlanMethod,
    pub push_model: PushModel,
    pub trajectory: Trajectory,
    /// Time taken to find this plan
    #[serde(skip)]
    pub solve_time: Duration,
    pub metadata: PlanMetadata,
}

/// Metadata about a plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanMetadata {
    /// Identifier derived from the level and the move sequence
    pub id: String,
    pub moves: usize,
    /// Moves that displaced at least one box
    pub pushes: usize,
    /// Cells travelled by the robot, summed over all moves
    pub robot_distance: usize,
    /// Cells travelled by all boxes combined
    pub box_distance: usize,
    /// Search: nodes expanded. SAT: horizons attempted.
    pub effort: usize,
    pub solve_time_ms: u64,
}

impl Plan {
    pub fn new(
        level: Level,
        method: PlanMethod,
        push_model: PushModel,
        trajectory: Trajectory,
        solve_time: Duration,
        effort: usize,
    ) -> Self {
        let metadata = PlanMetadata::analyze(&level, &trajectory, solve_time, effort);
        Self {
            level,
            method,
            push_model,
            trajectory,
            solve_time,
            metadata,
        }
    }

    pub fn moves(&self) -> usize {
        self.trajectory.horizon()
    }

    /// Get a summary of the plan
    pub fn summary(&self) -> PlanSummary {
        PlanSummary {
            id: self.metadata.id.clone(),
            method: self.method,
            moves: self.metadata.moves,
            pushes: self.metadata.pushes,
            move_string: self.trajectory.move_string(),
            solve_time_ms: self.solve_time.as_millis() as u64,
            effort: self.metadata.effort,
        }
    }

    /// Convert to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Create from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut plan: Plan = serde_json::from_str(json)?;
        plan.solve_time = Duration::from_millis(plan.metadata.solve_time_ms);
        Ok(plan)
    }

    /// Save to file
    pub fn save_to_file<P: AsRef<std::path::Path>>(&self, path: P) -> anyhow::Result<()> {
        let json = self.to_json()?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load from file
    pub fn load_from_file<P: AsRef<std::path::Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_json(&content)?)
    }

    /// Step-by-step ASCII rendering of the trajectory
    pub fn format_steps(&self) -> String {
        let mut result = String::new();

        result.push_str(&format!(
            "Plan {} - {} moves via {}\n",
            self.metadata.id,
            self.moves(),
            self.method
        ));
        result.push_str(&format!("Solve time: {:.3}s\n\n", self.solve_time.as_secs_f64()));

        let states = &self.trajectory.states;
        if let Some(start) = states.first() {
            result.push_str("Step 0 (start):\n");
            result.push_str(&self.level.render(start));
            result.push('\n');
        }
        for (t, (direction, state)) in self.trajectory.moves.iter().zip(states.iter().skip(1)).enumerate() {
            result.push_str(&format!("Step {} ({}):\n", t + 1, direction));
            result.push_str(&self.level.render(state));
            result.push('\n');
        }

        result
    }
}

impl PlanMetadata {
    pub fn analyze(level: &Level, trajectory: &Trajectory, solve_time: Duration, effort: usize) -> Self {
        let mut pushes = 0;
        let mut robot_distance = 0;
        let mut box_distance = 0;

        for pair in trajectory.states.windows(2) {
            let (before, after) = (&pair[0], &pair[1]);
            robot_distance += before.robot.manhattan(after.robot);
            let moved: usize = before
                .boxes
                .iter()
                .zip(&after.boxes)
                .map(|(a, b)| a.manhattan(*b))
                .sum();
            if moved > 0 {
                pushes += 1;
            }
            box_distance += moved;
        }

        Self {
            id: Self::generate_id(level, trajectory),
            moves: trajectory.horizon(),
            pushes,
            robot_distance,
            box_distance,
            effort,
            solve_time_ms: solve_time.as_millis() as u64,
        }
    }

    fn generate_id(level: &Level, trajectory: &Trajectory) -> String {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        level.to_string().hash(&mut hasher);
        trajectory.moves.hash(&mut hasher);

        format!("plan_{:x}", hasher.finish())
    }
}

/// Summary information about a plan
#[derive(Debug, Clone)]
pub struct PlanSummary {
    pub id: String,
    pub method: PlanMethod,
    pub moves: usize,
    pub pushes: usize,
    pub move_string: String,
    pub solve_time_ms: u64,
    pub effort: usize,
}

impl std::fmt::Display for PlanSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Plan {} ({}): {} moves, {} pushes, {}ms [{}]",
            self.id, self.method, self.moves, self.pushes, self.solve_time_ms, self.move_string
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{Cell, Direction, Simulator};

    fn sample_plan() -> Plan {
        let level = Level::parse("S.B.\n...G\n").unwrap();
        let sim = Simulator::new(&level.grid, PushModel::Chain);
        let moves = vec![Direction::Right, Direction::Down];
        let states = sim.replay(&level.initial_configuration(), &moves);
        let trajectory = Trajectory::new(moves, states);
        Plan::new(
            level,
            PlanMethod::Search,
            PushModel::Chain,
            trajectory,
            Duration::from_millis(12),
            7,
        )
    }

    #[test]
    fn test_summary() {
        let summary = sample_plan().summary();
        assert_eq!(summary.moves, 2);
        let text = summary.to_string();
        assert!(text.contains("2 moves, 1 pushes, 12ms [RD]"));
    }

    #[test]
    fn test_metadata() {
        let plan = sample_plan();
        // Right: robot to (0,2) and box to (0,3); Down: robot to (1,2)
        assert_eq!(plan.moves(), 2);
        assert_eq!(plan.metadata.pushes, 1);
        assert_eq!(plan.metadata.robot_distance, 3);
        assert_eq!(plan.metadata.box_distance, 1);
        assert_eq!(plan.trajectory.last().robot, Cell::new(1, 2));
        assert!(plan.metadata.id.starts_with("plan_"));
    }

    #[test]
    fn test_json_roundtrip() {
        let plan = sample_plan();
        let json = plan.to_json().unwrap();
        assert!(json.contains("\"method\": \"search\""));

        let loaded = Plan::from_json(&json).unwrap();
        assert_eq!(loaded.trajectory, plan.trajectory);
        assert_eq!(loaded.level, plan.level);
        assert_eq!(loaded.solve_time, Duration::from_millis(12));
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.json");
        let plan = sample_plan();

        plan.save_to_file(&path).unwrap();
        let loaded = Plan::load_from_file(&path).unwrap();
        assert_eq!(loaded.metadata.id, plan.metadata.id);
    }

    #[test]
    fn test_format_steps() {
        let text = sample_plan().format_steps();
        assert!(text.contains("Step 0 (start):"));
        assert!(text.contains("Step 1 (right):"));
        assert!(text.contains("..RB\n"));
        assert!(text.contains("..RG\n"));
    }
}
