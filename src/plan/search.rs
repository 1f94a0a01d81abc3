//! Explicit-state breadth-first search over configurations

use super::Trajectory;
use crate::error::{PlanError, PlanResult};
use crate::world::{Cell, ConfigKey, Configuration, Direction, Simulator};
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use std::time::{Duration, Instant};
use tracing::{debug, info};

const PROGRESS_INTERVAL: usize = 10_000;

/// A search node stored in the arena; `parent` indexes back into it
#[derive(Debug, Clone)]
struct Node {
    config: Configuration,
    parent: Option<usize>,
    via: Option<Direction>,
    depth: usize,
}

/// Counters reported by the last search run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchStatistics {
    /// Nodes taken off the frontier
    pub nodes_expanded: usize,
    /// Distinct configurations discovered, including the start
    pub nodes_generated: usize,
    pub max_frontier: usize,
    pub max_depth_reached: usize,
    #[serde(skip)]
    pub elapsed: Duration,
}

/// Breadth-first planner driven by the simulator
pub struct SearchEngine<'g> {
    simulator: Simulator<'g>,
    depth_limit: usize,
    max_nodes: Option<usize>,
    statistics: SearchStatistics,
}

impl<'g> SearchEngine<'g> {
    pub fn new(simulator: Simulator<'g>, depth_limit: usize) -> Self {
        Self {
            simulator,
            depth_limit,
            max_nodes: None,
            statistics: SearchStatistics::default(),
        }
    }

    /// Stop with `ResourceExhausted` once this many configurations are known
    pub fn with_node_limit(mut self, max_nodes: Option<usize>) -> Self {
        self.max_nodes = max_nodes;
        self
    }

    pub fn statistics(&self) -> &SearchStatistics {
        &self.statistics
    }

    /// Find a minimum-move trajectory from `start` to a configuration with the
    /// robot on `goal`.
    ///
    /// An empty frontier and an exhausted depth limit are both reported as
    /// `NoSolution { bound: depth_limit }`; callers that need to know whether a
    /// larger limit could help must search again with it.
    pub fn search(&mut self, start: &Configuration, goal: Cell) -> PlanResult<Trajectory> {
        let grid = self.simulator.grid();
        start.validate(grid)?;
        if !grid.is_free(goal) {
            return Err(PlanError::InvalidInput(format!(
                "goal cell {} is outside the grid or on a wall",
                goal
            )));
        }

        let started = Instant::now();
        self.statistics = SearchStatistics::default();
        info!(
            start = %start.robot,
            goal = %goal,
            boxes = start.boxes.len(),
            depth_limit = self.depth_limit,
            "starting breadth-first search"
        );

        let mut arena = vec![Node {
            config: start.clone(),
            parent: None,
            via: None,
            depth: 0,
        }];
        let mut visited: HashSet<ConfigKey> = HashSet::new();
        visited.insert(start.canonical_key());
        let mut frontier = VecDeque::from([0usize]);
        self.statistics.nodes_generated = 1;

        let result = loop {
            let Some(current) = frontier.pop_front() else {
                break Err(PlanError::NoSolution { bound: self.depth_limit });
            };
            self.statistics.nodes_expanded += 1;

            if self.statistics.nodes_expanded % PROGRESS_INTERVAL == 0 {
                debug!(
                    expanded = self.statistics.nodes_expanded,
                    frontier = frontier.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "search progress"
                );
            }

            let depth = arena[current].depth;
            self.statistics.max_depth_reached = self.statistics.max_depth_reached.max(depth);

            if arena[current].config.robot == goal {
                break Ok(Self::reconstruct(&arena, current));
            }

            if depth >= self.depth_limit {
                continue;
            }

            for direction in Direction::ALL {
                let successor = self.simulator.step(&arena[current].config, direction);
                if !visited.insert(successor.canonical_key()) {
                    continue;
                }

                if let Some(limit) = self.max_nodes {
                    if visited.len() > limit {
                        self.statistics.elapsed = started.elapsed();
                        return Err(PlanError::ResourceExhausted {
                            reason: format!("search visited more than {} configurations", limit),
                        });
                    }
                }

                arena.push(Node {
                    config: successor,
                    parent: Some(current),
                    via: Some(direction),
                    depth: depth + 1,
                });
                frontier.push_back(arena.len() - 1);
                self.statistics.nodes_generated += 1;
            }

            self.statistics.max_frontier = self.statistics.max_frontier.max(frontier.len());
        };

        self.statistics.elapsed = started.elapsed();
        match &result {
            Ok(trajectory) => info!(
                moves = trajectory.horizon(),
                expanded = self.statistics.nodes_expanded,
                elapsed_ms = self.statistics.elapsed.as_millis() as u64,
                "search found a plan"
            ),
            Err(_) => info!(
                expanded = self.statistics.nodes_expanded,
                elapsed_ms = self.statistics.elapsed.as_millis() as u64,
                "search exhausted without reaching the goal"
            ),
        }
        result
    }

    /// Walk parent links from `goal_node` back to the root
    fn reconstruct(arena: &[Node], goal_node: usize) -> Trajectory {
        let mut states = Vec::new();
        let mut moves = Vec::new();
        let mut cursor = Some(goal_node);

        while let Some(index) = cursor {
            let node = &arena[index];
            states.push(node.config.clone());
            if let Some(direction) = node.via {
                moves.push(direction);
            }
            cursor = node.parent;
        }

        states.reverse();
        moves.reverse();
        Trajectory::new(moves, states)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PushModel;
    use crate::world::{CellKind, Grid};

    fn binomial(n: usize, k: usize) -> usize {
        if k > n {
            return 0;
        }
        (0..k).fold(1, |acc, i| acc * (n - i) / (i + 1))
    }

    #[test]
    fn test_start_on_goal_needs_no_moves() {
        let grid = Grid::new(3, 3);
        let mut engine = SearchEngine::new(Simulator::new(&grid, PushModel::Chain), 5);
        let start = Configuration::new(Cell::new(1, 1), vec![]);

        let trajectory = engine.search(&start, Cell::new(1, 1)).unwrap();
        assert_eq!(trajectory.horizon(), 0);
        assert_eq!(engine.statistics().nodes_expanded, 1);
    }

    #[test]
    fn test_open_grid_corner_reached_by_boundary_stops() {
        let grid = Grid::new(3, 3);
        let mut engine = SearchEngine::new(Simulator::new(&grid, PushModel::Chain), 4);
        let start = Configuration::new(Cell::new(0, 0), vec![]);

        let trajectory = engine.search(&start, Cell::new(2, 2)).unwrap();
        assert_eq!(trajectory.horizon(), 2);
        assert_eq!(trajectory.last().robot, Cell::new(2, 2));
    }

    #[test]
    fn test_open_grid_center_is_unreachable() {
        let grid = Grid::new(3, 3);
        let mut engine = SearchEngine::new(Simulator::new(&grid, PushModel::Chain), 10);
        let start = Configuration::new(Cell::new(0, 0), vec![]);

        let err = engine.search(&start, Cell::new(1, 1)).unwrap_err();
        assert_eq!(err, PlanError::NoSolution { bound: 10 });
    }

    #[test]
    fn test_walls_create_stopping_points() {
        // S . #
        // . G .
        // . # .
        let mut grid = Grid::new(3, 3);
        grid.set(0, 2, CellKind::Wall).unwrap();
        grid.set(2, 1, CellKind::Wall).unwrap();
        let mut engine = SearchEngine::new(Simulator::new(&grid, PushModel::Chain), 6);
        let start = Configuration::new(Cell::new(0, 0), vec![]);

        let trajectory = engine.search(&start, Cell::new(1, 1)).unwrap();
        assert_eq!(trajectory.moves, vec![Direction::Right, Direction::Down]);
        assert_eq!(
            trajectory.robot_path(),
            vec![Cell::new(0, 0), Cell::new(0, 1), Cell::new(1, 1)]
        );
    }

    #[test]
    fn test_pushing_a_box_creates_a_stop() {
        // S . B . .    the goal (0,3) is reachable once the box sits at (0,4)
        let grid = Grid::new(5, 1);
        let mut engine = SearchEngine::new(Simulator::new(&grid, PushModel::Slide), 6);
        let start = Configuration::new(Cell::new(0, 0), vec![Cell::new(0, 2)]);

        let trajectory = engine.search(&start, Cell::new(0, 3)).unwrap();
        assert_eq!(trajectory.moves, vec![Direction::Right]);
        assert_eq!(trajectory.last().boxes, vec![Cell::new(0, 4)]);
    }

    #[test]
    fn test_depth_limit_hides_deeper_plans() {
        let mut grid = Grid::new(3, 3);
        grid.set(0, 2, CellKind::Wall).unwrap();
        grid.set(2, 1, CellKind::Wall).unwrap();
        let start = Configuration::new(Cell::new(0, 0), vec![]);

        let mut shallow = SearchEngine::new(Simulator::new(&grid, PushModel::Chain), 1);
        assert!(shallow.search(&start, Cell::new(1, 1)).unwrap_err().is_no_solution());
    }

    #[test]
    fn test_node_limit_reports_resource_exhaustion() {
        let grid = Grid::new(6, 6);
        let mut engine = SearchEngine::new(Simulator::new(&grid, PushModel::Chain), 50).with_node_limit(Some(2));
        let start = Configuration::new(Cell::new(0, 0), vec![Cell::new(3, 3)]);

        let err = engine.search(&start, Cell::new(2, 2)).unwrap_err();
        assert!(err.is_resource_exhausted());
    }

    #[test]
    fn test_invalid_input_rejected_up_front() {
        let mut grid = Grid::new(3, 3);
        grid.set(1, 1, CellKind::Wall).unwrap();
        let mut engine = SearchEngine::new(Simulator::new(&grid, PushModel::Chain), 5);

        let start = Configuration::new(Cell::new(0, 0), vec![]);
        assert!(matches!(
            engine.search(&start, Cell::new(1, 1)),
            Err(PlanError::InvalidInput(_))
        ));

        let boxed = Configuration::new(Cell::new(0, 0), vec![Cell::new(9, 9)]);
        assert!(matches!(
            engine.search(&boxed, Cell::new(2, 2)),
            Err(PlanError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_expansions_bounded_by_state_space() {
        // Unreachable goal forces a full sweep of the reachable space
        let mut grid = Grid::new(4, 3);
        grid.set(1, 1, CellKind::Wall).unwrap();
        let start = Configuration::new(Cell::new(0, 0), vec![Cell::new(2, 2)]);
        let mut engine = SearchEngine::new(Simulator::new(&grid, PushModel::Chain), 1_000);

        let free = grid.free_count();
        let bound = free * binomial(free, start.boxes.len());
        let _ = engine.search(&start, Cell::new(1, 2));
        assert!(engine.statistics().nodes_expanded <= bound);
        assert!(engine.statistics().nodes_generated <= bound);
    }

    #[test]
    fn test_trajectory_replays_through_simulator() {
        let level = crate::world::Level::parse("S...#\n.B...\n...#.\n#...G\n").unwrap();
        let sim = Simulator::new(&level.grid, PushModel::Chain);
        let mut engine = SearchEngine::new(sim, 12);

        let trajectory = engine.search(&level.initial_configuration(), level.goal).unwrap();
        let replayed = sim.replay(trajectory.initial(), &trajectory.moves);
        assert_eq!(replayed, trajectory.states);
        assert_eq!(trajectory.last().robot, level.goal);
    }
}
