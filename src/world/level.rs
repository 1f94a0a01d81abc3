//! A planning instance: grid, start, goal and boxes

use super::grid::{Cell, CellKind, Grid};
use super::physics::Configuration;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Grid plus the entity placements read from a map
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    pub grid: Grid,
    pub start: Cell,
    pub goal: Cell,
    pub boxes: Vec<Cell>,
}

impl Level {
    pub fn new(grid: Grid, start: Cell, goal: Cell, boxes: Vec<Cell>) -> Self {
        Self { grid, start, goal, boxes }
    }

    /// Configuration at time zero
    pub fn initial_configuration(&self) -> Configuration {
        Configuration::new(self.start, self.boxes.clone())
    }

    /// Parse a map where `#` is a wall, `.` or space is ice, `S` the start,
    /// `G` the goal and `B` a box.
    pub fn parse(content: &str) -> Result<Self> {
        let mut lines: Vec<&str> = content.lines().map(|line| line.trim_end()).collect();
        // Blank rows inside the map are ice; only trailing blank lines are dropped
        while lines.last().is_some_and(|line| line.is_empty()) {
            lines.pop();
        }

        if lines.is_empty() {
            anyhow::bail!("Map is empty or contains no rows");
        }

        let width = lines.iter().map(|line| line.chars().count()).max().unwrap_or(0);
        let mut rows = Vec::with_capacity(lines.len());
        let mut start = None;
        let mut goal = None;
        let mut boxes = Vec::new();

        for (row_idx, line) in lines.iter().enumerate() {
            let mut row = Vec::with_capacity(width);
            for (col_idx, ch) in line.chars().enumerate() {
                let here = Cell::new(row_idx, col_idx);
                let kind = match ch {
                    '#' => CellKind::Wall,
                    '.' | ' ' => CellKind::Free,
                    'S' => {
                        if start.replace(here).is_some() {
                            anyhow::bail!("Map has more than one start cell (second at {})", here);
                        }
                        CellKind::Start
                    }
                    'G' => {
                        if goal.replace(here).is_some() {
                            anyhow::bail!("Map has more than one goal cell (second at {})", here);
                        }
                        CellKind::Goal
                    }
                    'B' => {
                        boxes.push(here);
                        CellKind::Free
                    }
                    _ => anyhow::bail!(
                        "Invalid character '{}' at position ({}, {}). Allowed: # . S G B and space",
                        ch, row_idx, col_idx
                    ),
                };
                row.push(kind);
            }
            // Short rows are padded with ice so the grid stays rectangular
            row.resize(width, CellKind::Free);
            rows.push(row);
        }

        let start = start.ok_or_else(|| anyhow::anyhow!("Map has no start cell 'S'"))?;
        let goal = goal.ok_or_else(|| anyhow::anyhow!("Map has no goal cell 'G'"))?;
        let grid = Grid::from_kinds(rows)?;

        Ok(Self::new(grid, start, goal, boxes))
    }

    /// ASCII map of `state` on this level: `R` robot, `B` box, `G` goal
    pub fn render(&self, state: &Configuration) -> String {
        let mut out = String::with_capacity((self.grid.width + 1) * self.grid.height);
        for row in 0..self.grid.height {
            for col in 0..self.grid.width {
                let here = Cell::new(row, col);
                out.push(if here == state.robot {
                    'R'
                } else if state.has_box(here) {
                    'B'
                } else if here == self.goal {
                    'G'
                } else if self.grid.is_free(here) {
                    '.'
                } else {
                    '#'
                });
            }
            out.push('\n');
        }
        out
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..self.grid.height {
            for col in 0..self.grid.width {
                let here = Cell::new(row, col);
                let symbol = if self.boxes.contains(&here) {
                    'B'
                } else if here == self.start {
                    'S'
                } else if here == self.goal {
                    'G'
                } else if self.grid.is_free(here) {
                    '.'
                } else {
                    '#'
                };
                write!(f, "{}", symbol)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
