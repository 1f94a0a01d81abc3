//! Declarative transition cases shared by the constraint generator
//!
//! For a fixed origin and direction the outcome of a move depends only on which
//! cells of the slide ray hold boxes. The cases below partition those occupancy
//! patterns: exactly one case matches any configuration, and applying it gives
//! the same result as [`Simulator::step`](crate::world::Simulator::step).

use crate::config::PushModel;
use crate::world::{Cell, Configuration, Direction, Grid};

/// One branch of the transition relation for a fixed (origin, direction)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionCase {
    /// Ray cells that must be box-free
    pub requires_empty: Vec<Cell>,
    /// Ray cells that must hold a box
    pub requires_box: Vec<Cell>,
    /// Where the robot ends up
    pub robot_next: Cell,
    /// Boxes that move, as (from, to)
    pub shifts: Vec<(Cell, Cell)>,
}

impl TransitionCase {
    pub fn moves_boxes(&self) -> bool {
        !self.shifts.is_empty()
    }

    /// Whether the occupancy of `config` selects this case
    pub fn matches(&self, config: &Configuration) -> bool {
        self.requires_empty.iter().all(|&cell| !config.has_box(cell))
            && self.requires_box.iter().all(|&cell| config.has_box(cell))
    }

    /// Result of taking this branch from `config`
    pub fn apply(&self, config: &Configuration) -> Configuration {
        let boxes = config
            .boxes
            .iter()
            .map(|&cell| {
                self.shifts
                    .iter()
                    .find(|(from, _)| *from == cell)
                    .map_or(cell, |&(_, to)| to)
            })
            .collect();
        Configuration::new(self.robot_next, boxes)
    }
}

/// Enumerate the cases for a move from `origin` in `direction`.
///
/// The first case is always the box-free slide to the static stop cell.
pub fn transition_cases(grid: &Grid, origin: Cell, direction: Direction, model: PushModel) -> Vec<TransitionCase> {
    let ray = grid.ray(origin, direction);
    let n = ray.len();
    let behind = |i: usize| if i == 0 { origin } else { ray[i - 1] };

    let mut cases = vec![TransitionCase {
        requires_empty: ray.clone(),
        requires_box: Vec::new(),
        robot_next: grid.static_stop(origin, direction),
        shifts: Vec::new(),
    }];

    for first in 0..n {
        let prefix = &ray[..first];

        match model {
            PushModel::Chain => {
                for last in first..n {
                    let run = ray[first..=last].to_vec();
                    if last + 1 < n {
                        let mut requires_empty = prefix.to_vec();
                        requires_empty.push(ray[last + 1]);
                        cases.push(TransitionCase {
                            requires_empty,
                            requires_box: run,
                            robot_next: ray[first],
                            shifts: (first..=last).map(|i| (ray[i], ray[i + 1])).collect(),
                        });
                    } else {
                        // The run reaches the wall or boundary and cannot move
                        cases.push(TransitionCase {
                            requires_empty: prefix.to_vec(),
                            requires_box: run,
                            robot_next: behind(first),
                            shifts: Vec::new(),
                        });
                    }
                }
            }
            PushModel::Slide => {
                for stop in first..n {
                    let mut requires_empty = prefix.to_vec();
                    requires_empty.extend_from_slice(&ray[first + 1..=stop]);
                    let mut requires_box = vec![ray[first]];
                    if stop + 1 < n {
                        requires_box.push(ray[stop + 1]);
                    }

                    let (robot_next, shifts) = if stop == first {
                        (behind(first), Vec::new())
                    } else {
                        (ray[stop - 1], vec![(ray[first], ray[stop])])
                    };

                    cases.push(TransitionCase {
                        requires_empty,
                        requires_box,
                        robot_next,
                        shifts,
                    });
                }
            }
        }
    }

    cases
}
