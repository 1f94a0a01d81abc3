//! Grid representation and slide geometry for the ice world

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a single grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellKind {
    Free,
    Wall,
    Start,
    Goal,
}

impl CellKind {
    /// Start and goal markers are traversable like free ice
    pub fn is_passable(self) -> bool {
        !matches!(self, CellKind::Wall)
    }
}

/// A (row, col) position on the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

impl Cell {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    pub fn manhattan(self, other: Cell) -> usize {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col)
    }
}

impl From<(usize, usize)> for Cell {
    fn from((row, col): (usize, usize)) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// One of the four slide directions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// All directions, in the order used for expansion and variable numbering
    pub const ALL: [Direction; 4] = [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

    /// Unit (row, col) delta
    pub fn delta(self) -> (isize, isize) {
        match self {
            Direction::Up => (-1, 0),
            Direction::Down => (1, 0),
            Direction::Left => (0, -1),
            Direction::Right => (0, 1),
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Direction::Up => 0,
            Direction::Down => 1,
            Direction::Left => 2,
            Direction::Right => 3,
        }
    }

    /// Single-letter form used in compact move listings
    pub fn symbol(self) -> char {
        match self {
            Direction::Up => 'U',
            Direction::Down => 'D',
            Direction::Left => 'L',
            Direction::Right => 'R',
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        };
        write!(f, "{}", name)
    }
}

/// Immutable traversability map. Out-of-bounds is treated as wall.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    pub width: usize,
    pub height: usize,
    pub cells: Vec<CellKind>,
}

impl Grid {
    /// Create an all-free grid
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![CellKind::Free; width * height],
        }
    }

    /// Create a grid from rows of cell kinds
    pub fn from_kinds(rows: Vec<Vec<CellKind>>) -> Result<Self> {
        if rows.is_empty() {
            anyhow::bail!("Grid cannot be empty");
        }

        let height = rows.len();
        let width = rows[0].len();

        if width == 0 {
            anyhow::bail!("Grid width cannot be zero");
        }

        for (i, row) in rows.iter().enumerate() {
            if row.len() != width {
                anyhow::bail!("Row {} has length {}, expected {}", i, row.len(), width);
            }
        }

        Ok(Self {
            width,
            height,
            cells: rows.into_iter().flatten().collect(),
        })
    }

    #[inline]
    pub fn index(&self, row: usize, col: usize) -> usize {
        row * self.width + col
    }

    /// Cell kind at coordinates; out-of-bounds reads as a wall
    pub fn get(&self, row: usize, col: usize) -> CellKind {
        if row < self.height && col < self.width {
            self.cells[self.index(row, col)]
        } else {
            CellKind::Wall
        }
    }

    pub fn set(&mut self, row: usize, col: usize, kind: CellKind) -> Result<()> {
        if row >= self.height || col >= self.width {
            anyhow::bail!("Coordinates ({}, {}) out of bounds for {}x{} grid", row, col, self.height, self.width);
        }
        let idx = self.index(row, col);
        self.cells[idx] = kind;
        Ok(())
    }

    pub fn contains(&self, cell: Cell) -> bool {
        cell.row < self.height && cell.col < self.width
    }

    /// "Is (r,c) free?" - inside the grid and not a wall
    pub fn is_free(&self, cell: Cell) -> bool {
        self.get(cell.row, cell.col).is_passable()
    }

    /// Adjacent in-bounds cell in `direction`, regardless of its kind
    pub fn neighbor(&self, cell: Cell, direction: Direction) -> Option<Cell> {
        let (dr, dc) = direction.delta();
        let row = cell.row.checked_add_signed(dr)?;
        let col = cell.col.checked_add_signed(dc)?;
        let next = Cell::new(row, col);
        self.contains(next).then_some(next)
    }

    /// Adjacent cell in `direction` if it can be entered
    pub fn step_free(&self, cell: Cell, direction: Direction) -> Option<Cell> {
        self.neighbor(cell, direction).filter(|&next| self.is_free(next))
    }

    /// Cells swept by a box-free slide from `origin`, excluding the origin itself
    /// and ending just before the first wall or the boundary.
    pub fn ray(&self, origin: Cell, direction: Direction) -> Vec<Cell> {
        let mut cells = Vec::new();
        let mut current = origin;
        while let Some(next) = self.step_free(current, direction) {
            cells.push(next);
            current = next;
        }
        cells
    }

    /// Where a slide from `origin` ends when no box is in the way
    pub fn static_stop(&self, origin: Cell, direction: Direction) -> Cell {
        let mut current = origin;
        while let Some(next) = self.step_free(current, direction) {
            current = next;
        }
        current
    }

    /// All non-wall cells in row-major order
    pub fn free_cells(&self) -> Vec<Cell> {
        let mut free = Vec::new();
        for row in 0..self.height {
            for col in 0..self.width {
                if self.get(row, col).is_passable() {
                    free.push(Cell::new(row, col));
                }
            }
        }
        free
    }

    pub fn free_count(&self) -> usize {
        self.cells.iter().filter(|kind| kind.is_passable()).count()
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..self.height {
            for col in 0..self.width {
                let symbol = match self.get(row, col) {
                    CellKind::Free => '.',
                    CellKind::Wall => '#',
                    CellKind::Start => 'S',
                    CellKind::Goal => 'G',
                };
                write!(f, "{}", symbol)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walled_grid() -> Grid {
        // . . #
        // . . .
        // . # .
        let mut grid = Grid::new(3, 3);
        grid.set(0, 2, CellKind::Wall).unwrap();
        grid.set(2, 1, CellKind::Wall).unwrap();
        grid
    }

    #[test]
    fn test_grid_creation() {
        let grid = Grid::new(4, 3);
        assert_eq!(grid.width, 4);
        assert_eq!(grid.height, 3);
        assert_eq!(grid.cells.len(), 12);
        assert_eq!(grid.free_count(), 12);
    }

    #[test]
    fn test_from_kinds_rejects_ragged_rows() {
        let rows = vec![
            vec![CellKind::Free, CellKind::Free],
            vec![CellKind::Free],
        ];
        assert!(Grid::from_kinds(rows).is_err());
        assert!(Grid::from_kinds(Vec::new()).is_err());
    }

    #[test]
    fn test_out_of_bounds_is_wall() {
        let grid = Grid::new(2, 2);
        assert_eq!(grid.get(2, 0), CellKind::Wall);
        assert!(!grid.is_free(Cell::new(0, 5)));
        assert!(grid.neighbor(Cell::new(0, 0), Direction::Up).is_none());
        assert!(grid.neighbor(Cell::new(0, 0), Direction::Left).is_none());
    }

    #[test]
    fn test_ray_stops_before_walls_and_boundary() {
        let grid = walled_grid();
        assert_eq!(grid.ray(Cell::new(0, 0), Direction::Right), vec![Cell::new(0, 1)]);
        assert_eq!(
            grid.ray(Cell::new(0, 0), Direction::Down),
            vec![Cell::new(1, 0), Cell::new(2, 0)]
        );
        assert!(grid.ray(Cell::new(0, 0), Direction::Up).is_empty());
    }

    #[test]
    fn test_static_stop() {
        let grid = walled_grid();
        assert_eq!(grid.static_stop(Cell::new(0, 0), Direction::Right), Cell::new(0, 1));
        assert_eq!(grid.static_stop(Cell::new(0, 1), Direction::Down), Cell::new(1, 1));
        // Against the boundary the slide goes nowhere
        assert_eq!(grid.static_stop(Cell::new(0, 0), Direction::Left), Cell::new(0, 0));
    }

    #[test]
    fn test_static_stop_is_last_ray_cell() {
        let grid = walled_grid();
        for origin in grid.free_cells() {
            for direction in Direction::ALL {
                let ray = grid.ray(origin, direction);
                let expected = ray.last().copied().unwrap_or(origin);
                assert_eq!(grid.static_stop(origin, direction), expected);
            }
        }
    }

    #[test]
    fn test_direction_helpers() {
        for direction in Direction::ALL {
            assert_eq!(direction.opposite().opposite(), direction);
            assert_eq!(Direction::ALL[direction.index()], direction);
        }
        assert_eq!(Direction::Left.delta(), (0, -1));
    }

    #[test]
    fn test_display() {
        let grid = walled_grid();
        assert_eq!(grid.to_string(), "..#\n...\n.#.\n");
    }
}
