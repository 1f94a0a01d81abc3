//! Ice world: grid geometry, levels and slide physics

pub mod grid;
pub mod io;
pub mod level;
pub mod physics;

pub use grid::{Cell, CellKind, Direction, Grid};
pub use io::{
    create_example_levels, level_to_string, load_level_from_file, load_levels_from_directory, parse_level_from_string,
    save_level_to_file,
};
pub use level::Level;
pub use physics::{ConfigKey, Configuration, Simulator};
