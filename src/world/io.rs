//! File I/O for level maps

use super::level::Level;
use anyhow::{Context, Result};
use std::path::Path;
use tracing::warn;

/// Load a level from a text map file
pub fn load_level_from_file<P: AsRef<Path>>(path: P) -> Result<Level> {
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read map file: {}", path.as_ref().display()))?;

    parse_level_from_string(&content)
        .with_context(|| format!("Failed to parse map file: {}", path.as_ref().display()))
}

/// Parse a level from map text
pub fn parse_level_from_string(content: &str) -> Result<Level> {
    Level::parse(content)
}

/// Convert a level back to map text
pub fn level_to_string(level: &Level) -> String {
    level.to_string()
}

/// Save a level as a text map
pub fn save_level_to_file<P: AsRef<Path>>(level: &Level, path: P) -> Result<()> {
    if let Some(parent) = path.as_ref().parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    std::fs::write(&path, level_to_string(level))
        .with_context(|| format!("Failed to write map to file: {}", path.as_ref().display()))?;

    Ok(())
}

/// Load every `.txt` map in a directory, skipping files that fail to parse
pub fn load_levels_from_directory<P: AsRef<Path>>(dir_path: P) -> Result<Vec<(String, Level)>> {
    let dir = std::fs::read_dir(&dir_path)
        .with_context(|| format!("Failed to read directory: {}", dir_path.as_ref().display()))?;

    let mut levels = Vec::new();

    for entry in dir {
        let entry = entry.context("Failed to read directory entry")?;
        let path = entry.path();

        if !path.is_file() || !matches!(path.extension(), Some(ext) if ext == "txt") {
            continue;
        }

        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown")
            .to_string();

        match load_level_from_file(&path) {
            Ok(level) => levels.push((name, level)),
            Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable map"),
        }
    }

    levels.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(levels)
}

/// Write a small set of example maps
pub fn create_example_levels<P: AsRef<Path>>(output_dir: P) -> Result<()> {
    let output_dir = output_dir.as_ref();
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create directory: {}", output_dir.display()))?;

    let examples = [
        // Two slides, each stopped by a wall
        ("corner_stop", "S.#\n...\n.#.\nG..\n"),
        // A box has to be shoved into place to create a stopping point
        ("push_to_stop", "S.B...\n......\n#....G\n"),
        // Walls, boxes and a long icy corridor
        ("icepath", "S....#....\n.##.....#.\n....B.....\n.#....##..\n...#....B.\n.B....#..G\n"),
    ];

    for (name, map) in examples {
        let level = Level::parse(map).with_context(|| format!("Example map {} is malformed", name))?;
        save_level_to_file(&level, output_dir.join(format!("{}.txt", name)))?;
    }

    Ok(())
}
