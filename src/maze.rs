//maze.rs

use std::path::Path;
use crate::error::AssetError;

pub const MAZE_MAX: usize = 50;

/// Wall grid read from a text file, `#` marks a wall.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Maze {
    cells: Vec<Vec<bool>>,
    width: usize,
}

impl Maze {
    pub fn parse(text: &str) -> Self {
        let cells: Vec<Vec<bool>> = text
            .lines()
            .take(MAZE_MAX)
            .map(|line| line.chars().take(MAZE_MAX).map(|c| c == '#').collect())
            .collect();
        let width = cells.iter().map(Vec::len).max().unwrap_or(0);
        Self { cells, width }
    }

    pub fn load(path: &Path) -> Result<Self, AssetError> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::parse(&text))
    }

    pub fn load_or_empty(path: &Path) -> Self {
        match Self::load(path) {
            Ok(maze) => {
                log::info!("Loaded maze {} ({}x{}, {} walls)", path.display(), maze.width(), maze.height(), maze.walls().count());
                maze
            }
            Err(e) => {
                log::warn!("Could not load maze {}: {e}, continuing with an empty maze", path.display());
                Self::default()
            }
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.cells.len()
    }

    /// Short rows read as open floor past their end.
    pub fn is_wall(&self, row: usize, col: usize) -> bool {
        self.cells.get(row).and_then(|r| r.get(col)).copied().unwrap_or(false)
    }

    /// (row, col) of every wall cell, row-major.
    pub fn walls(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.cells.iter().enumerate().flat_map(|(row, cells)| {
            cells.iter().enumerate().filter(|(_, wall)| **wall).map(move |(col, _)| (row, col))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_walls_and_dimensions() {
        let maze = Maze::parse("###\n# #\n#\n");
        assert_eq!(maze.width(), 3);
        assert_eq!(maze.height(), 3);
        assert!(maze.is_wall(0, 2));
        assert!(!maze.is_wall(1, 1));
        assert!(!maze.is_wall(2, 2));
        assert!(!maze.is_wall(7, 0));
        assert_eq!(maze.walls().count(), 6);
    }

    #[test]
    fn only_hash_is_a_wall() {
        let maze = Maze::parse("#.X@ #\r\n");
        assert_eq!(maze.width(), 6);
        assert_eq!(maze.walls().collect::<Vec<_>>(), vec![(0, 0), (0, 5)]);
    }

    #[test]
    fn dimensions_are_capped() {
        let line = "#".repeat(80);
        let text = vec![line.as_str(); 70].join("\n");
        let maze = Maze::parse(&text);
        assert_eq!(maze.width(), MAZE_MAX);
        assert_eq!(maze.height(), MAZE_MAX);
        assert!(!maze.is_wall(0, MAZE_MAX));
    }

    #[test]
    fn missing_file_gives_empty_maze() {
        let maze = Maze::load_or_empty(Path::new("no/such/maze.txt"));
        assert_eq!(maze.width(), 0);
        assert_eq!(maze.height(), 0);
        assert_eq!(maze.walls().count(), 0);
    }
}
