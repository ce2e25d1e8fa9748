//! Grid: the static terrain layer of a level.
//!
//! Only `Cell::Wall` and `Cell::Floor` are stored. Entities (player,
//! diamond, coins) live beside the grid as positions and are overlaid
//! when a view is composed, so nothing ever has to be "restored" here.

use super::entity::Position;
use super::tile::Cell;

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Grid {
    cells: Vec<Vec<Cell>>,
    cols: usize,
}

/// Row `row` had `found` cells where `expected` were required.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct RaggedRow {
    pub row: usize,
    pub expected: usize,
    pub found: usize,
}

impl Grid {
    /// Build from rows of cells. Overlay tags are normalized to their
    /// terrain. Rows must all have the same length.
    pub fn from_rows(rows: Vec<Vec<Cell>>) -> Result<Grid, RaggedRow> {
        let cols = rows.first().map_or(0, |r| r.len());
        if let Some((row, r)) = rows.iter().enumerate().find(|(_, r)| r.len() != cols) {
            return Err(RaggedRow { row, expected: cols, found: r.len() });
        }
        let cells = rows
            .into_iter()
            .map(|r| r.into_iter().map(Cell::terrain).collect())
            .collect();
        Ok(Grid { cells, cols })
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn contains(&self, pos: Position) -> bool {
        pos.row < self.rows() && pos.col < self.cols
    }

    /// Stored tag at `pos`. Out of bounds reads as wall.
    #[inline]
    pub fn at(&self, pos: Position) -> Cell {
        if self.contains(pos) {
            self.cells[pos.row][pos.col]
        } else {
            Cell::Wall
        }
    }
}

// Play never mutates a grid; these only author test boards.
#[cfg(test)]
impl Grid {
    /// A `rows × cols` grid of floor.
    pub fn open(rows: usize, cols: usize) -> Grid {
        Grid { cells: vec![vec![Cell::Floor; cols]; rows], cols }
    }

    pub fn set(&mut self, pos: Position, cell: Cell) {
        if self.contains(pos) {
            self.cells[pos.row][pos.col] = cell.terrain();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_ragged_rows() {
        let rows = vec![
            vec![Cell::Wall, Cell::Wall, Cell::Wall],
            vec![Cell::Wall, Cell::Floor],
        ];
        assert_eq!(
            Grid::from_rows(rows),
            Err(RaggedRow { row: 1, expected: 3, found: 2 })
        );
    }

    #[test]
    fn overlay_tags_become_floor() {
        let grid = Grid::from_rows(vec![vec![Cell::Player, Cell::Coin, Cell::Diamond, Cell::Wall]]).unwrap();
        assert_eq!(grid.at(Position::new(0, 0)), Cell::Floor);
        assert_eq!(grid.at(Position::new(0, 1)), Cell::Floor);
        assert_eq!(grid.at(Position::new(0, 2)), Cell::Floor);
        assert_eq!(grid.at(Position::new(0, 3)), Cell::Wall);
    }

    #[test]
    fn out_of_bounds_is_wall() {
        let grid = Grid::open(2, 2);
        assert_eq!(grid.at(Position::new(2, 0)), Cell::Wall);
        assert_eq!(grid.at(Position::new(0, 2)), Cell::Wall);
        assert!(!grid.contains(Position::new(5, 5)));
    }

    #[test]
    fn set_stores_terrain_only() {
        let mut grid = Grid::open(1, 2);
        grid.set(Position::new(0, 0), Cell::Wall);
        grid.set(Position::new(0, 1), Cell::Coin);
        assert_eq!(grid.at(Position::new(0, 0)), Cell::Wall);
        assert_eq!(grid.at(Position::new(0, 1)), Cell::Floor);
    }
}
