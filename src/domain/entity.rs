//! Positions, directions and the discrete actions a player can request.

use std::fmt;

/// A grid coordinate. Row grows downward, column grows rightward.
///
/// Ordering is row-major so coin sets iterate top-left to bottom-right.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub const fn new(row: usize, col: usize) -> Self {
        Position { row, col }
    }

    /// One cell over in `dir`, or `None` if that leaves a `rows × cols` grid.
    pub fn step(self, dir: Direction, rows: usize, cols: usize) -> Option<Position> {
        let (dr, dc) = dir.delta();
        let row = self.row.checked_add_signed(dr)?;
        let col = self.col.checked_add_signed(dc)?;
        if row < rows && col < cols {
            Some(Position { row, col })
        } else {
            None
        }
    }

    /// Direction from `self` toward `target` when both share a row or a
    /// column. `None` for the same cell or a diagonal.
    pub fn direction_to(self, target: Position) -> Option<Direction> {
        if self.row == target.row && self.col != target.col {
            Some(if target.col > self.col { Direction::Right } else { Direction::Left })
        } else if self.col == target.col && self.row != target.row {
            Some(if target.row > self.row { Direction::Down } else { Direction::Up })
        } else {
            None
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.row, self.col)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// (row delta, col delta), indexed by `Direction as usize`.
const DELTAS: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

impl Direction {
    pub const ALL: [Direction; 4] = [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

    #[inline]
    pub fn delta(self) -> (isize, isize) {
        DELTAS[self as usize]
    }
}

/// Discrete requests from the input boundary.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Action {
    Move(Direction),
    Swap,
    Reset,
}
