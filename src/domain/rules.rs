//! Movement and swap rules.
//!
//! Pure functions over borrowed board data, no side effects. They compute
//! "what happens" and leave applying it to `sim::step`.
//!
//! ## Slide rule
//!
//! ┌──────────────────────────────┬──────────┐
//! │ Next cell                    │ Slide    │
//! ├──────────────────────────────┼──────────┤
//! │ out of bounds                │ STOP     │
//! │ stored tag is Wall           │ STOP     │
//! │ equals diamond position      │ STOP     │
//! │ otherwise                    │ ENTER    │
//! └──────────────────────────────┴──────────┘
//!
//! A stopped cell is never entered. Coins are collected by membership in
//! the entered path; the starting cell is not part of the path.

use std::collections::BTreeSet;

use super::entity::{Direction, Position};
use super::grid::Grid;

/// Read-only board for rule queries.
#[derive(Clone, Copy, Debug)]
pub struct BoardRef<'a> {
    pub grid: &'a Grid,
    pub diamond: Position,
}

impl BoardRef<'_> {
    /// Is `pos` a blocker? Walls and the diamond are the same class.
    #[inline]
    pub fn blocks(&self, pos: Position) -> bool {
        pos == self.diamond || self.grid.at(pos).is_wall()
    }

    /// The cell a slide from `from` would enter next, if any.
    #[inline]
    pub fn next_open(&self, from: Position, dir: Direction) -> Option<Position> {
        from.step(dir, self.grid.rows(), self.grid.cols())
            .filter(|&p| !self.blocks(p))
    }
}

/// Result of resolving one slide.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct MoveOutcome {
    pub position: Position,
    pub remaining: BTreeSet<Position>,
    pub collected: usize,
    pub moved: bool,
    /// Entered cells in traversal order.
    pub path: Vec<Position>,
}

/// Slide the player from `player` in `dir` until blocked.
pub fn resolve_move(
    grid: &Grid,
    player: Position,
    diamond: Position,
    coins: &BTreeSet<Position>,
    dir: Direction,
) -> MoveOutcome {
    let board = BoardRef { grid, diamond };

    let path: Vec<Position> =
        std::iter::successors(board.next_open(player, dir), |&p| board.next_open(p, dir)).collect();

    let Some(position) = path.last().copied() else {
        return MoveOutcome {
            position: player,
            remaining: coins.clone(),
            collected: 0,
            moved: false,
            path,
        };
    };

    // The walk is monotonic along one axis, so each cell appears once.
    let remaining: BTreeSet<Position> = coins.iter().copied().filter(|c| !path.contains(c)).collect();
    let collected = coins.len() - remaining.len();

    MoveOutcome { position, remaining, collected, moved: true, path }
}

/// Exchange player and diamond positions. Distance does not matter and
/// coins are never touched. Returns `(new_player, new_diamond)`.
#[inline]
pub fn swap(player: Position, diamond: Position) -> (Position, Position) {
    (diamond, player)
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
