//! GameState: the per-attempt snapshot of a level in play.
//!
//! Snapshots are values. `sim::step::apply` borrows one and returns a new
//! one; nothing mutates a snapshot that a caller can still observe.

use std::collections::BTreeSet;

use crate::domain::entity::Position;
use crate::domain::grid::Grid;
use super::level::Level;

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct GameState {
    pub grid: Grid,
    pub player: Position,
    pub diamond: Position,
    pub coins: BTreeSet<Position>,

    // ── Per-level counters ──
    pub moves: u32,
    pub coins_collected: usize,
    pub total_coins: usize,

    // ── Progression ──
    pub level: usize,
    /// Moves across all retained level attempts.
    pub total_moves: u32,
}

impl GameState {
    /// Fresh attempt at `level`, carrying `total_moves` over.
    pub fn from_level(template: &Level, level: usize, total_moves: u32) -> Self {
        GameState {
            grid: template.grid.clone(),
            player: template.player_start,
            diamond: template.diamond_start,
            coins: template.coins.clone(),
            moves: 0,
            coins_collected: 0,
            total_coins: template.coins.len(),
            level,
            total_moves,
        }
    }

    /// All coins taken, and there were coins to take.
    pub fn is_complete(&self) -> bool {
        self.total_coins > 0 && self.coins_collected == self.total_coins
    }

    pub fn budget_exhausted(&self, move_budget: u32) -> bool {
        self.moves >= move_budget
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::level::parse_level;

    #[test]
    fn fresh_state_copies_template() {
        let level = parse_level("#####\n#P$D#\n#####").unwrap();
        let s = GameState::from_level(&level, 3, 17);
        assert_eq!(s.player, Position::new(1, 1));
        assert_eq!(s.diamond, Position::new(1, 3));
        assert_eq!(s.total_coins, 1);
        assert_eq!(s.coins_collected, 0);
        assert_eq!(s.moves, 0);
        assert_eq!(s.level, 3);
        assert_eq!(s.total_moves, 17);
        assert!(!s.is_complete());
    }

    #[test]
    fn coinless_level_is_never_complete() {
        let level = parse_level("####\n#PD#\n####").unwrap();
        let s = GameState::from_level(&level, 0, 0);
        assert_eq!(s.total_coins, 0);
        assert!(!s.is_complete());
    }

    #[test]
    fn budget_boundary() {
        let level = parse_level("#####\n#P$D#\n#####").unwrap();
        let mut s = GameState::from_level(&level, 0, 0);
        s.moves = 9;
        assert!(!s.budget_exhausted(10));
        s.moves = 10;
        assert!(s.budget_exhausted(10));
    }
}
