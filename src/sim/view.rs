//! Read-only board composition for renderers.
//!
//! Overlays the dynamic entities on the static grid. Precedence when
//! entities share a cell: Player, then Diamond, then Coin, then terrain.

use crate::domain::entity::Position;
use crate::domain::tile::Cell;
use super::state::GameState;

#[derive(Clone, Copy, Debug)]
pub struct BoardView<'a> {
    state: &'a GameState,
}

impl<'a> BoardView<'a> {
    pub fn new(state: &'a GameState) -> Self {
        BoardView { state }
    }

    pub fn rows(&self) -> usize {
        self.state.grid.rows()
    }

    pub fn cols(&self) -> usize {
        self.state.grid.cols()
    }

    pub fn cell(&self, pos: Position) -> Cell {
        let s = self.state;
        if pos == s.player {
            Cell::Player
        } else if pos == s.diamond {
            Cell::Diamond
        } else if s.coins.contains(&pos) {
            Cell::Coin
        } else {
            s.grid.at(pos)
        }
    }

    /// Composed rows, top to bottom.
    pub fn iter_rows(&self) -> impl Iterator<Item = Vec<Cell>> + '_ {
        (0..self.rows()).map(move |r| (0..self.cols()).map(|c| self.cell(Position::new(r, c))).collect())
    }

    /// ASCII rendering, one line per row. Used for debug logging.
    pub fn to_ascii(&self) -> String {
        self.iter_rows()
            .map(|row| row.into_iter().map(Cell::ascii).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::level::parse_level;

    #[test]
    fn overlay_round_trips_the_map() {
        let map = "######\n#P.$.#\n#$..D#\n######";
        let state = GameState::from_level(&parse_level(map).unwrap(), 0, 0);
        assert_eq!(BoardView::new(&state).to_ascii(), map);
    }

    #[test]
    fn player_wins_over_coin() {
        let map = "#####\n#P$D#\n#####";
        let mut state = GameState::from_level(&parse_level(map).unwrap(), 0, 0);
        state.coins.insert(state.player);
        let view = BoardView::new(&state);
        assert_eq!(view.cell(state.player), Cell::Player);
        assert_eq!(view.cell(Position::new(1, 2)), Cell::Coin);
        assert_eq!(view.cell(Position::new(0, 0)), Cell::Wall);
    }

    #[test]
    fn entities_leave_no_trace() {
        let map = "#####\n#P.D#\n#####";
        let mut state = GameState::from_level(&parse_level(map).unwrap(), 0, 0);
        state.player = Position::new(1, 2);
        let view = BoardView::new(&state);
        assert_eq!(view.cell(Position::new(1, 1)), Cell::Floor);
        assert_eq!(view.cell(Position::new(1, 2)), Cell::Player);
    }
}
