//! Events emitted by a transition.
//! The presentation layer consumes these for messages and sound.

use crate::domain::entity::{Direction, Position};

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum GameEvent {
    Slid { from: Position, to: Position, collected: usize },
    Blocked { dir: Direction },
    Swapped { player: Position, diamond: Position },
    /// A move or swap arrived after the budget ran out and was ignored.
    BudgetExhausted,
    LevelReset { level: usize },
    LevelComplete { level: usize, moves: u32 },
    AllLevelsComplete { total_moves: u32 },
    /// Emitted after `LevelComplete`, once the following level is in place.
    LevelLoaded { level: usize },
}
