//! The step function: one action in, one new snapshot out.
//!
//! Processing order:
//!   1. Budget gate (Move / Swap only)
//!   2. Action resolution (slide, swap or reset)
//!   3. Completion check (only when coins were collected)
//!   4. Progression: next level, or wrap to level 0 after the last
//!
//! `apply` never mutates its input; the caller swaps in the returned
//! state as a whole.

use log::{debug, info};

use crate::config::RulesConfig;
use crate::domain::entity::{Action, Direction};
use crate::domain::rules;
use super::event::GameEvent;
use super::level::{load_level, LevelSet};
use super::state::GameState;

/// Where the progression machine stands after a transition.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Progress {
    Playing { level: usize },
    /// `level` was finished and the next one is loaded.
    LevelComplete { level: usize },
    /// The last level was finished and level 0 is loaded.
    AllLevelsComplete,
}

#[derive(Clone, Debug)]
pub struct Transition {
    pub state: GameState,
    pub events: Vec<GameEvent>,
    pub progress: Progress,
}

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

/// First level, nothing spent yet.
pub fn new_game(levels: &LevelSet) -> GameState {
    load_level(levels, 0, 0)
}

pub fn apply(state: &GameState, action: Action, levels: &LevelSet, rules: &RulesConfig) -> Transition {
    let mut events = Vec::new();

    let next = match action {
        Action::Reset => restart_level(state, levels, &mut events),
        Action::Move(_) | Action::Swap if state.budget_exhausted(rules.move_budget) => {
            debug!("{action:?} ignored: {} of {} moves used", state.moves, rules.move_budget);
            events.push(GameEvent::BudgetExhausted);
            state.clone()
        }
        Action::Move(dir) => resolve_slide(state, dir, &mut events),
        Action::Swap => resolve_swap(state, &mut events),
    };

    let scored = next.coins_collected != state.coins_collected && next.level == state.level;
    if scored && next.is_complete() {
        return advance(next, levels, events);
    }

    let progress = Progress::Playing { level: next.level };
    Transition { state: next, events, progress }
}

// ══════════════════════════════════════════════════════════════
// Actions
// ══════════════════════════════════════════════════════════════

fn resolve_slide(state: &GameState, dir: Direction, events: &mut Vec<GameEvent>) -> GameState {
    let out = rules::resolve_move(&state.grid, state.player, state.diamond, &state.coins, dir);
    if !out.moved {
        events.push(GameEvent::Blocked { dir });
        return state.clone();
    }

    debug!("slide {dir:?} crossed {} cell(s)", out.path.len());
    events.push(GameEvent::Slid { from: state.player, to: out.position, collected: out.collected });

    GameState {
        player: out.position,
        coins: out.remaining,
        coins_collected: state.coins_collected + out.collected,
        moves: state.moves + 1,
        total_moves: state.total_moves + 1,
        ..state.clone()
    }
}

fn resolve_swap(state: &GameState, events: &mut Vec<GameEvent>) -> GameState {
    let (player, diamond) = rules::swap(state.player, state.diamond);
    events.push(GameEvent::Swapped { player, diamond });

    GameState {
        player,
        diamond,
        moves: state.moves + 1,
        total_moves: state.total_moves + 1,
        ..state.clone()
    }
}

/// Reload the current level. Moves spent on the abandoned attempt are
/// taken back out of the cumulative count.
fn restart_level(state: &GameState, levels: &LevelSet, events: &mut Vec<GameEvent>) -> GameState {
    let kept = state.total_moves.saturating_sub(state.moves);
    events.push(GameEvent::LevelReset { level: state.level });
    load_level(levels, state.level, kept)
}

// ══════════════════════════════════════════════════════════════
// Progression
// ══════════════════════════════════════════════════════════════

fn advance(done: GameState, levels: &LevelSet, mut events: Vec<GameEvent>) -> Transition {
    let level = done.level;
    info!(
        "level {} complete in {} moves ({} total)",
        level + 1,
        done.moves,
        done.total_moves,
    );
    events.push(GameEvent::LevelComplete { level, moves: done.moves });

    let (next_idx, progress) = if levels.is_last(level) {
        info!("all {} levels complete, wrapping to level 1", levels.len());
        events.push(GameEvent::AllLevelsComplete { total_moves: done.total_moves });
        (0, Progress::AllLevelsComplete)
    } else {
        (level + 1, Progress::LevelComplete { level })
    };

    let state = load_level(levels, next_idx, done.total_moves);
    events.push(GameEvent::LevelLoaded { level: state.level });
    Transition { state, events, progress }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::Position;
    use crate::sim::level::parse_level;

    /// One slide right finishes it.
    const ONE_SHOT: &str = "\
#####
#P$D#
#####";

    /// Also one slide right, on a wider board.
    const CORRIDOR: &str = "\
######
#P.$.#
#D...#
######";

    /// Right, Down, Left, Down collects both coins.
    const FOUR_STEP: &str = "\
######
#P..$#
#....#
#$..D#
######";

    fn set(maps: &[&str]) -> LevelSet {
        LevelSet::new(maps.iter().map(|m| parse_level(m).unwrap()).collect(), "test").unwrap()
    }

    fn rules(move_budget: u32) -> RulesConfig {
        RulesConfig { move_budget }
    }

    fn run(state: &GameState, actions: &[Action], levels: &LevelSet, r: &RulesConfig) -> Transition {
        let mut t = Transition {
            state: state.clone(),
            events: vec![],
            progress: Progress::Playing { level: state.level },
        };
        for &a in actions {
            t = apply(&t.state, a, levels, r);
        }
        t
    }

    // ── Counters ──

    #[test]
    fn slide_counts_one_move() {
        let levels = set(&[FOUR_STEP]);
        let s0 = new_game(&levels);
        let t = apply(&s0, Action::Move(Direction::Right), &levels, &rules(1024));
        assert_eq!(t.state.player, Position::new(1, 4));
        assert_eq!(t.state.moves, 1);
        assert_eq!(t.state.total_moves, 1);
        assert_eq!(t.state.coins_collected, 1);
        assert_eq!(t.state.coins.len(), 1);
        assert_eq!(t.progress, Progress::Playing { level: 0 });
        assert_eq!(
            t.events,
            vec![GameEvent::Slid { from: Position::new(1, 1), to: Position::new(1, 4), collected: 1 }]
        );
        // input snapshot untouched
        assert_eq!(s0.player, Position::new(1, 1));
        assert_eq!(s0.moves, 0);
    }

    #[test]
    fn blocked_move_costs_nothing() {
        let levels = set(&[FOUR_STEP]);
        let s0 = new_game(&levels);
        let t = apply(&s0, Action::Move(Direction::Up), &levels, &rules(1024));
        assert_eq!(t.state, s0);
        assert_eq!(t.events, vec![GameEvent::Blocked { dir: Direction::Up }]);
    }

    #[test]
    fn swap_counts_and_keeps_coins() {
        let levels = set(&[FOUR_STEP]);
        let s0 = new_game(&levels);
        let t = apply(&s0, Action::Swap, &levels, &rules(1024));
        assert_eq!(t.state.player, s0.diamond);
        assert_eq!(t.state.diamond, s0.player);
        assert_eq!(t.state.coins, s0.coins);
        assert_eq!(t.state.moves, 1);
        assert_eq!(t.state.total_moves, 1);
    }

    #[test]
    fn swap_onto_coin_does_not_collect() {
        let levels = set(&[FOUR_STEP]);
        let mut s0 = new_game(&levels);
        s0.coins.insert(s0.diamond);
        let t = apply(&s0, Action::Swap, &levels, &rules(1024));
        assert!(t.state.coins.contains(&t.state.player));
        assert_eq!(t.state.coins_collected, 0);
        assert_eq!(t.progress, Progress::Playing { level: 0 });
    }

    // ── Progression ──

    #[test]
    fn completion_advances_and_keeps_total() {
        let levels = set(&[FOUR_STEP, ONE_SHOT]);
        let s0 = new_game(&levels);
        let t = run(
            &s0,
            &[
                Action::Move(Direction::Right),
                Action::Move(Direction::Up), // blocked
                Action::Move(Direction::Down),
                Action::Move(Direction::Left),
                Action::Move(Direction::Down),
            ],
            &levels,
            &rules(1024),
        );
        assert_eq!(t.progress, Progress::LevelComplete { level: 0 });
        assert_eq!(t.state.level, 1);
        assert_eq!(t.state.total_moves, 4);
        assert_eq!(t.state.moves, 0);
        assert_eq!(t.state.coins_collected, 0);
        assert_eq!(t.state.total_coins, 1);
        assert_eq!(t.state.player, Position::new(1, 1));
        assert!(t.events.contains(&GameEvent::LevelComplete { level: 0, moves: 4 }));
        assert!(t.events.contains(&GameEvent::LevelLoaded { level: 1 }));
    }

    #[test]
    fn finishing_last_level_wraps_to_first() {
        let levels = set(&[ONE_SHOT, CORRIDOR]);
        let s0 = new_game(&levels);
        let first = apply(&s0, Action::Move(Direction::Right), &levels, &rules(1024));
        assert_eq!(first.progress, Progress::LevelComplete { level: 0 });
        assert_eq!(first.state.level, 1);

        let second = apply(&first.state, Action::Move(Direction::Right), &levels, &rules(1024));
        assert_eq!(second.progress, Progress::AllLevelsComplete);
        assert_eq!(second.state.level, 0);
        assert_eq!(second.state.total_moves, 2);
        assert_eq!(second.state.moves, 0);
        assert_eq!(second.state.coins_collected, 0);
        assert_eq!(second.state.coins.len(), 1);
        assert!(second.events.contains(&GameEvent::AllLevelsComplete { total_moves: 2 }));
    }

    #[test]
    fn single_level_set_wraps_onto_itself() {
        let levels = set(&[ONE_SHOT]);
        let t = apply(&new_game(&levels), Action::Move(Direction::Right), &levels, &rules(1024));
        assert_eq!(t.progress, Progress::AllLevelsComplete);
        assert_eq!(t.state.level, 0);
        assert_eq!(t.state.total_moves, 1);
        assert_eq!(t.state.coins.len(), 1);
    }

    // ── Budget ──

    #[test]
    fn exhausted_budget_ignores_move_and_swap() {
        let levels = set(&[FOUR_STEP]);
        let r = rules(1);
        let spent = apply(&new_game(&levels), Action::Move(Direction::Right), &levels, &r).state;
        assert_eq!(spent.moves, 1);

        for action in [Action::Move(Direction::Down), Action::Swap] {
            let t = apply(&spent, action, &levels, &r);
            assert_eq!(t.state, spent, "{action:?} should be ignored");
            assert_eq!(t.events, vec![GameEvent::BudgetExhausted]);
        }
    }

    #[test]
    fn reset_works_after_budget_runs_out() {
        let levels = set(&[FOUR_STEP]);
        let r = rules(1);
        let spent = apply(&new_game(&levels), Action::Swap, &levels, &r).state;
        let t = apply(&spent, Action::Reset, &levels, &r);
        assert_eq!(t.state.moves, 0);
        let again = apply(&t.state, Action::Move(Direction::Right), &levels, &r);
        assert_eq!(again.state.moves, 1);
    }

    // ── Reset ──

    #[test]
    fn reset_discards_attempt_moves() {
        let levels = set(&[ONE_SHOT, FOUR_STEP]);
        // 1 move on level 0, then 2 on level 1, then reset.
        let t = run(
            &new_game(&levels),
            &[
                Action::Move(Direction::Right),
                Action::Move(Direction::Right),
                Action::Swap,
                Action::Reset,
            ],
            &levels,
            &rules(1024),
        );
        assert_eq!(t.state.level, 1);
        assert_eq!(t.state.moves, 0);
        assert_eq!(t.state.total_moves, 1);
        assert_eq!(t.state.coins_collected, 0);
        assert_eq!(t.state.coins.len(), 2);
        assert_eq!(t.state.player, Position::new(1, 1));
        assert_eq!(t.events, vec![GameEvent::LevelReset { level: 1 }]);
    }
}
