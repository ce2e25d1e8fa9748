//! Input state tracker.
//!
//! Drains crossterm key and mouse events once per frame. Only fresh
//! presses produce commands: every slide is a discrete action, so a held
//! key (terminal auto-repeat) must not fire again until it is released.
//!
//! Release is detected by timeout: not every terminal reports key
//! Release events, and Windows consoles report them unasked.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEventKind,
};

use crate::domain::entity::{Action, Direction, Position};
use crate::sim::state::GameState;

/// After this duration without a Press/Repeat event, consider the key released.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

/// What a key asks the game loop to do.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Command {
    Game(Action),
    ToggleHelp,
    Confirm,
    Quit,
}

// ── Key Constants ──

const KEYS_LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
const KEYS_RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
const KEYS_UP: &[KeyCode] = &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')];
const KEYS_DOWN: &[KeyCode] = &[KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')];
const KEYS_SWAP: &[KeyCode] = &[KeyCode::Char(' ')];
const KEYS_RESET: &[KeyCode] = &[KeyCode::Char('r'), KeyCode::Char('R'), KeyCode::F(2)];
const KEYS_HELP: &[KeyCode] = &[KeyCode::Char('?'), KeyCode::F(1)];
const KEYS_CONFIRM: &[KeyCode] = &[KeyCode::Enter];
const KEYS_QUIT: &[KeyCode] = &[KeyCode::Esc, KeyCode::Char('q'), KeyCode::Char('Q')];

/// Map one key to a command. Unbound keys give `None`.
pub fn command_for_key(code: KeyCode) -> Option<Command> {
    let dir = if KEYS_LEFT.contains(&code) {
        Some(Direction::Left)
    } else if KEYS_RIGHT.contains(&code) {
        Some(Direction::Right)
    } else if KEYS_UP.contains(&code) {
        Some(Direction::Up)
    } else if KEYS_DOWN.contains(&code) {
        Some(Direction::Down)
    } else {
        None
    };

    if let Some(dir) = dir {
        Some(Command::Game(Action::Move(dir)))
    } else if KEYS_SWAP.contains(&code) {
        Some(Command::Game(Action::Swap))
    } else if KEYS_RESET.contains(&code) {
        Some(Command::Game(Action::Reset))
    } else if KEYS_HELP.contains(&code) {
        Some(Command::ToggleHelp)
    } else if KEYS_CONFIRM.contains(&code) {
        Some(Command::Confirm)
    } else if KEYS_QUIT.contains(&code) {
        Some(Command::Quit)
    } else {
        None
    }
}

/// Clicking the diamond swaps; clicking an open cell in the player's row
/// or column slides toward it. Walls, the player itself and diagonal
/// cells do nothing.
pub fn action_for_click(state: &GameState, target: Position) -> Option<Action> {
    if target == state.diamond {
        return Some(Action::Swap);
    }
    if !state.grid.contains(target) || state.grid.at(target).is_wall() {
        return None;
    }
    state.player.direction_to(target).map(Action::Move)
}

pub struct InputState {
    /// Timestamp of last Press/Repeat event for each key.
    last_active: HashMap<KeyCode, Instant>,

    /// Keys that transitioned from "not held" → "held" during the
    /// most recent drain_events() call, in arrival order.
    fresh_presses: Vec<KeyCode>,

    /// Raw key events collected during drain, for modifier checks.
    raw_events: Vec<KeyEvent>,

    /// Left-button presses this frame, as terminal (column, row).
    pub clicks: Vec<(u16, u16)>,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
            clicks: Vec::with_capacity(2),
        }
    }

    /// Drain all pending terminal events and update key states.
    /// Call this once per frame.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();
        self.clicks.clear();

        // Read all available events without blocking
        while poll(Duration::ZERO).unwrap_or(false) {
            match event::read() {
                Ok(Event::Key(key)) => {
                    self.raw_events.push(key);

                    if key.kind == KeyEventKind::Release {
                        continue;
                    }
                    let was_held = self.is_held(key.code);
                    self.last_active.insert(key.code, Instant::now());
                    if !was_held {
                        self.fresh_presses.push(key.code);
                    }
                }
                Ok(Event::Mouse(mouse)) => {
                    if let MouseEventKind::Down(MouseButton::Left) = mouse.kind {
                        self.clicks.push((mouse.column, mouse.row));
                    }
                }
                _ => {}
            }
        }

        // Expire keys that have timed out
        let now = Instant::now();
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    /// Commands for this frame's fresh presses, in arrival order.
    pub fn commands(&self) -> Vec<Command> {
        self.fresh_presses.iter().filter_map(|&c| command_for_key(c)).collect()
    }

    /// Check if any raw event this frame has Ctrl+C
    pub fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }

    // ── Internal ──

    fn is_held(&self, code: KeyCode) -> bool {
        self.last_active.get(&code)
            .map(|t| t.elapsed() < HOLD_TIMEOUT)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::level::parse_level;

    fn state(map: &str) -> GameState {
        GameState::from_level(&parse_level(map).unwrap(), 0, 0)
    }

    const BOARD: &str = "\
######
#P.$.#
#.#..#
#...D#
######";

    #[test]
    fn movement_keys() {
        assert_eq!(command_for_key(KeyCode::Left), Some(Command::Game(Action::Move(Direction::Left))));
        assert_eq!(command_for_key(KeyCode::Char('W')), Some(Command::Game(Action::Move(Direction::Up))));
        assert_eq!(command_for_key(KeyCode::Char('s')), Some(Command::Game(Action::Move(Direction::Down))));
        assert_eq!(command_for_key(KeyCode::Char('d')), Some(Command::Game(Action::Move(Direction::Right))));
    }

    #[test]
    fn meta_keys() {
        assert_eq!(command_for_key(KeyCode::Char(' ')), Some(Command::Game(Action::Swap)));
        assert_eq!(command_for_key(KeyCode::F(2)), Some(Command::Game(Action::Reset)));
        assert_eq!(command_for_key(KeyCode::Char('r')), Some(Command::Game(Action::Reset)));
        assert_eq!(command_for_key(KeyCode::Char('?')), Some(Command::ToggleHelp));
        assert_eq!(command_for_key(KeyCode::Enter), Some(Command::Confirm));
        assert_eq!(command_for_key(KeyCode::Esc), Some(Command::Quit));
        assert_eq!(command_for_key(KeyCode::Char('z')), None);
    }

    #[test]
    fn click_on_diamond_swaps() {
        let s = state(BOARD);
        assert_eq!(action_for_click(&s, Position::new(3, 4)), Some(Action::Swap));
    }

    #[test]
    fn click_in_line_slides_toward_it() {
        let s = state(BOARD);
        assert_eq!(action_for_click(&s, Position::new(1, 4)), Some(Action::Move(Direction::Right)));
        assert_eq!(action_for_click(&s, Position::new(3, 1)), Some(Action::Move(Direction::Down)));
        // coins are open cells too
        assert_eq!(action_for_click(&s, Position::new(1, 3)), Some(Action::Move(Direction::Right)));
    }

    #[test]
    fn click_ignored_elsewhere() {
        let s = state(BOARD);
        assert_eq!(action_for_click(&s, Position::new(1, 1)), None, "player");
        assert_eq!(action_for_click(&s, Position::new(0, 1)), None, "wall");
        assert_eq!(action_for_click(&s, Position::new(2, 3)), None, "diagonal");
        assert_eq!(action_for_click(&s, Position::new(1, 9)), None, "off grid");
    }
}
