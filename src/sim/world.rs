//! Session: the mutable shell around the pure step function.
//!
//! Owns the level set, the current `GameState` snapshot and the bits of
//! presentation state the renderer needs (screen phase, message bar,
//! controls panel). Every action goes through `dispatch`, which swaps in
//! the new snapshot as a whole.

use log::debug;

use crate::config::RulesConfig;
use crate::domain::entity::Action;
use super::event::GameEvent;
use super::level::LevelSet;
use super::state::GameState;
use super::step::{self, Progress};

/// Message bar lifetime, in UI ticks.
pub const MESSAGE_TICKS: u32 = 40;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Playing,
    /// The last level was cleared. Level 0 is already loaded underneath;
    /// input is held until the player acknowledges.
    AllComplete { total_moves: u32 },
}

pub struct Session {
    pub levels: LevelSet,
    pub state: GameState,
    pub rules: RulesConfig,
    pub phase: Phase,

    // ── UI ──
    pub show_help: bool,
    pub message: String,
    pub message_timer: u32,
}

impl Session {
    pub fn new(levels: LevelSet, rules: RulesConfig) -> Self {
        let state = step::new_game(&levels);
        Session {
            levels,
            state,
            rules,
            phase: Phase::Playing,
            show_help: false,
            message: String::new(),
            message_timer: 0,
        }
    }

    pub fn level_name(&self) -> &str {
        self.levels.get(self.state.level).map_or("", |l| l.name.as_str())
    }

    /// Apply one action. Ignored while the all-complete screen is up.
    pub fn dispatch(&mut self, action: Action) -> Vec<GameEvent> {
        if self.phase != Phase::Playing {
            debug!("{action:?} ignored on the all-complete screen");
            return Vec::new();
        }

        let transition = step::apply(&self.state, action, &self.levels, &self.rules);
        self.state = transition.state;
        match transition.progress {
            Progress::Playing { level } => debug!("level {}: {} moves", level + 1, self.state.moves),
            Progress::LevelComplete { level } => debug!("left level {}", level + 1),
            Progress::AllLevelsComplete => debug!("holding input on the all-complete screen"),
        }

        for event in &transition.events {
            match *event {
                GameEvent::Slid { from, to, collected } => {
                    debug!("slid {from} -> {to}, {collected} coin(s)");
                }
                GameEvent::Blocked { dir } => debug!("blocked moving {dir:?}"),
                GameEvent::Swapped { player, diamond } => {
                    debug!("swapped: player at {player}, diamond at {diamond}");
                }
                GameEvent::BudgetExhausted => {
                    self.set_message("Out of moves! Press R to reset", MESSAGE_TICKS);
                }
                GameEvent::LevelReset { level } => {
                    self.set_message(&format!("Level {} reset", level + 1), MESSAGE_TICKS);
                }
                GameEvent::LevelComplete { level, moves } => {
                    self.set_message(&format!("Level {} complete in {} moves!", level + 1, moves), MESSAGE_TICKS);
                }
                GameEvent::AllLevelsComplete { total_moves } => {
                    self.phase = Phase::AllComplete { total_moves };
                }
                GameEvent::LevelLoaded { level } => {
                    if let Some(next) = self.levels.get(level) {
                        let msg = format!("{} Next: {}", self.message, next.name);
                        self.set_message(&msg, MESSAGE_TICKS);
                    }
                }
            }
        }

        transition.events
    }

    /// Leave the all-complete screen and resume on level 1.
    /// Returns false when there was nothing to acknowledge.
    pub fn acknowledge(&mut self) -> bool {
        if self.phase == Phase::Playing {
            return false;
        }
        self.phase = Phase::Playing;
        self.message.clear();
        self.message_timer = 0;
        true
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub fn set_message(&mut self, msg: &str, duration: u32) {
        self.message = msg.to_string();
        self.message_timer = duration;
    }

    /// Count down the message bar; called once per UI tick.
    pub fn tick_message(&mut self) {
        if self.message_timer > 0 {
            self.message_timer -= 1;
            if self.message_timer == 0 {
                self.message.clear();
            }
        }
    }
}
