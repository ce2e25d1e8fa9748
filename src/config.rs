//! External configuration loader.
//!
//! Reads `config.toml` from the executable's directory (or CWD).
//! Falls back to sensible defaults if the file is missing or incomplete.

use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::Deserialize;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub rules: RulesConfig,
    pub display: DisplayConfig,
    pub gamepad: GamepadConfig,
    pub levels_dir: PathBuf,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RulesConfig {
    /// Per-level ceiling; moves and swaps beyond it are ignored.
    pub move_budget: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DisplayConfig {
    pub emoji: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GamepadConfig {
    pub swap: Vec<String>,
    pub reset: Vec<String>,
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
    pub help: Vec<String>,
}

impl Default for RulesConfig {
    fn default() -> Self {
        RulesConfig { move_budget: default_move_budget() }
    }
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    rules: TomlRules,
    #[serde(default)]
    display: TomlDisplay,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlRules {
    #[serde(default = "default_move_budget")]
    move_budget: u32,
}

#[derive(Deserialize, Debug)]
struct TomlDisplay {
    #[serde(default = "default_emoji")]
    emoji: bool,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_swap")]
    swap: Vec<String>,
    #[serde(default = "default_reset")]
    reset: Vec<String>,
    #[serde(default = "default_confirm")]
    confirm: Vec<String>,
    #[serde(default = "default_cancel")]
    cancel: Vec<String>,
    #[serde(default = "default_help")]
    help: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_levels_dir")]
    levels_dir: String,
}

// ── Defaults ──

fn default_move_budget() -> u32 { 1024 }
fn default_emoji() -> bool { true }

fn default_swap() -> Vec<String> { vec!["A".into()] }
fn default_reset() -> Vec<String> { vec!["Y".into()] }
fn default_confirm() -> Vec<String> { vec!["Start".into()] }
fn default_cancel() -> Vec<String> { vec!["Select".into()] }
fn default_help() -> Vec<String> { vec!["X".into()] }
fn default_levels_dir() -> String { "levels".into() }

impl Default for TomlRules {
    fn default() -> Self {
        TomlRules { move_budget: default_move_budget() }
    }
}

impl Default for TomlDisplay {
    fn default() -> Self {
        TomlDisplay { emoji: default_emoji() }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            swap: default_swap(),
            reset: default_reset(),
            confirm: default_confirm(),
            cancel: default_cancel(),
            help: default_help(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral { levels_dir: default_levels_dir() }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory,
    /// (3) XDG data home, (4) system data directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);
        Self::from_toml(toml_cfg, &search_dirs)
    }

    fn from_toml(toml_cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        let levels_dir = resolve_levels_dir(&toml_cfg.general.levels_dir, search_dirs);

        let mut move_budget = toml_cfg.rules.move_budget;
        if move_budget == 0 {
            warn!("rules.move_budget = 0 would block every move, using {}", default_move_budget());
            move_budget = default_move_budget();
        }

        GameConfig {
            rules: RulesConfig { move_budget },
            display: DisplayConfig { emoji: toml_cfg.display.emoji },
            gamepad: GamepadConfig {
                swap: toml_cfg.gamepad.swap,
                reset: toml_cfg.gamepad.reset,
                confirm: toml_cfg.gamepad.confirm,
                cancel: toml_cfg.gamepad.cancel,
                help: toml_cfg.gamepad.help,
            },
            levels_dir,
        }
    }
}

/// Absolute paths are used as-is; relative ones are looked up in the
/// candidate directories, falling back to CWD.
fn resolve_levels_dir(dir: &str, search_dirs: &[PathBuf]) -> PathBuf {
    let path = Path::new(dir);
    if path.is_absolute() {
        return path.to_path_buf();
    }
    search_dirs
        .iter()
        .map(|d| d.join(dir))
        .find(|p| p.is_dir())
        .unwrap_or_else(|| path.to_path_buf())
}

/// Candidate directories to search: exe dir + CWD + data paths (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = vec![];
    let mut push = |dir: PathBuf| {
        if !dirs.contains(&dir) {
            dirs.push(dir);
        }
    };

    // 1. Directory of the running executable (symlinks resolved)
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        push(cwd);
    }

    // 3. XDG data home
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/diamondswap");
        if xdg.is_dir() {
            push(xdg);
        }
    }

    // 4. System data directory
    let sys = PathBuf::from("/usr/share/diamondswap");
    if sys.is_dir() {
        push(sys);
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }
    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if !path.exists() {
            continue;
        }
        match std::fs::read_to_string(&path) {
            Ok(text) => {
                debug!("reading {}", path.display());
                return parse_toml(&text);
            }
            Err(e) => warn!("could not read {}: {e}", path.display()),
        }
    }
    TomlConfig::default()
}

fn parse_toml(text: &str) -> TomlConfig {
    match toml::from_str::<TomlConfig>(text) {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("config.toml parse error, using default settings: {e}");
            TomlConfig::default()
        }
    }
}
