//! Level loader.
//!
//! ## Sources (priority order):
//!   1. `levels/` directory (individual `.txt` files, sorted by file name)
//!   2. Built-in embedded levels
//!
//! ## Single-level format (`.txt`):
//!   Optional line 1: `# Level Name`
//!   Lines: map rows, all the same width
//!
//! The first line is a name when it starts with `# ` (hash, space), or
//! when something after the `#` is not a map glyph. So `# PD` and
//! `# Spiral` are names, while `#..P.D#` is map data.
//!
//! ## Glyph legend (ASCII / emoji):
//!   '#' 🧱 = Wall        '.' ' ' ⬜ = Floor
//!   '$' 🪙 = Coin        'D' 💎    = Diamond
//!   'P' 🧙 = Player
//!
//! The emoji variation selector (U+FE0F) is dropped before parsing.
//! Every coin, diamond and player glyph sits on floor.

use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use thiserror::Error;

use crate::domain::entity::Position;
use crate::domain::grid::Grid;
use crate::domain::tile::Cell;
use super::state::GameState;

const VARIATION_SELECTOR: char = '\u{FE0F}';

/// Immutable level template. Each attempt clones what it needs.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Level {
    pub name: String,
    pub grid: Grid,
    pub player_start: Position,
    pub diamond_start: Position,
    pub coins: BTreeSet<Position>,
}

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("level has no map rows")]
    Empty,
    #[error("row {row} has {found} cells, expected {expected}")]
    Ragged { row: usize, expected: usize, found: usize },
    #[error("unknown glyph {glyph:?} at row {row}, col {col}")]
    UnknownGlyph { row: usize, col: usize, glyph: char },
    #[error("no player start")]
    MissingPlayer,
    #[error("no diamond")]
    MissingDiamond,
    #[error("second player start at {second}, first at {first}")]
    DuplicatePlayer { first: Position, second: Position },
    #[error("second diamond at {second}, first at {first}")]
    DuplicateDiamond { first: Position, second: Position },
    #[error("could not read {path:?}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("level {name:?}: {source}")]
    InLevel { name: String, source: Box<LevelError> },
    #[error("no levels found in {0}")]
    NoLevels(String),
}

type Result<T> = std::result::Result<T, LevelError>;

/// The ordered levels of one play session. Never empty.
#[derive(Clone, Debug)]
pub struct LevelSet {
    levels: Vec<Level>,
    origin: String,
}

impl LevelSet {
    pub fn new(levels: Vec<Level>, origin: impl Into<String>) -> Result<Self> {
        let origin = origin.into();
        if levels.is_empty() {
            return Err(LevelError::NoLevels(origin));
        }
        Ok(LevelSet { levels, origin })
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn get(&self, idx: usize) -> Option<&Level> {
        self.levels.get(idx)
    }

    /// Where these levels came from, for display.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Out-of-range indices fall back to the first level.
    pub fn clamp(&self, idx: usize) -> usize {
        if idx < self.levels.len() {
            idx
        } else {
            warn!("level index {idx} out of range (have {}), using level 0", self.levels.len());
            0
        }
    }

    pub fn is_last(&self, idx: usize) -> bool {
        idx + 1 >= self.levels.len()
    }
}

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

/// Start a fresh attempt at `level_idx`, carrying the cumulative move count.
pub fn load_level(levels: &LevelSet, level_idx: usize, total_moves: u32) -> GameState {
    let idx = levels.clamp(level_idx);
    let level = &levels.levels[idx];
    info!(
        "loading level {} {:?}: {}x{}, {} coins",
        idx + 1,
        level.name,
        level.grid.rows(),
        level.grid.cols(),
        level.coins.len(),
    );
    GameState::from_level(level, idx, total_moves)
}

/// Load `.txt` levels from `dir`, or the built-in set when there are none.
/// A malformed level is fatal.
pub fn load_levels(dir: &Path) -> Result<LevelSet> {
    if dir.is_dir() {
        let files = level_files(dir)?;
        if !files.is_empty() {
            let dir_name = dir.file_name().unwrap_or_default().to_string_lossy().to_string();
            let levels = files
                .iter()
                .map(|path| load_level_file(path))
                .collect::<Result<Vec<_>>>()?;
            return LevelSet::new(levels, format!("{dir_name}/"));
        }
        debug!("{dir:?} has no .txt levels, using built-in set");
    }
    LevelSet::new(embedded_levels()?, "built-in")
}

/// Parse a bare map (no name line).
pub fn parse_level(content: &str) -> Result<Level> {
    parse_level_file(content, "Unnamed")
}

// ══════════════════════════════════════════════════════════════
// Single-level parsing
// ══════════════════════════════════════════════════════════════

/// Parse one level. `fallback_name` is used when there is no name line.
fn parse_level_file(content: &str, fallback_name: &str) -> Result<Level> {
    let mut name = String::new();
    let mut rows: Vec<&str> = vec![];

    for line in content.lines() {
        let line = line.trim_end_matches('\r');
        if rows.is_empty() && name.is_empty() && is_name_line(line) {
            name = line[1..].trim().to_string();
        } else if rows.is_empty() && line.trim().is_empty() {
            // leading blank lines
        } else {
            rows.push(line);
        }
    }
    while rows.last().map_or(false, |r| r.trim().is_empty()) {
        rows.pop();
    }

    if name.is_empty() {
        name = fallback_name.to_string();
    }

    match parse_map(&rows) {
        Ok((grid, player_start, diamond_start, coins)) => Ok(Level {
            name,
            grid,
            player_start,
            diamond_start,
            coins,
        }),
        Err(e) => Err(LevelError::InLevel { name, source: Box::new(e) }),
    }
}

/// Name lines start with `# `, or with `#` followed by anything that is
/// not a map glyph. Only consulted before the first map row.
fn is_name_line(line: &str) -> bool {
    if line.starts_with("# ") {
        return true;
    }
    match line.strip_prefix('#') {
        Some(rest) => rest
            .chars()
            .filter(|&c| c != VARIATION_SELECTOR)
            .any(|c| Cell::from_glyph(c).is_none()),
        None => false,
    }
}

fn parse_map(rows: &[&str]) -> Result<(Grid, Position, Position, BTreeSet<Position>)> {
    if rows.is_empty() {
        return Err(LevelError::Empty);
    }

    let mut player: Option<Position> = None;
    let mut diamond: Option<Position> = None;
    let mut coins = BTreeSet::new();
    let mut cells = Vec::with_capacity(rows.len());

    for (r, line) in rows.iter().enumerate() {
        let mut row = vec![];
        for (c, glyph) in line.chars().filter(|&ch| ch != VARIATION_SELECTOR).enumerate() {
            let pos = Position::new(r, c);
            let cell = Cell::from_glyph(glyph)
                .ok_or(LevelError::UnknownGlyph { row: r, col: c, glyph })?;
            match cell {
                Cell::Player => {
                    if let Some(first) = player {
                        return Err(LevelError::DuplicatePlayer { first, second: pos });
                    }
                    player = Some(pos);
                }
                Cell::Diamond => {
                    if let Some(first) = diamond {
                        return Err(LevelError::DuplicateDiamond { first, second: pos });
                    }
                    diamond = Some(pos);
                }
                Cell::Coin => {
                    coins.insert(pos);
                }
                Cell::Wall | Cell::Floor => {}
            }
            row.push(cell);
        }
        cells.push(row);
    }

    let grid = Grid::from_rows(cells).map_err(|e| LevelError::Ragged {
        row: e.row,
        expected: e.expected,
        found: e.found,
    })?;
    let player = player.ok_or(LevelError::MissingPlayer)?;
    let diamond = diamond.ok_or(LevelError::MissingDiamond)?;

    Ok((grid, player, diamond, coins))
}

// ══════════════════════════════════════════════════════════════
// Directory loading (individual .txt files)
// ══════════════════════════════════════════════════════════════

fn level_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .map_err(|source| LevelError::Io { path: dir.to_path_buf(), source })?;
    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.is_file() && p.extension().map_or(false, |x| x == "txt"))
        .collect();
    files.sort();
    Ok(files)
}

fn load_level_file(path: &Path) -> Result<Level> {
    let content = std::fs::read_to_string(path)
        .map_err(|source| LevelError::Io { path: path.to_path_buf(), source })?;
    let stem = path.file_stem().unwrap_or_default().to_string_lossy();
    let level = parse_level_file(&content, &stem)?;
    debug!("parsed {path:?} as {:?}", level.name);
    Ok(level)
}

// ══════════════════════════════════════════════════════════════
// Embedded levels
// ══════════════════════════════════════════════════════════════

fn embedded_levels() -> Result<Vec<Level>> {
    EMBEDDED
        .iter()
        .enumerate()
        .map(|(i, map)| parse_level_file(&map.join("\n"), &format!("Level {}", i + 1)))
        .collect()
}

const EMBEDDED: [&[&str]; 10] = [
    &[
        "############",
        "#..........#",
        "##...#$....#",
        "#...###....#",
        "#.#.$#..#$.#",
        "####...#####",
        "#.#$....#$.#",
        "#...P.D..$.#",
        "############",
    ],
    &[
        "############",
        "#........#$#",
        "#....$.....#",
        "#..........#",
        "##$#.#..#.##",
        "#.#$#..#$#.#",
        "#...P......#",
        "#..#..D.#..#",
        "############",
    ],
    &[
        "############",
        "#........#.#",
        "#..##...##.#",
        "#.$#$......#",
        "#.....##...#",
        "#.....$#.$.#",
        "#.#$.......#",
        "#.##P#D....#",
        "############",
    ],
    &[
        "############",
        "#.#.......##",
        "#.#.....$.##",
        "#.##..$....#",
        "#..#$......#",
        "#..#...###.#",
        "#.$........#",
        "#...P.D..$.#",
        "############",
    ],
    &[
        "############",
        "####......##",
        "###..#$#..##",
        "##...$#$...#",
        "#....#$#$..#",
        "#...#...#..#",
        "#.........##",
        "#P....D..###",
        "############",
    ],
    &[
        "############",
        "#.....##...#",
        "#......#$#.#",
        "#.#.#..$#..#",
        "#.$#$..#$#.#",
        "#.#.#......#",
        "#..........#",
        "#...P.D..#.#",
        "############",
    ],
    &[
        "############",
        "#####......#",
        "####......##",
        "###$.#$....#",
        "##$.###..$##",
        "#....#..$###",
        "#.......####",
        "#...P.D#####",
        "############",
    ],
    &[
        "############",
        "#..........#",
        "#..#$..##..#",
        "#..###.$#$.#",
        "#....#.....#",
        "####.$.....#",
        "###$..###..#",
        "#...P.D....#",
        "############",
    ],
    &[
        "############",
        "#.........##",
        "#.##$..##.##",
        "#.#.#.#$...#",
        "#.#.#.$#$..#",
        "#.#.#..$#..#",
        "#.##..##...#",
        "#...P.D....#",
        "############",
    ],
    &[
        "############",
        "#..........#",
        "#..#..##...#",
        "#.#.#..$#..#",
        "#.$#$..#$..#",
        "#.#.#..$#..#",
        "#..#..##...#",
        "#....PD....#",
        "############",
    ],
];

#[cfg(test)]
mod tests {
    use super::*;

    fn inner(err: LevelError) -> LevelError {
        match err {
            LevelError::InLevel { source, .. } => *source,
            other => other,
        }
    }

    #[test]
    fn parses_ascii_map() {
        let level = parse_level(
            "#######\n\
             #P.$.D#\n\
             #..$..#\n\
             #######",
        )
        .unwrap();
        assert_eq!(level.grid.rows(), 4);
        assert_eq!(level.grid.cols(), 7);
        assert_eq!(level.player_start, Position::new(1, 1));
        assert_eq!(level.diamond_start, Position::new(1, 5));
        assert_eq!(level.coins.len(), 2);
        assert!(level.coins.contains(&Position::new(2, 3)));
        // entity cells are floor underneath
        assert_eq!(level.grid.at(level.player_start), Cell::Floor);
        assert_eq!(level.grid.at(level.diamond_start), Cell::Floor);
        assert_eq!(level.grid.at(Position::new(1, 3)), Cell::Floor);
    }

    #[test]
    fn emoji_map_matches_ascii_map() {
        let emoji = "🧱🧱🧱🧱🧱\n🧱🧙🪙💎🧱\n🧱⬜️⬜🪙🧱\n🧱🧱🧱🧱🧱";
        let ascii = "#####\n#P$D#\n#..$#\n#####";
        let a = parse_level(emoji).unwrap();
        let b = parse_level(ascii).unwrap();
        assert_eq!(a.grid, b.grid);
        assert_eq!(a.player_start, b.player_start);
        assert_eq!(a.diamond_start, b.diamond_start);
        assert_eq!(a.coins, b.coins);
    }

    #[test]
    fn name_line_is_read() {
        let level = parse_level_file("# Spiral Vault\n#####\n#P$D#\n#####\n\n", "fallback").unwrap();
        assert_eq!(level.name, "Spiral Vault");
        assert_eq!(level.grid.rows(), 3);
    }

    #[test]
    fn wall_row_is_not_a_name() {
        let level = parse_level_file("#P$D#\n#####", "fallback").unwrap();
        assert_eq!(level.name, "fallback");
        assert_eq!(level.grid.rows(), 2);
    }

    #[test]
    fn spaced_name_may_use_glyph_letters() {
        let level = parse_level_file("# PD\n####\n#PD#\n####", "fallback").unwrap();
        assert_eq!(level.name, "PD");
        assert_eq!(level.grid.rows(), 3);
        assert_eq!(level.player_start, Position::new(1, 1));
    }

    #[test]
    fn ragged_rows_rejected() {
        let err = inner(parse_level("#####\n#P$D\n#####").unwrap_err());
        assert!(matches!(err, LevelError::Ragged { row: 1, expected: 5, found: 4 }));
    }

    #[test]
    fn unknown_glyph_rejected() {
        let err = inner(parse_level("#####\n#P?D#\n#####").unwrap_err());
        assert!(matches!(err, LevelError::UnknownGlyph { row: 1, col: 2, glyph: '?' }));
    }

    #[test]
    fn missing_entities_rejected() {
        assert!(matches!(inner(parse_level("####\n#$D#\n####").unwrap_err()), LevelError::MissingPlayer));
        assert!(matches!(inner(parse_level("####\n#P$#\n####").unwrap_err()), LevelError::MissingDiamond));
        assert!(matches!(inner(parse_level("").unwrap_err()), LevelError::Empty));
    }

    #[test]
    fn duplicate_entities_rejected() {
        let err = inner(parse_level("#####\n#PDP#\n#####").unwrap_err());
        assert!(matches!(
            err,
            LevelError::DuplicatePlayer { first, second }
                if first == Position::new(1, 1) && second == Position::new(1, 3)
        ));
        let err = inner(parse_level("#####\n#DPD#\n#####").unwrap_err());
        assert!(matches!(err, LevelError::DuplicateDiamond { .. }));
    }

    #[test]
    fn error_names_the_level() {
        let err = parse_level_file("# Broken\n###\n#P#\n###", "x").unwrap_err();
        assert_eq!(err.to_string(), "level \"Broken\": no diamond");
    }

    #[test]
    fn embedded_levels_are_well_formed() {
        let levels = embedded_levels().unwrap();
        assert_eq!(levels.len(), 10);
        for level in &levels {
            assert_eq!(level.grid.rows(), 9, "{}", level.name);
            assert_eq!(level.grid.cols(), 12, "{}", level.name);
            assert!(!level.coins.is_empty(), "{}", level.name);
            assert!(!level.coins.contains(&level.player_start));
            assert_ne!(level.player_start, level.diamond_start);
        }
        assert_eq!(levels[0].name, "Level 1");
        assert_eq!(levels[0].player_start, Position::new(7, 4));
        assert_eq!(levels[0].diamond_start, Position::new(7, 6));
    }

    #[test]
    fn out_of_range_index_clamps_to_first() {
        let set = LevelSet::new(embedded_levels().unwrap(), "built-in").unwrap();
        assert_eq!(set.clamp(3), 3);
        assert_eq!(set.clamp(99), 0);
        let state = load_level(&set, 42, 7);
        assert_eq!(state.level, 0);
        assert_eq!(state.total_moves, 7);
        assert!(set.is_last(9));
        assert!(!set.is_last(8));
    }

    /// Fresh scratch directory under the system temp dir.
    fn scratch_dir(test_id: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("diamondswap-test-{}-{}", test_id, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn levels_dir_is_read_in_file_name_order() {
        let dir = scratch_dir("levels-dir");
        std::fs::write(dir.join("b.txt"), "# Second\n#####\n#P$D#\n#####\n").unwrap();
        std::fs::write(dir.join("a.txt"), "######\n#P.$D#\n######\n").unwrap();
        std::fs::write(dir.join("notes.md"), "not a level").unwrap();
        std::fs::create_dir(dir.join("drafts.txt")).unwrap();

        let set = load_levels(&dir).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.get(0).unwrap().name, "a");
        assert_eq!(set.get(0).unwrap().grid.cols(), 6);
        assert_eq!(set.get(1).unwrap().name, "Second");
        assert_eq!(set.origin(), format!("{}/", dir.file_name().unwrap().to_string_lossy()));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn levels_dir_without_txt_falls_back_to_built_in() {
        let dir = scratch_dir("no-txt");
        std::fs::write(dir.join("readme.md"), "# nothing here").unwrap();

        let set = load_levels(&dir).unwrap();
        assert_eq!(set.origin(), "built-in");
        assert_eq!(set.len(), 10);
        assert_eq!(set.get(0).unwrap().name, "Level 1");

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_levels_dir_uses_built_in() {
        let set = load_levels(Path::new("/nonexistent/diamondswap/levels")).unwrap();
        assert_eq!(set.origin(), "built-in");
    }

    #[test]
    fn bad_level_file_names_its_level() {
        let dir = scratch_dir("bad-file");
        std::fs::write(dir.join("broken.txt"), "####\n#P$#\n####\n").unwrap();

        let err = load_levels(&dir).unwrap_err();
        assert_eq!(err.to_string(), "level \"broken\": no diamond");

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn unreadable_level_file_is_io_error() {
        let err = load_level_file(Path::new("/nonexistent/diamondswap/a.txt")).unwrap_err();
        assert!(matches!(err, LevelError::Io { .. }));
    }

    #[test]
    fn empty_set_rejected() {
        assert!(matches!(LevelSet::new(vec![], "nowhere"), Err(LevelError::NoLevels(_))));
    }
}
