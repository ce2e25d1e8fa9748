//! Presentation layer: double-buffered, diff-based terminal renderer.
//!
//! How it works:
//!   1. Build the next frame into `front` buffer (array of Cell)
//!   2. Compare each cell with `back` buffer (previous frame)
//!   3. Only emit terminal commands for cells that changed
//!   4. All commands are batched with `queue!`, flushed once at the end
//!   5. Swap front/back
//!
//! This eliminates flicker caused by full-screen redraws.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{DisableMouseCapture, EnableMouseCapture},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::config::DisplayConfig;
use crate::domain::entity::Position;
use crate::domain::tile::Cell as Tile;
use crate::sim::view::BoardView;
use crate::sim::world::{Phase, Session};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: [u8; 16],  // up to 16 bytes of UTF-8
    ch_len: u8,
    fg: Color,
    bg: Color,
    wide: bool,    // true = this char occupies 2 terminal columns
    cont: bool,    // true = continuation of previous wide char (skip render)
}

impl Cell {
    /// Explicit dark background for all "empty" terminal cells.
    ///
    /// Using the same RGB for `Clear(ClearType::All)` and every cell keeps
    /// VTE terminals from showing lines in the inter-row gaps.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell {
        ch: [b' ', 0,0,0, 0,0,0,0, 0,0,0,0, 0,0,0,0],
        ch_len: 1,
        fg: Color::White,
        bg: Cell::BASE_BG,
        wide: false,
        cont: false,
    };

    const WIDE_CONT: Cell = Cell {
        ch: [0; 16],
        ch_len: 0,
        fg: Color::White,
        bg: Cell::BASE_BG,
        wide: false,
        cont: true,
    };

    /// Sentinel cell used to invalidate the back buffer.
    /// Different from any real cell, so every position will be diff'd.
    const INVALID: Cell = Cell {
        ch: [b'?', 0,0,0, 0,0,0,0, 0,0,0,0, 0,0,0,0],
        ch_len: 1,
        fg: Color::Magenta,
        bg: Color::Magenta,
        wide: false,
        cont: false,
    };

    /// Normalize bg: Color::Reset → BASE_BG so that every cell gets an
    /// explicit background color (never terminal-default).
    #[inline]
    fn norm_bg(bg: Color) -> Color {
        match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        }
    }

    fn from_char(c: char, fg: Color, bg: Color) -> Self {
        let mut cell = Self::BLANK;
        let len = c.encode_utf8(&mut cell.ch).len() as u8;
        cell.ch_len = len;
        cell.fg = fg;
        cell.bg = Self::norm_bg(bg);
        cell
    }

    fn from_char_wide(c: char, fg: Color, bg: Color) -> Self {
        Cell { wide: true, ..Self::from_char(c, fg, bg) }
    }

    fn as_str(&self) -> &str {
        std::str::from_utf8(&self.ch[..self.ch_len as usize]).unwrap_or("?")
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer {
            width: w,
            height: h,
            cells: vec![Cell::BLANK; w * h],
        }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// Write a string at (x, y) with given colors. Each char occupies 1 column.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (cx, ch) in (x..self.width).zip(s.chars()) {
            self.set(cx, y, Cell::from_char(ch, fg, bg));
        }
    }

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::from_char(' ', Color::White, bg));
        }
    }
}

// ── Layout ──

/// Each game cell = 2 terminal columns, so game column `c` maps to
/// terminal columns `MAP_COL + c*2` and `MAP_COL + c*2 + 1`.
const CELL_W: usize = 2;

/// Vertical offsets
const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;
const MAP_COL: usize = 2;

const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };
const MSG_BG: Color = Color::Rgb { r: 200, g: 180, b: 50 };
const FLOOR_BG: Color = Color::Rgb { r: 40, g: 40, b: 55 };

/// Grid cell under terminal position (column, row) for a `rows × cols`
/// map drawn at the standard offsets.
pub fn cell_at(column: u16, row: u16, rows: usize, cols: usize) -> Option<Position> {
    let (x, y) = (column as usize, row as usize);
    let r = y.checked_sub(MAP_ROW)?;
    let c = x.checked_sub(MAP_COL)? / CELL_W;
    (r < rows && c < cols).then_some(Position::new(r, c))
}

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_phase: Option<Phase>,
    emoji: bool,
    /// Size of the map drawn last frame; zero when no map is on screen.
    map_rows: usize,
    map_cols: usize,
}

impl Renderer {
    pub fn new(display: &DisplayConfig) -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_phase: None,
            emoji: display.emoji,
            map_rows: 0,
            map_cols: 0,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            EnableMouseCapture,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        // Force full repaint on first frame: back ≠ front for every cell.
        self.back.cells.fill(Cell::INVALID);

        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            ResetColor,
            DisableMouseCapture,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    /// Grid cell under a mouse click, if the click landed on the map.
    pub fn screen_to_grid(&self, column: u16, row: u16) -> Option<Position> {
        cell_at(column, row, self.map_rows, self.map_cols)
    }

    pub fn render(&mut self, session: &Session) -> io::Result<()> {
        // Detect terminal resize
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            // Force full repaint after resize.
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        // Detect phase change → clear for clean transition
        if self.last_phase != Some(session.phase) {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_phase = Some(session.phase);
        }

        self.compose(session);

        // Diff and emit
        self.flush_diff()?;

        // Swap: current front becomes next back
        std::mem::swap(&mut self.front, &mut self.back);

        Ok(())
    }

    /// Build the front buffer for this frame.
    fn compose(&mut self, session: &Session) {
        self.front.clear();
        match session.phase {
            Phase::Playing => {
                self.compose_game(session);
                if session.show_help {
                    self.compose_controls();
                }
            }
            Phase::AllComplete { total_moves } => {
                self.map_rows = 0;
                self.map_cols = 0;
                self.compose_all_complete(session.levels.len(), total_moves);
            }
        }
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Explicit base colors; ResetColor would fall back to the
        // terminal's own default background.
        queue!(self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            let mut x = 0;
            while x < self.front.width {
                let cell = self.front.get(x, y);
                let prev = self.back.get(x, y);

                // Skip continuation cells (right half of wide emoji)
                if cell.cont {
                    if cell != prev { need_move = true; }
                    x += 1;
                    continue;
                }

                // For wide cells, also check if the continuation changed
                let cont_changed = cell.wide
                    && x + 1 < self.front.width
                    && self.front.get(x + 1, y) != self.back.get(x + 1, y);

                if cell == prev && !cont_changed {
                    need_move = true;
                    x += 1;
                    continue;
                }

                // Position cursor if needed
                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }

                // Set colors only if changed
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }

                queue!(self.writer, Print(cell.as_str()))?;

                if cell.wide {
                    // Wide char printed: cursor advanced 2 columns
                    last_x = x + 1;
                    x += 2;
                } else {
                    last_x = x;
                    x += 1;
                }
                last_y = y;
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose_game(&mut self, session: &Session) {
        let s = &session.state;
        let view = BoardView::new(s);

        // ── HUD row ──
        let hud = format!(
            " Level: {}  Moves: {}/{}  Coins: {}/{}   {} ",
            s.level + 1,
            s.total_moves,
            session.rules.move_budget,
            s.coins_collected,
            s.total_coins,
            session.level_name(),
        );
        self.front.fill_row(HUD_ROW, HUD_BG);
        self.front.put_str(0, HUD_ROW, &hud, Color::White, HUD_BG);

        // ── Map ──
        self.map_rows = view.rows();
        self.map_cols = view.cols();
        for (r, cells) in view.iter_rows().enumerate() {
            for (c, tile) in cells.into_iter().enumerate() {
                self.compose_tile(tile, MAP_COL + c * CELL_W, MAP_ROW + r);
            }
        }

        // ── Message bar ──
        let msg_row = MAP_ROW + view.rows() + 1;
        if !session.message.is_empty() {
            let msg = format!(" ◈ {} ", session.message);
            self.front.fill_row(msg_row, MSG_BG);
            self.front.put_str(0, msg_row, &msg, Color::Black, MSG_BG);
        } else if s.budget_exhausted(session.rules.move_budget) {
            self.front.put_str(1, msg_row, "No moves left on this level. R: Reset", Color::Rgb{r:255,g:90,b:90}, Color::Reset);
        }

        // ── Help bar ──
        let help_row = MAP_ROW + view.rows() + 3;
        let help = " ←↑↓→/WASD:Slide  Space:Swap  R:Reset  ?:Controls  Q:Quit";
        self.front.put_str(0, help_row, help, Color::DarkGrey, Color::Reset);
    }

    /// Write one game cell (2 terminal columns) at (col, row).
    fn compose_tile(&mut self, tile: Tile, col: usize, row: usize) {
        if self.emoji {
            let glyph = match tile {
                Tile::Wall => Some('🧱'),
                Tile::Floor => None,
                Tile::Coin => Some('🪙'),
                Tile::Diamond => Some('💎'),
                Tile::Player => Some('🧙'),
            };
            match glyph {
                Some(ch) => {
                    self.front.set(col, row, Cell::from_char_wide(ch, Color::Reset, FLOOR_BG));
                    self.front.set(col + 1, row, Cell::WIDE_CONT);
                }
                None => {
                    self.front.set(col, row, Cell::from_char(' ', Color::Reset, FLOOR_BG));
                    self.front.set(col + 1, row, Cell::from_char(' ', Color::Reset, FLOOR_BG));
                }
            }
            return;
        }

        let (c0, c1, fg, bg) = match tile {
            Tile::Wall    => ('█', '█', Color::Rgb{r:120,g:120,b:120}, Color::Rgb{r:70,g:70,b:70}),
            Tile::Floor   => (' ', ' ', Color::Reset, FLOOR_BG),
            Tile::Coin    => ('(', ')', Color::Rgb{r:255,g:210,b:60}, FLOOR_BG),
            Tile::Diamond => ('<', '>', Color::Rgb{r:100,g:200,b:255}, FLOOR_BG),
            Tile::Player  => ('[', ']', Color::Rgb{r:80,g:255,b:80}, FLOOR_BG),
        };
        self.front.set(col, row, Cell::from_char(c0, fg, bg));
        self.front.set(col + 1, row, Cell::from_char(c1, fg, bg));
    }

    /// Controls panel, drawn over the map.
    fn compose_controls(&mut self) {
        let dim = Color::Rgb{r:40,g:40,b:40};
        let hdr = Color::Rgb{r:255,g:220,b:50};
        let key_c = Color::Rgb{r:100,g:200,b:255};
        let desc_c = Color::Rgb{r:180,g:180,b:180};

        let rows: [(&str, &str); 6] = [
            ("←↑↓→ WASD", "Slide until blocked"),
            ("Space", "Swap with the diamond"),
            ("Click", "Slide toward / swap"),
            ("R  F2", "Reset level"),
            ("?  F1", "Close this panel"),
            ("Esc  Q", "Quit"),
        ];

        let box_w = 42_usize;
        let box_h = rows.len() + 6;
        let box_x = MAP_COL;
        let box_y = MAP_ROW;

        // Draw dark background box
        for y in box_y..box_y + box_h {
            for x in box_x..box_x + box_w {
                self.front.set(x, y, Cell::from_char(' ', Color::Reset, dim));
            }
        }

        self.front.put_str(box_x + 2, box_y + 1, "CONTROLS", hdr, dim);
        for (i, (keys, desc)) in rows.iter().enumerate() {
            self.front.put_str(box_x + 2, box_y + 3 + i, keys, key_c, dim);
            self.front.put_str(box_x + 14, box_y + 3 + i, desc, desc_c, dim);
        }
        self.front.put_str(box_x + 2, box_y + 4 + rows.len(), "Collect every coin to clear the level.", desc_c, dim);
    }

    fn compose_all_complete(&mut self, level_count: usize, total_moves: u32) {
        let gold = Color::Rgb{r:255,g:220,b:50};
        let green = Color::Rgb{r:80,g:255,b:80};

        let banner = "  ★ ALL LEVELS COMPLETE! ★  ";
        let bar = "═".repeat(banner.chars().count());
        let box_art = [format!("╔{bar}╗"), format!("║{banner}║"), format!("╚{bar}╝")];
        for (i, l) in box_art.iter().enumerate() {
            self.front.put_str(4, 4 + i, l, gold, Color::Reset);
        }

        let levels = format!("◈ All {level_count} levels cleared");
        let moves = format!("◈ Total moves: {total_moves}");
        self.front.put_str(6, 9, &levels, Color::White, Color::Reset);
        self.front.put_str(6, 10, &moves, Color::White, Color::Reset);
        self.front.put_str(6, 12, "▸ ENTER: Play again from level 1", green, Color::Reset);
        self.front.put_str(6, 13, "▸ ESC:   Quit", Color::DarkGrey, Color::Reset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RulesConfig;
    use crate::domain::entity::{Action, Direction};
    use crate::sim::level::{parse_level, LevelSet};

    const MAP: &str = "\
######
#P.$.#
#D...#
######";

    fn session(maps: &[&str]) -> Session {
        let levels = LevelSet::new(maps.iter().map(|m| parse_level(m).unwrap()).collect(), "test").unwrap();
        Session::new(levels, RulesConfig { move_budget: 50 })
    }

    fn renderer(emoji: bool) -> Renderer {
        let mut r = Renderer::new(&DisplayConfig { emoji });
        r.front.resize(80, 24);
        r
    }

    fn row_text(buf: &FrameBuffer, y: usize) -> String {
        (0..buf.width)
            .map(|x| buf.get(x, y))
            .filter(|c| !c.cont)
            .map(|c| c.as_str().to_string())
            .collect::<String>()
            .trim_end()
            .to_string()
    }

    #[test]
    fn cell_mapping_respects_offsets() {
        assert_eq!(cell_at(2, 2, 4, 6), Some(Position::new(0, 0)));
        assert_eq!(cell_at(3, 2, 4, 6), Some(Position::new(0, 0)));
        assert_eq!(cell_at(4, 3, 4, 6), Some(Position::new(1, 1)));
        assert_eq!(cell_at(13, 5, 4, 6), Some(Position::new(3, 5)));
        assert_eq!(cell_at(14, 5, 4, 6), None);
        assert_eq!(cell_at(2, 6, 4, 6), None);
        assert_eq!(cell_at(1, 2, 4, 6), None);
        assert_eq!(cell_at(2, 1, 4, 6), None);
    }

    #[test]
    fn hud_and_ascii_map() {
        let mut r = renderer(false);
        let mut s = session(&[MAP]);
        s.dispatch(Action::Move(Direction::Down));
        r.compose(&s);
        assert_eq!(row_text(&r.front, HUD_ROW), " Level: 1  Moves: 0/50  Coins: 0/1   Unnamed");
        assert_eq!(row_text(&r.front, MAP_ROW + 1), "  ██[]  ()  ██");
        assert_eq!(r.screen_to_grid(4, 3), Some(Position::new(1, 1)));
    }

    #[test]
    fn emoji_map_uses_wide_cells() {
        let mut r = renderer(true);
        r.compose(&session(&[MAP]));
        let player = r.front.get(MAP_COL + CELL_W, MAP_ROW + 1);
        assert!(player.wide);
        assert_eq!(player.as_str(), "🧙");
        assert!(r.front.get(MAP_COL + CELL_W + 1, MAP_ROW + 1).cont);
    }

    #[test]
    fn message_bar_below_map() {
        let mut r = renderer(false);
        let mut s = session(&[MAP]);
        s.set_message("Level 1 reset", 10);
        r.compose(&s);
        assert_eq!(row_text(&r.front, MAP_ROW + 4 + 1), " ◈ Level 1 reset");
    }

    #[test]
    fn all_complete_screen_hides_map() {
        let mut r = renderer(false);
        let mut s = session(&[MAP]);
        s.dispatch(Action::Move(Direction::Right));
        assert!(matches!(s.phase, Phase::AllComplete { .. }));
        r.compose(&s);
        assert!(row_text(&r.front, 10).contains("Total moves: 1"));
        assert_eq!(r.screen_to_grid(4, 3), None);
    }
}
