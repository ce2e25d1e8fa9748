//! Cell tags and their properties.
//! Properties are queried via methods, not stored as flags,
//! so cell semantics are centralized here.

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Cell {
    Wall,
    #[default]
    Floor,
    Coin,    // overlay only
    Diamond, // overlay only
    Player,  // overlay only
}

impl Cell {
    /// Only walls and floor are ever stored in a grid; the rest are
    /// entity overlays composed at query time.
    pub fn is_terrain(self) -> bool {
        matches!(self, Cell::Wall | Cell::Floor)
    }

    /// Does this stored tag stop a slide?
    pub fn is_wall(self) -> bool {
        matches!(self, Cell::Wall)
    }

    /// The terrain left behind once an entity glyph is lifted off the map.
    pub fn terrain(self) -> Cell {
        if self.is_terrain() { self } else { Cell::Floor }
    }

    /// Map a level glyph to a cell. Both the ASCII and the emoji
    /// alphabets are accepted.
    pub fn from_glyph(ch: char) -> Option<Cell> {
        match ch {
            '#' | '🧱' => Some(Cell::Wall),
            '.' | ' ' | '⬜' => Some(Cell::Floor),
            '$' | '🪙' => Some(Cell::Coin),
            'D' | '💎' => Some(Cell::Diamond),
            'P' | '🧙' => Some(Cell::Player),
            _ => None,
        }
    }

    /// ASCII glyph, as written in level files.
    pub fn ascii(self) -> char {
        match self {
            Cell::Wall => '#',
            Cell::Floor => '.',
            Cell::Coin => '$',
            Cell::Diamond => 'D',
            Cell::Player => 'P',
        }
    }
}
