//! Tokens
//!
//! The colored pieces that occupy grid cells.

use serde::{Serialize, Deserialize};

use crate::core::rng::DeterministicRng;

/// Number of colors in the full palette.
pub const PALETTE_SIZE: usize = 6;

/// Full palette, in draw order.
pub const PALETTE: [Token; PALETTE_SIZE] = [
    Token::Blue,
    Token::Orange,
    Token::Purple,
    Token::Red,
    Token::Yellow,
    Token::Green,
];

/// Content of a single cell.
///
/// `Empty` only exists while a cascade is being resolved.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Token {
    /// Vacated cell awaiting gravity or refill
    #[default]
    Empty = 0,
    /// Blue
    Blue = 1,
    /// Orange
    Orange = 2,
    /// Purple
    Purple = 3,
    /// Red
    Red = 4,
    /// Yellow
    Yellow = 5,
    /// Green
    Green = 6,
}

impl Token {
    /// Whether this is the transient sentinel.
    #[inline]
    pub fn is_empty(self) -> bool {
        self == Token::Empty
    }

    /// Whether this token is a color from the first `palette_size` entries.
    #[inline]
    pub fn in_palette(self, palette_size: usize) -> bool {
        let idx = self as usize;
        idx >= 1 && idx <= palette_size.min(PALETTE_SIZE)
    }

    /// Palette color at `index`.
    pub fn from_index(index: usize) -> Option<Token> {
        PALETTE.get(index).copied()
    }

    /// Draw a color uniformly from the first `palette_size` palette entries.
    #[inline]
    pub fn random(palette_size: usize, rng: &mut DeterministicRng) -> Token {
        let size = palette_size.clamp(1, PALETTE_SIZE);
        PALETTE[rng.below(size)]
    }

    /// Single-character code, used for compact board dumps.
    pub fn symbol(self) -> char {
        match self {
            Token::Empty => '.',
            Token::Blue => 'B',
            Token::Orange => 'O',
            Token::Purple => 'P',
            Token::Red => 'R',
            Token::Yellow => 'Y',
            Token::Green => 'G',
        }
    }

    /// Parse a symbol produced by [`Token::symbol`].
    pub fn from_symbol(c: char) -> Option<Token> {
        match c {
            '.' => Some(Token::Empty),
            'B' => Some(Token::Blue),
            'O' => Some(Token::Orange),
            'P' => Some(Token::Purple),
            'R' => Some(Token::Red),
            'Y' => Some(Token::Yellow),
            'G' => Some(Token::Green),
            _ => None,
        }
    }
}
