//! Grid
//!
//! Square board of tokens stored row-major. Positions are plain indices;
//! row and column are derived from the width.

use std::fmt;

use serde::{Serialize, Deserialize};

use crate::core::hash::{HashDomain, StateHash, StateHasher};
use crate::core::rng::DeterministicRng;
use crate::game::error::EngineError;
use crate::game::token::Token;

/// Cell index in `0..width²`.
pub type Position = usize;

/// Default board width.
pub const DEFAULT_WIDTH: usize = 8;

/// Largest board width a session accepts.
pub const MAX_WIDTH: usize = 64;

/// Whether two positions are orthogonal neighbours on a board of `width`.
///
/// Never true for a position and itself, for diagonals, or across a row
/// boundary.
#[inline]
pub fn are_adjacent(width: usize, a: Position, b: Position) -> bool {
    if width == 0 {
        return false;
    }
    let (ra, ca) = (a / width, a % width);
    let (rb, cb) = (b / width, b % width);
    (ra.abs_diff(rb) == 1 && ca == cb) || (ca.abs_diff(cb) == 1 && ra == rb)
}

/// A `width × width` board.
///
/// Deserialization goes through [`Grid::from_tokens`], so a decoded grid
/// always has `width²` cells.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "GridRepr")]
pub struct Grid {
    width: usize,
    cells: Vec<Token>,
}

/// Wire shape of a [`Grid`] before its dimensions are checked.
#[derive(Deserialize)]
struct GridRepr {
    width: usize,
    cells: Vec<Token>,
}

impl TryFrom<GridRepr> for Grid {
    type Error = String;

    fn try_from(repr: GridRepr) -> Result<Self, Self::Error> {
        let len = repr.cells.len();
        Grid::from_tokens(repr.width, repr.cells)
            .ok_or_else(|| format!("{} cells do not form a {}-wide square grid", len, repr.width))
    }
}

impl Grid {
    /// Board with every cell set to `token`.
    pub fn filled(width: usize, token: Token) -> Self {
        Self {
            width,
            cells: vec![token; width * width],
        }
    }

    /// Board of `width` with every cell `Empty`.
    pub fn empty(width: usize) -> Self {
        Self::filled(width, Token::Empty)
    }

    /// Board from a row-major token vector. `None` if the length is not a square of `width`.
    pub fn from_tokens(width: usize, cells: Vec<Token>) -> Option<Self> {
        if width == 0 || width.checked_mul(width) != Some(cells.len()) {
            return None;
        }
        Some(Self { width, cells })
    }

    /// Board from rows of [`Token::symbol`] characters.
    ///
    /// ```
    /// use mon_crush::game::grid::Grid;
    ///
    /// let grid = Grid::from_rows(&["RRB", "GBY", "YGO"]).unwrap();
    /// assert_eq!(grid.width(), 3);
    /// ```
    pub fn from_rows(rows: &[&str]) -> Option<Self> {
        let width = rows.len();
        let mut cells = Vec::with_capacity(width * width);
        for row in rows {
            let before = cells.len();
            for c in row.chars() {
                cells.push(Token::from_symbol(c)?);
            }
            if cells.len() - before != width {
                return None;
            }
        }
        Self::from_tokens(width, cells)
    }

    /// Board filled uniformly at random. May contain runs.
    pub fn random(width: usize, palette_size: usize, rng: &mut DeterministicRng) -> Self {
        let cells = (0..width * width)
            .map(|_| Token::random(palette_size, rng))
            .collect();
        Self { width, cells }
    }

    /// Side length.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of cells (`width²`).
    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the grid has no cells.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Row-major view of every cell.
    #[inline]
    pub fn cells(&self) -> &[Token] {
        &self.cells
    }

    /// Whether `pos` addresses a cell.
    #[inline]
    pub fn in_bounds(&self, pos: Position) -> bool {
        pos < self.cells.len()
    }

    fn check(&self, pos: Position) -> Result<(), EngineError> {
        if self.in_bounds(pos) {
            Ok(())
        } else {
            Err(EngineError::OutOfBounds {
                position: pos,
                cells: self.cells.len(),
            })
        }
    }

    /// Token at `pos`.
    pub fn get(&self, pos: Position) -> Result<Token, EngineError> {
        self.check(pos)?;
        Ok(self.cells[pos])
    }

    /// Overwrite the token at `pos`.
    pub fn set(&mut self, pos: Position, token: Token) -> Result<(), EngineError> {
        self.check(pos)?;
        self.cells[pos] = token;
        Ok(())
    }

    /// Exchange two cells. Adjacency is not checked here.
    pub fn swap(&mut self, a: Position, b: Position) -> Result<(), EngineError> {
        self.check(a)?;
        self.check(b)?;
        self.cells.swap(a, b);
        Ok(())
    }

    /// Row of `pos`.
    #[inline]
    pub fn row_of(&self, pos: Position) -> usize {
        pos / self.width
    }

    /// Column of `pos`.
    #[inline]
    pub fn col_of(&self, pos: Position) -> usize {
        pos % self.width
    }

    /// Position at `(row, col)`, if on the board.
    #[inline]
    pub fn position(&self, row: usize, col: usize) -> Option<Position> {
        (row < self.width && col < self.width).then(|| row * self.width + col)
    }

    /// Token at `(row, col)`. Callers guarantee the coordinates are on the board.
    #[inline]
    pub(crate) fn at(&self, row: usize, col: usize) -> Token {
        self.cells[row * self.width + col]
    }

    /// Unchecked swap for scratch boards. Callers guarantee both positions are on the board.
    #[inline]
    pub(crate) fn cells_swap(&mut self, a: Position, b: Position) {
        self.cells.swap(a, b);
    }

    /// Whether `a` and `b` are orthogonal neighbours on this board.
    #[inline]
    pub fn is_adjacent(&self, a: Position, b: Position) -> bool {
        self.in_bounds(a) && self.in_bounds(b) && are_adjacent(self.width, a, b)
    }

    /// Number of `Empty` cells.
    pub fn count_empty(&self) -> usize {
        self.cells.iter().filter(|t| t.is_empty()).count()
    }

    /// Whether every cell holds a color from the first `palette_size` entries.
    pub fn is_filled_from(&self, palette_size: usize) -> bool {
        self.cells.iter().all(|t| t.in_palette(palette_size))
    }

    /// Mark every listed position `Empty`. Out-of-range positions are skipped.
    pub fn clear_positions<I>(&mut self, positions: I)
    where
        I: IntoIterator<Item = Position>,
    {
        for pos in positions {
            if let Some(cell) = self.cells.get_mut(pos) {
                *cell = Token::Empty;
            }
        }
    }

    /// Let tokens fall into `Empty` cells below them.
    ///
    /// Per column this is a stable partition: surviving tokens keep their
    /// relative order and settle at the bottom, `Empty` cells collect at the
    /// top. Returns how many tokens moved.
    pub fn collapse(&mut self) -> usize {
        let w = self.width;
        let mut moved = 0;

        for col in 0..w {
            // Write cursor walks up from the bottom row
            let mut write = w;
            for row in (0..w).rev() {
                let idx = row * w + col;
                let token = self.cells[idx];
                if token.is_empty() {
                    continue;
                }
                write -= 1;
                if write != row {
                    self.cells[write * w + col] = token;
                    self.cells[idx] = Token::Empty;
                    moved += 1;
                }
            }
        }

        moved
    }

    /// Replace every `Empty` cell with an independently drawn color.
    ///
    /// Cells are filled in row-major order so a given RNG state always
    /// produces the same board. Returns the filled positions.
    pub fn refill(&mut self, palette_size: usize, rng: &mut DeterministicRng) -> Vec<Position> {
        let mut filled = Vec::new();
        for (pos, cell) in self.cells.iter_mut().enumerate() {
            if cell.is_empty() {
                *cell = Token::random(palette_size, rng);
                filled.push(pos);
            }
        }
        filled
    }

    /// Hash of width and cell contents.
    pub fn compute_hash(&self) -> StateHash {
        let mut hasher = StateHasher::new(HashDomain::Grid);
        self.hash_into(&mut hasher);
        hasher.finalize()
    }

    /// Feed this grid into an existing hasher.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u32(self.width as u32);
        hasher.update_cells(self.cells.iter().map(|t| *t as u8));
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.cells.chunks(self.width.max(1)).enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            for token in row {
                write!(f, "{}", token.symbol())?;
            }
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_coordinates() {
        let grid = Grid::empty(8);
        assert_eq!(grid.len(), 64);
        assert_eq!(grid.row_of(19), 2);
        assert_eq!(grid.col_of(19), 3);
        assert_eq!(grid.position(2, 3), Some(19));
        assert_eq!(grid.position(8, 0), None);
        assert_eq!(grid.position(0, 8), None);
    }

    #[test]
    fn test_adjacency() {
        let grid = Grid::empty(8);
        assert!(grid.is_adjacent(0, 1));
        assert!(grid.is_adjacent(0, 8));
        assert!(!grid.is_adjacent(0, 9), "diagonal");
        assert!(!grid.is_adjacent(7, 8), "row wrap-around");
        assert!(!grid.is_adjacent(0, 2));
        assert!(!grid.is_adjacent(5, 5));
        assert!(!grid.is_adjacent(63, 64), "out of bounds");
    }

    #[test]
    fn test_get_set_swap() {
        let mut grid = Grid::from_rows(&["RBG", "YOP", "RRB"]).unwrap();
        assert_eq!(grid.get(0), Ok(Token::Red));
        grid.set(0, Token::Green).unwrap();
        assert_eq!(grid.get(0), Ok(Token::Green));

        grid.swap(0, 1).unwrap();
        assert_eq!(grid.get(0), Ok(Token::Blue));
        assert_eq!(grid.get(1), Ok(Token::Green));
    }

    #[test]
    fn test_out_of_bounds() {
        let mut grid = Grid::empty(3);
        let err = EngineError::OutOfBounds { position: 9, cells: 9 };
        assert_eq!(grid.get(9), Err(err));
        assert_eq!(grid.set(9, Token::Red), Err(err));
        assert_eq!(grid.swap(0, 9), Err(err));
        // Failed swap leaves the board untouched
        assert_eq!(grid, Grid::empty(3));
    }

    #[test]
    fn test_clone_is_deep() {
        let original = Grid::filled(4, Token::Blue);
        let mut copy = original.clone();
        copy.set(0, Token::Red).unwrap();
        assert_eq!(original.get(0), Ok(Token::Blue));
    }

    #[test]
    fn test_from_rows_rejects_ragged() {
        assert!(Grid::from_rows(&["RB", "R"]).is_none());
        assert!(Grid::from_rows(&["RBX", "RRR", "BBB"]).is_none());
        assert!(Grid::from_tokens(3, vec![Token::Red; 8]).is_none());
    }

    #[test]
    fn test_collapse_is_stable_partition() {
        let mut grid = Grid::from_rows(&[
            "RGB",
            ".Y.",
            "B..",
        ])
        .unwrap();

        grid.collapse();

        assert_eq!(
            grid,
            Grid::from_rows(&[
                "...",
                "RG.",
                "BYB",
            ])
            .unwrap()
        );
    }

    #[test]
    fn test_collapse_keeps_column_order() {
        let mut grid = Grid::from_rows(&[
            "R..",
            "...",
            "G..",
        ])
        .unwrap();
        let moved = grid.collapse();
        assert_eq!(moved, 1);
        assert_eq!(grid.to_string(), "...\nR..\nG..");
    }

    #[test]
    fn test_refill_fills_only_empty() {
        let mut rng = DeterministicRng::new(3);
        let mut grid = Grid::from_rows(&["..R", "BGR", "BGY"]).unwrap();
        let filled = grid.refill(6, &mut rng);

        assert_eq!(filled, vec![0, 1]);
        assert_eq!(grid.count_empty(), 0);
        assert_eq!(grid.get(2), Ok(Token::Red));
        assert!(grid.is_filled_from(6));
    }

    #[test]
    fn test_deserialize_checks_dimensions() {
        let grid = Grid::from_rows(&["RB", "GY"]).unwrap();
        let json = serde_json::to_string(&grid).unwrap();
        assert_eq!(serde_json::from_str::<Grid>(&json).unwrap(), grid);

        assert!(serde_json::from_str::<Grid>(r#"{"width":8,"cells":["Red"]}"#).is_err());
        assert!(serde_json::from_str::<Grid>(r#"{"width":0,"cells":[]}"#).is_err());
        assert!(serde_json::from_str::<Grid>(
            r#"{"width":18446744073709551615,"cells":["Red"]}"#
        )
        .is_err());
    }

    #[test]
    fn test_hash_tracks_contents() {
        let a = Grid::filled(4, Token::Blue);
        let mut b = a.clone();
        assert_eq!(a.compute_hash(), b.compute_hash());
        b.set(5, Token::Red).unwrap();
        assert_ne!(a.compute_hash(), b.compute_hash());
    }

    proptest! {
        #[test]
        fn prop_adjacency_symmetric(a in 0usize..64, b in 0usize..64) {
            prop_assert_eq!(are_adjacent(8, a, b), are_adjacent(8, b, a));
            prop_assert!(!are_adjacent(8, a, a));
        }

        #[test]
        fn prop_collapse_preserves_tokens(seed in any::<u64>(), holes in proptest::collection::vec(0usize..36, 0..20)) {
            let mut rng = DeterministicRng::new(seed);
            let mut grid = Grid::random(6, 6, &mut rng);
            grid.clear_positions(holes);

            let mut before: Vec<Token> = grid.cells().iter().copied().filter(|t| !t.is_empty()).collect();
            grid.collapse();
            let mut after: Vec<Token> = grid.cells().iter().copied().filter(|t| !t.is_empty()).collect();
            before.sort();
            after.sort();
            prop_assert_eq!(before, after);

            // No token sits above an Empty cell
            for col in 0..6 {
                for row in 0..5 {
                    if !grid.at(row, col).is_empty() {
                        prop_assert!(!grid.at(row + 1, col).is_empty());
                    }
                }
            }
        }
    }
}
