//! Match Detection
//!
//! Pure scans over a grid snapshot. Rows are scanned before columns, so the
//! output order is deterministic for a given grid.

use std::collections::BTreeSet;

use serde::{Serialize, Deserialize};

use crate::game::grid::{Grid, Position};
use crate::game::token::Token;

/// Minimum run length that counts as a match.
pub const MIN_RUN: usize = 3;

/// Direction of a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    /// Consecutive columns of one row
    Horizontal,
    /// Consecutive rows of one column
    Vertical,
}

/// A maximal run of at least [`MIN_RUN`] identical tokens.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchRun {
    /// Shared color
    pub token: Token,
    /// Row or column run
    pub orientation: Orientation,
    /// Positions in scan order (left to right, or top to bottom)
    pub positions: Vec<Position>,
}

impl MatchRun {
    /// Number of cells in the run.
    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Runs are never empty; provided for clippy's `len_without_is_empty`.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Find every maximal run on the board.
///
/// Each line is scanned greedily: once three equal non-Empty cells are seen
/// the run is extended as far as it goes and scanning resumes right after it.
/// A run of 4 or 5 is therefore reported once, never as overlapping 3-runs.
/// A cell may still appear in one horizontal and one vertical run.
pub fn find_matches(grid: &Grid) -> Vec<MatchRun> {
    let w = grid.width();
    let mut runs = Vec::new();

    for row in 0..w {
        scan_line(w, |col| grid.at(row, col), |col| row * w + col, Orientation::Horizontal, &mut runs);
    }
    for col in 0..w {
        scan_line(w, |row| grid.at(row, col), |row| row * w + col, Orientation::Vertical, &mut runs);
    }

    runs
}

fn scan_line<T, P>(
    len: usize,
    token_at: T,
    position_at: P,
    orientation: Orientation,
    runs: &mut Vec<MatchRun>,
) where
    T: Fn(usize) -> Token,
    P: Fn(usize) -> Position,
{
    let mut i = 0;
    while i + MIN_RUN <= len {
        let token = token_at(i);
        if token.is_empty() || token_at(i + 1) != token || token_at(i + 2) != token {
            i += 1;
            continue;
        }

        let mut end = i + MIN_RUN;
        while end < len && token_at(end) == token {
            end += 1;
        }

        runs.push(MatchRun {
            token,
            orientation,
            positions: (i..end).map(&position_at).collect(),
        });
        i = end;
    }
}

/// Whether the board contains at least one run.
pub fn has_match(grid: &Grid) -> bool {
    (0..grid.len()).any(|pos| completes_run(grid, pos))
}

/// Whether the token at `pos` is part of a horizontal or vertical run.
pub fn completes_run(grid: &Grid, pos: Position) -> bool {
    let w = grid.width();
    if !grid.in_bounds(pos) {
        return false;
    }
    let (row, col) = (grid.row_of(pos), grid.col_of(pos));
    let token = grid.at(row, col);
    if token.is_empty() {
        return false;
    }

    let extent = |dr: isize, dc: isize| -> usize {
        let mut n = 0;
        let (mut r, mut c) = (row as isize + dr, col as isize + dc);
        while r >= 0 && c >= 0 && (r as usize) < w && (c as usize) < w && grid.at(r as usize, c as usize) == token {
            n += 1;
            r += dr;
            c += dc;
        }
        n
    };

    1 + extent(0, -1) + extent(0, 1) >= MIN_RUN || 1 + extent(-1, 0) + extent(1, 0) >= MIN_RUN
}

/// Distinct positions covered by `runs`, in ascending order.
pub fn positions_in(runs: &[MatchRun]) -> BTreeSet<Position> {
    runs.iter().flat_map(|r| r.positions.iter().copied()).collect()
}

/// Total cells across `runs`, counting a crossing cell once per run.
pub fn total_run_length(runs: &[MatchRun]) -> usize {
    runs.iter().map(MatchRun::len).sum()
}

/// Every adjacent swap that would create at least one run.
///
/// Each pair is listed once as `(a, b)` with `b` right of or below `a`.
pub fn find_valid_moves(grid: &Grid) -> Vec<(Position, Position)> {
    let w = grid.width();
    let mut moves = Vec::new();
    let mut scratch = grid.clone();

    for pos in 0..grid.len() {
        let (row, col) = (grid.row_of(pos), grid.col_of(pos));
        let neighbours = [
            (col + 1 < w).then(|| pos + 1),
            (row + 1 < w).then(|| pos + w),
        ];
        for other in neighbours.into_iter().flatten() {
            if grid.cells()[pos] == grid.cells()[other] {
                continue;
            }
            scratch.cells_swap(pos, other);
            if completes_run(&scratch, pos) || completes_run(&scratch, other) {
                moves.push((pos, other));
            }
            scratch.cells_swap(pos, other);
        }
    }

    moves
}

/// Whether any adjacent swap would create a run.
pub fn has_valid_move(grid: &Grid) -> bool {
    !find_valid_moves(grid).is_empty()
}

// =============================================================================
// TESTS
// =============================================================================
