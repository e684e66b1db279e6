//! Board Generation
//!
//! Builds starting boards that are already stable and still playable.

use tracing::{debug, warn};

use crate::core::rng::DeterministicRng;
use crate::game::grid::Grid;
use crate::game::matcher::has_valid_move;
use crate::game::token::{Token, PALETTE, PALETTE_SIZE};

/// Default number of boards tried before giving up on playability.
pub const DEFAULT_GENERATION_ATTEMPTS: u32 = 64;

/// Fill a board with no pre-existing run.
///
/// Cells are filled row-major. A cell never takes the color of its two left
/// neighbours when they agree, nor of its two upper neighbours when they
/// agree, so no run can form. With four or more colors at most two are
/// excluded and a choice always remains.
pub fn generate_stable(width: usize, palette_size: usize, rng: &mut DeterministicRng) -> Grid {
    let palette = &PALETTE[..palette_size.clamp(1, PALETTE_SIZE)];
    let mut cells: Vec<Token> = Vec::with_capacity(width * width);
    let mut allowed: Vec<Token> = Vec::with_capacity(palette.len());

    for pos in 0..width * width {
        let (row, col) = (pos / width, pos % width);

        let left = (col >= 2 && cells[pos - 1] == cells[pos - 2]).then(|| cells[pos - 1]);
        let up = (row >= 2 && cells[pos - width] == cells[pos - 2 * width]).then(|| cells[pos - width]);

        allowed.clear();
        allowed.extend(palette.iter().copied().filter(|t| Some(*t) != left && Some(*t) != up));

        let token = match rng.choose(&allowed) {
            Some(t) => *t,
            // Only reachable with a palette of one or two colors
            None => Token::random(palette_size, rng),
        };
        cells.push(token);
    }

    Grid::from_tokens(width, cells).unwrap_or_else(|| Grid::empty(width))
}

/// Fill a board with no pre-existing run and at least one valid move.
///
/// Tries up to `max_attempts` boards. If none is playable the last stable
/// board is returned and a warning is logged.
pub fn generate_playable(
    width: usize,
    palette_size: usize,
    rng: &mut DeterministicRng,
    max_attempts: u32,
) -> Grid {
    let mut grid = generate_stable(width, palette_size, rng);
    let mut attempt = 1;

    while !has_valid_move(&grid) {
        if attempt >= max_attempts {
            warn!("No playable board after {} attempts, using a stuck board", attempt);
            return grid;
        }
        grid = generate_stable(width, palette_size, rng);
        attempt += 1;
    }

    debug!("Generated playable {}x{} board in {} attempt(s)", width, width, attempt);
    grid
}
