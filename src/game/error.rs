//! Engine errors.
//!
//! Both variants are programming or input errors: validated UI input never
//! produces them. Neither is retried.

use crate::game::grid::Position;

/// Errors raised by grid and turn operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// Position outside the grid.
    #[error("position {position} is outside a grid of {cells} cells")]
    OutOfBounds {
        /// Offending position.
        position: Position,
        /// Number of cells in the grid.
        cells: usize,
    },

    /// Swap between two positions that are not orthogonal neighbours.
    #[error("positions {a} and {b} are not adjacent")]
    InvalidSwap {
        /// First position.
        a: Position,
        /// Second position.
        b: Position,
    },
}

/// Errors raised when validating a [`SessionConfig`](crate::session::SessionConfig).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Grid too small to ever hold a run.
    #[error("grid width {0} is below the minimum of 3")]
    WidthTooSmall(usize),

    /// Grid wider than [`MAX_WIDTH`](crate::game::grid::MAX_WIDTH).
    #[error("grid width {0} is above the maximum of 64")]
    WidthTooLarge(usize),

    /// Palette size outside the supported range.
    #[error("palette size {0} must be between 4 and 6")]
    PaletteSize(usize),

    /// Zero points per cleared token would break score positivity.
    #[error("points per token must be positive")]
    ZeroPoints,

    /// The cascade safety cap must allow at least one step.
    #[error("max cascade steps must be positive")]
    ZeroCascadeCap,

    /// A supplied starting board holds `Empty` cells or colors outside the palette.
    #[error("starting grid has {empty} empty cell(s) or colors outside a palette of {palette_size}")]
    InvalidGrid {
        /// `Empty` cells on the board.
        empty: usize,
        /// Palette size the board was checked against.
        palette_size: usize,
    },

    /// Malformed JSON configuration.
    #[error("invalid config json: {0}")]
    Json(String),
}
