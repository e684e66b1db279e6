//! Game Logic Module
//!
//! The board rules. 100% deterministic: every random draw comes from a
//! caller-supplied [`DeterministicRng`](crate::core::rng::DeterministicRng).
//!
//! ## Module Structure
//!
//! - `token`: Token colors and the palette
//! - `grid`: Square board, adjacency, collapse and refill
//! - `matcher`: Run detection and valid-move search
//! - `generate`: Stable, playable starting boards
//! - `resolver`: Swap and cascade resolution, staged
//! - `ledger`: Score, combo streak and play time
//! - `controller`: Selection and input lock state machine
//! - `error`: Engine and configuration errors

pub mod error;
pub mod token;
pub mod grid;
pub mod matcher;
pub mod generate;
pub mod resolver;
pub mod ledger;
pub mod controller;

// Re-export key types
pub use error::{EngineError, ConfigError};
pub use token::{Token, PALETTE, PALETTE_SIZE};
pub use grid::{Grid, Position};
pub use matcher::{find_matches, find_valid_moves, MatchRun, Orientation};
pub use resolver::{resolve_turn, Cascade, CascadeRules, Stage, StageKind, TurnSummary};
pub use ledger::{LedgerSnapshot, ScoreLedger};
pub use controller::{SelectOutcome, TurnController, TurnState};
