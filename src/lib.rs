//! # Mon Crush Engine
//!
//! Deterministic match-3 board engine: swap validation, run detection,
//! cascade resolution, scoring and the turn/input state machine.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    MON CRUSH ENGINE                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── rng.rs      - Deterministic Xorshift128+ PRNG           │
//! │  └── hash.rs     - State hashing for verification            │
//! │                                                              │
//! │  game/           - Board rules (deterministic)               │
//! │  ├── grid.rs     - Square board, collapse and refill         │
//! │  ├── matcher.rs  - Run detection and valid moves             │
//! │  ├── generate.rs - Stable, playable starting boards          │
//! │  ├── resolver.rs - Staged swap and cascade resolution        │
//! │  ├── ledger.rs   - Score, combo streak, play time            │
//! │  └── controller.rs - Selection and input lock                │
//! │                                                              │
//! │  session/        - Running game (owns the state above)       │
//! │  ├── game.rs     - GameSession                               │
//! │  ├── observer.rs - Turn observers                            │
//! │  ├── report.rs   - Score reports and sinks                   │
//! │  ├── store.rs    - Best score persistence                    │
//! │  └── replay.rs   - Seed + move list replay                   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! The `core/` and `game/` modules are **100% deterministic**:
//! - No floating-point arithmetic
//! - No HashMap (uses BTreeMap/BTreeSet for sorted iteration)
//! - No system time dependencies
//! - All randomness from seeded Xorshift128+
//!
//! Given the same seed and the same swaps, a session reaches the same board
//! and score on any platform.
//!
//! ## Example
//!
//! ```
//! use mon_crush::session::{GameSession, SessionConfig};
//!
//! let mut session = GameSession::new(SessionConfig::default(), 42).unwrap();
//! if let Some((a, b)) = session.hint() {
//!     let summary = session.attempt_swap(a, b).unwrap().unwrap();
//!     assert!(summary.had_any_match);
//!     assert!(session.total_score() > 0);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod session;

// Re-export commonly used types
pub use core::rng::DeterministicRng;
pub use game::{EngineError, Grid, Position, Token, TurnSummary};
pub use session::{GameSession, SessionConfig};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
