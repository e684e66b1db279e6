//! Core deterministic primitives.
//!
//! Seeded randomness and state hashing. Nothing in here knows about boards.

pub mod rng;
pub mod hash;

// Re-export core types
pub use rng::{DeterministicRng, derive_session_seed};
pub use hash::{HashDomain, StateHash, StateHasher, compute_session_hash, short_hex};
