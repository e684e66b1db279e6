//! Replay
//!
//! Rebuilds a game from its seed and move list. A session's random draws
//! happen only at generation, refill and reshuffle, all from the one seeded
//! RNG, so replaying [`GameSession::moves`] reproduces the board and ledger
//! exactly. Moves recorded before a `new_game` are not covered.

use tracing::debug;

use crate::core::hash::short_hex;
use crate::game::error::{ConfigError, EngineError};
use crate::game::grid::Position;
use crate::session::config::SessionConfig;
use crate::session::game::GameSession;

/// Replay failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReplayError {
    /// The configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A recorded swap was rejected.
    #[error("move {index} rejected: {source}")]
    Engine {
        /// Index into the move list.
        index: usize,
        /// Underlying error.
        source: EngineError,
    },
}

/// Play `moves` on a fresh session seeded with `seed`.
pub fn replay(
    config: SessionConfig,
    seed: u64,
    moves: &[(Position, Position)],
) -> Result<GameSession, ReplayError> {
    let mut session = GameSession::new(config, seed)?;
    for (index, &(a, b)) in moves.iter().enumerate() {
        session
            .attempt_swap(a, b)
            .map_err(|source| ReplayError::Engine { index, source })?;
    }
    debug!(
        "Replayed {} move(s) from seed {:#018x}: {}",
        moves.len(),
        seed,
        short_hex(&session.compute_hash())
    );
    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replay_reproduces_session() {
        let config = SessionConfig::default();
        let mut live = GameSession::new(config.clone(), 2024).unwrap();
        for _ in 0..10 {
            let Some((a, b)) = live.hint() else { break };
            live.attempt_swap(a, b).unwrap();
        }
        // Recorded whether or not it matches
        live.attempt_swap(0, 1).unwrap();

        let replayed = replay(config, live.seed(), live.moves()).unwrap();
        assert_eq!(replayed.grid(), live.grid());
        assert_eq!(replayed.ledger(), live.ledger());
        assert_eq!(replayed.compute_hash(), live.compute_hash());
        assert_eq!(replayed.rng_draws(), live.rng_draws());
    }

    #[test]
    fn test_replay_reports_bad_move() {
        let err = replay(SessionConfig::default(), 1, &[(0, 5)]).err();
        assert_eq!(
            err,
            Some(ReplayError::Engine {
                index: 0,
                source: EngineError::InvalidSwap { a: 0, b: 5 },
            })
        );

        let bad = SessionConfig { width: 1, ..SessionConfig::default() };
        assert_eq!(
            replay(bad, 1, &[]).err(),
            Some(ReplayError::Config(ConfigError::WidthTooSmall(1)))
        );
    }
}
