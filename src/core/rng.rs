//! Deterministic Random Number Generator
//!
//! Every random decision the engine makes (starting board, refill after a
//! cascade, reshuffle) draws from one [`DeterministicRng`] owned by the
//! session. Same seed plus same swaps gives the same game.

use serde::{Serialize, Deserialize};
use sha2::{Sha256, Digest};

/// Xorshift128+ generator seeded through SplitMix64.
///
/// # Example
///
/// ```
/// use mon_crush::core::rng::DeterministicRng;
///
/// let mut a = DeterministicRng::new(12345);
/// let mut b = DeterministicRng::new(12345);
/// assert_eq!(a.below(6), b.below(6));
/// assert_eq!(a.draws(), 1);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeterministicRng {
    seed: u64,
    state: [u64; 2],
    draws: u64,
}

impl DeterministicRng {
    /// Generator for `seed`.
    pub fn new(seed: u64) -> Self {
        let mut s = seed;
        let state0 = splitmix64(&mut s);
        let state1 = splitmix64(&mut s);

        // Xorshift must never sit in the all-zero state
        let state = if state0 == 0 && state1 == 0 {
            [1, 1]
        } else {
            [state0, state1]
        };

        Self { seed, state, draws: 0 }
    }

    /// Seed this generator started from.
    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Values drawn so far. Two replays of one game agree on this.
    #[inline]
    pub fn draws(&self) -> u64 {
        self.draws
    }

    /// Next raw 64-bit value.
    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        let s0 = self.state[0];
        let mut s1 = self.state[1];
        let result = s0.wrapping_add(s1);

        s1 ^= s0;
        self.state[0] = s0.rotate_left(24) ^ s1 ^ (s1 << 16);
        self.state[1] = s1.rotate_left(37);
        self.draws += 1;

        result
    }

    /// Index in `0..n`; `0` when `n` is zero.
    ///
    /// Plain modulo. The bias is negligible for palette-sized ranges.
    #[inline]
    pub fn below(&mut self, n: usize) -> usize {
        if n == 0 {
            return 0;
        }
        (self.next_u64() % n as u64) as usize
    }

    /// Uniform pick from `items`.
    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            None
        } else {
            let idx = self.below(items.len());
            items.get(idx)
        }
    }
}

#[inline]
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

/// Seed for a new session, from its id and an opaque player key.
///
/// The player key is whatever the embedding layer keys best scores by (a
/// wallet address, a username); the engine never interprets it.
pub fn derive_session_seed(session_id: &[u8; 16], player_key: &str) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(b"MON_CRUSH_SEED_V1");
    hasher.update(session_id);
    hasher.update((player_key.len() as u32).to_le_bytes());
    hasher.update(player_key.as_bytes());
    let digest = hasher.finalize();

    let mut seed = [0u8; 8];
    seed.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(seed)
}

// =============================================================================
// TESTS
// =============================================================================
