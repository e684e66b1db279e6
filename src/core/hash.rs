//! State Hashing for Verification
//!
//! SHA-256 over board and ledger state. A live session and a replay of its
//! seed and moves must hash identically.

use sha2::{Sha256, Digest};

/// Hash output type (256 bits / 32 bytes)
pub type StateHash = [u8; 32];

/// What a hash covers. Each domain gets its own prefix so a grid hash can
/// never collide with a session hash over the same bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HashDomain {
    /// A single board
    Grid,
    /// Seed, board and ledger
    Session,
}

impl HashDomain {
    fn tag(self) -> &'static [u8] {
        match self {
            HashDomain::Grid => b"MON_CRUSH_GRID_V1",
            HashDomain::Session => b"MON_CRUSH_SESSION_V1",
        }
    }
}

/// Incremental state hasher.
///
/// Update order is part of the hash.
pub struct StateHasher {
    hasher: Sha256,
}

impl StateHasher {
    /// Hasher for `domain`.
    pub fn new(domain: HashDomain) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(domain.tag());
        Self { hasher }
    }

    /// Update with a u32 value (little-endian).
    #[inline]
    pub fn update_u32(&mut self, value: u32) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with a u64 value (little-endian).
    #[inline]
    pub fn update_u64(&mut self, value: u64) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with a run of cell codes, prefixed by its length.
    pub fn update_cells<I>(&mut self, cells: I)
    where
        I: ExactSizeIterator<Item = u8>,
    {
        self.update_u32(cells.len() as u32);
        let bytes: Vec<u8> = cells.collect();
        self.hasher.update(&bytes);
    }

    /// Finalize and return the hash.
    pub fn finalize(self) -> StateHash {
        self.hasher.finalize().into()
    }
}

/// Hash a session: its seed, then whatever `add_state` feeds.
pub fn compute_session_hash<F>(rng_seed: u64, add_state: F) -> StateHash
where
    F: FnOnce(&mut StateHasher),
{
    let mut hasher = StateHasher::new(HashDomain::Session);
    hasher.update_u64(rng_seed);
    add_state(&mut hasher);
    hasher.finalize()
}

/// First eight bytes of a hash as hex, for log lines.
pub fn short_hex(hash: &StateHash) -> String {
    hex::encode(&hash[..8])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hasher_determinism() {
        let mut h1 = StateHasher::new(HashDomain::Grid);
        h1.update_u32(8);
        h1.update_cells([0u8, 1, 2].into_iter());

        let mut h2 = StateHasher::new(HashDomain::Grid);
        h2.update_u32(8);
        h2.update_cells([0u8, 1, 2].into_iter());

        assert_eq!(h1.finalize(), h2.finalize());
    }

    #[test]
    fn test_domain_separation() {
        let mut grid = StateHasher::new(HashDomain::Grid);
        grid.update_u32(1);
        let mut session = StateHasher::new(HashDomain::Session);
        session.update_u32(1);

        assert_ne!(grid.finalize(), session.finalize());
    }

    #[test]
    fn test_cell_length_prefix() {
        // [1] then [2, 3] must differ from [1, 2] then [3]
        let mut a = StateHasher::new(HashDomain::Grid);
        a.update_cells([1u8].into_iter());
        a.update_cells([2u8, 3].into_iter());
        let mut b = StateHasher::new(HashDomain::Grid);
        b.update_cells([1u8, 2].into_iter());
        b.update_cells([3u8].into_iter());

        assert_ne!(a.finalize(), b.finalize());
    }

    #[test]
    fn test_session_hash_depends_on_seed() {
        let a = compute_session_hash(1, |h| h.update_u32(7));
        let b = compute_session_hash(2, |h| h.update_u32(7));
        assert_ne!(a, b);
        assert_eq!(short_hex(&a).len(), 16);
    }
}
