//! Snapshot fingerprinting using Blake3

use crate::traits::State;
use crate::types::StateHash;
use blake3::Hasher as Blake3Hasher;

/// StateHasher fingerprints league snapshots
///
/// Two snapshots hash equal exactly when their serialized form is equal, so
/// a caller can tell whether a stored snapshot moved on since it was read.
#[derive(Debug, Clone, Default)]
pub struct StateHasher {}

impl StateHasher {
    /// Create a new StateHasher
    pub fn new() -> Self {
        Self {}
    }

    /// Compute the hash of a snapshot
    ///
    /// # Panics
    /// Panics if snapshot serialization fails, which cannot happen for the
    /// plain data types in this crate
    pub fn hash<S: State>(&self, state: &S) -> StateHash {
        let serialized = bincode::serialize(state)
            .expect("State serialization should never fail");

        let mut hasher = Blake3Hasher::new();
        hasher.update(&serialized);
        StateHash(*hasher.finalize().as_bytes())
    }

    /// Fold a sequence of hashes into one, order-sensitive
    pub fn hash_chain(&self, hashes: &[StateHash]) -> StateHash {
        let mut hasher = Blake3Hasher::new();
        for hash in hashes {
            hasher.update(&hash.0);
        }
        StateHash(*hasher.finalize().as_bytes())
    }
}
