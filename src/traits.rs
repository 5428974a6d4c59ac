//! Core traits for the roster engine

use serde::{de::DeserializeOwned, Serialize};
use crate::error::StateError;

/// Snapshot types the engine can fingerprint and check for structural integrity.
///
/// Structural integrity is narrower than league legality: a snapshot with a
/// team over the cap is still a valid snapshot.
pub trait State: Clone + Serialize + DeserializeOwned {
    /// Validate the snapshot for consistency
    fn validate(&self) -> Result<(), StateError>;
}
