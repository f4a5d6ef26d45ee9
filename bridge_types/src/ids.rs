//! Identifiers for bridges and the calls they correlate

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a bridge instance
///
/// Never sent over the channel; it only tags log output so several
/// bridges in one process can be told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BridgeId(Uuid);

impl BridgeId {
    /// Creates a new random bridge ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a bridge ID from a UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for BridgeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BridgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bridge({})", self.0)
    }
}

/// Correlation key for one outstanding call
///
/// Allocated by the calling bridge, echoed back verbatim by the callee.
/// Serialized as a bare integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallKey(u64);

impl CallKey {
    /// The first key a bridge hands out
    pub const FIRST: CallKey = CallKey(0);

    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(&self) -> u64 {
        self.0
    }

    /// Returns the key allocated after this one.
    ///
    /// Wraps at `u64::MAX`; a bridge never lives long enough to get there.
    pub const fn next(&self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl From<u64> for CallKey {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for CallKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
