//! Robot record types owned by the Store Gateway.

use serde::{Deserialize, Serialize};

/// Identity of a robot. Always a positive integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct RobotId(u32);

impl RobotId {
    /// Create a robot id, rejecting zero.
    pub fn new(raw: u32) -> Option<Self> {
        (raw > 0).then_some(Self(raw))
    }

    /// Get the raw id value.
    pub fn get(&self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for RobotId {
    type Error = String;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        Self::new(raw).ok_or_else(|| "robot id must be a positive integer".to_string())
    }
}

impl From<RobotId> for u32 {
    fn from(id: RobotId) -> Self {
        id.0
    }
}

impl std::fmt::Display for RobotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single robot row as stored in the backing store.
///
/// The core never caches records; every command re-reads through the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RobotRecord {
    pub id: RobotId,
    pub x: f64,
    pub y: f64,
    /// Non-negative.
    pub speed: f64,
    /// Expected 0..=100; not enforced here.
    pub battery: f64,
}
