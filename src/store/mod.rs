//! Store Gateway subsystem.
//!
//! # Data Flow
//! ```text
//! Command Dispatcher
//!     → StoreGateway (trait object, injected at construction)
//!     → memory.rs (in-process store, pool-sized admission control)
//!     → RobotRecord / StoreError back to the dispatcher
//! ```
//!
//! # Design Decisions
//! - The gateway is an injected `Arc<dyn StoreGateway>`, never a global
//! - Writes report affected rows; the provided `update_*` methods add the
//!   read-back so callers receive a consistent snapshot
//! - No retries anywhere in this layer

pub mod error;
pub mod memory;
pub mod record;

use async_trait::async_trait;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use record::{RobotId, RobotRecord};

/// CRUD access to robot records in the backing store.
///
/// Implementations own any serialization the store needs. Callers may invoke
/// these methods concurrently from many connections.
#[async_trait]
pub trait StoreGateway: Send + Sync {
    /// Check that the backing store is reachable.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Fetch every robot, ordered by id.
    async fn get_all(&self) -> Result<Vec<RobotRecord>, StoreError>;

    /// Fetch one robot.
    async fn get_by_id(&self, id: RobotId) -> Result<Option<RobotRecord>, StoreError>;

    /// Fetch position, battery and speed of every robot, ordered by id.
    async fn get_positions(&self) -> Result<Vec<RobotRecord>, StoreError>;

    /// Write position and battery. Returns the number of affected rows.
    async fn set_position(&self, id: RobotId, x: f64, y: f64, battery: f64) -> Result<u64, StoreError>;

    /// Write speed. Returns the number of affected rows.
    async fn set_speed(&self, id: RobotId, speed: f64) -> Result<u64, StoreError>;

    /// Write battery level. Returns the number of affected rows.
    async fn set_battery(&self, id: RobotId, battery: f64) -> Result<u64, StoreError>;

    /// Write position and battery, then read the record back.
    async fn update_position(
        &self,
        id: RobotId,
        x: f64,
        y: f64,
        battery: f64,
    ) -> Result<Option<RobotRecord>, StoreError> {
        if self.set_position(id, x, y, battery).await? == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    /// Write speed, then read the record back.
    async fn update_speed(&self, id: RobotId, speed: f64) -> Result<Option<RobotRecord>, StoreError> {
        if self.set_speed(id, speed).await? == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    /// Write battery level, then read the record back.
    async fn update_battery(&self, id: RobotId, battery: f64) -> Result<Option<RobotRecord>, StoreError> {
        if self.set_battery(id, battery).await? == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }
}
