//! In-process Store Gateway.
//!
//! # Responsibilities
//! - Hold robot records in a concurrent map
//! - Bound concurrent operations with a pool-sized semaphore
//! - Load seed records from a JSON file
//!
//! Callers that exceed the pool size queue on the semaphore, which is the
//! only admission control in the service.

use std::path::Path;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::{Semaphore, SemaphorePermit};

use super::{RobotId, RobotRecord, StoreError, StoreGateway};

/// Robot store backed by a `DashMap`.
#[derive(Debug)]
pub struct MemoryStore {
    robots: DashMap<RobotId, RobotRecord>,
    pool: Semaphore,
    pool_size: usize,
}

impl MemoryStore {
    /// Create a store with `pool_size` concurrent operation slots.
    pub fn new(pool_size: usize, records: impl IntoIterator<Item = RobotRecord>) -> Self {
        let robots = DashMap::new();
        for record in records {
            robots.insert(record.id, record);
        }
        Self {
            robots,
            pool: Semaphore::new(pool_size),
            pool_size,
        }
    }

    /// Read seed records from a JSON array file.
    pub async fn load_seed(path: &Path) -> Result<Vec<RobotRecord>, StoreError> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            StoreError::Unavailable(format!("cannot read seed file {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            StoreError::Internal(format!("invalid seed file {}: {}", path.display(), e))
        })
    }

    /// Number of stored robots.
    pub fn len(&self) -> usize {
        self.robots.len()
    }

    /// Whether the store holds no robots.
    pub fn is_empty(&self) -> bool {
        self.robots.is_empty()
    }

    /// Configured pool size.
    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Remove a robot. Returns the removed record, if any.
    pub async fn remove(&self, id: RobotId) -> Result<Option<RobotRecord>, StoreError> {
        let _permit = self.acquire().await?;
        Ok(self.robots.remove(&id).map(|(_, record)| record))
    }

    /// Mark the store unreachable. Every later operation fails with
    /// `StoreError::Unavailable`; queued callers are released with the same error.
    pub fn close(&self) {
        self.pool.close();
    }

    async fn acquire(&self) -> Result<SemaphorePermit<'_>, StoreError> {
        self.pool
            .acquire()
            .await
            .map_err(|_| StoreError::Unavailable("store connection pool is closed".to_string()))
    }

    fn sorted(&self) -> Vec<RobotRecord> {
        let mut records: Vec<RobotRecord> = self.robots.iter().map(|entry| *entry.value()).collect();
        records.sort_by_key(|record| record.id);
        records
    }

    fn modify(&self, id: RobotId, apply: impl FnOnce(&mut RobotRecord)) -> u64 {
        match self.robots.get_mut(&id) {
            Some(mut record) => {
                apply(record.value_mut());
                1
            }
            None => 0,
        }
    }
}

#[async_trait]
impl StoreGateway for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        let _permit = self.acquire().await?;
        Ok(())
    }

    async fn get_all(&self) -> Result<Vec<RobotRecord>, StoreError> {
        let _permit = self.acquire().await?;
        Ok(self.sorted())
    }

    async fn get_by_id(&self, id: RobotId) -> Result<Option<RobotRecord>, StoreError> {
        let _permit = self.acquire().await?;
        Ok(self.robots.get(&id).map(|entry| *entry.value()))
    }

    async fn get_positions(&self) -> Result<Vec<RobotRecord>, StoreError> {
        let _permit = self.acquire().await?;
        Ok(self.sorted())
    }

    async fn set_position(&self, id: RobotId, x: f64, y: f64, battery: f64) -> Result<u64, StoreError> {
        let _permit = self.acquire().await?;
        Ok(self.modify(id, |record| {
            record.x = x;
            record.y = y;
            record.battery = battery;
        }))
    }

    async fn set_speed(&self, id: RobotId, speed: f64) -> Result<u64, StoreError> {
        let _permit = self.acquire().await?;
        Ok(self.modify(id, |record| record.speed = speed))
    }

    async fn set_battery(&self, id: RobotId, battery: f64) -> Result<u64, StoreError> {
        let _permit = self.acquire().await?;
        Ok(self.modify(id, |record| record.battery = battery))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Arc;
    use std::time::Duration;

    fn robot(id: u32, x: f64, y: f64) -> RobotRecord {
        RobotRecord {
            id: RobotId::new(id).unwrap(),
            x,
            y,
            speed: 0.0,
            battery: 80.0,
        }
    }

    fn id(raw: u32) -> RobotId {
        RobotId::new(raw).unwrap()
    }

    #[tokio::test]
    async fn get_all_is_sorted_by_id() {
        let store = MemoryStore::new(4, vec![robot(9, 0.0, 0.0), robot(2, 1.0, 1.0), robot(5, 2.0, 2.0)]);
        let ids: Vec<u32> = store.get_all().await.unwrap().iter().map(|r| r.id.get()).collect();
        assert_eq!(ids, vec![2, 5, 9]);
    }

    #[tokio::test]
    async fn update_speed_reads_back_written_value() {
        let store = MemoryStore::new(4, vec![robot(7, 1.0, 1.0)]);
        let updated = store.update_speed(id(7), 2.5).await.unwrap().unwrap();
        assert_eq!(updated.speed, 2.5);
        assert_eq!(updated.battery, 80.0);
    }

    #[tokio::test]
    async fn update_of_missing_robot_is_absent() {
        let store = MemoryStore::new(4, vec![robot(1, 0.0, 0.0)]);
        assert!(store.update_position(id(2), 1.0, 1.0, 50.0).await.unwrap().is_none());
        assert_eq!(store.set_battery(id(2), 10.0).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn closed_store_reports_unavailable() {
        let store = MemoryStore::new(4, vec![robot(1, 0.0, 0.0)]);
        store.close();
        assert!(matches!(store.ping().await, Err(StoreError::Unavailable(_))));
        assert!(matches!(store.get_by_id(id(1)).await, Err(StoreError::Unavailable(_))));
    }

    #[tokio::test]
    async fn callers_beyond_pool_size_queue() {
        let store = Arc::new(MemoryStore::new(1, vec![robot(1, 0.0, 0.0)]));
        let held = store.acquire().await.unwrap();

        let waiting = {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.get_all().await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiting.is_finished());

        drop(held);
        let records = waiting.await.unwrap().unwrap();
        assert_eq!(records.len(), 1);
    }

    #[tokio::test]
    async fn load_seed_reads_json_array() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"id":1,"x":0,"y":0,"speed":0,"battery":100}},{{"id":2,"x":3,"y":4,"speed":1.5,"battery":60}}]"#
        )
        .unwrap();

        let records = MemoryStore::load_seed(file.path()).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].speed, 1.5);
    }

    #[tokio::test]
    async fn load_seed_missing_file_is_unavailable() {
        let result = MemoryStore::load_seed(Path::new("/nonexistent/robots.json")).await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
    }
}
