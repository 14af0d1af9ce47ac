use async_trait::async_trait;
use carhop_core::{PendingBookingRecord, QueueStore, StoreError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info};
use uuid::Uuid;

/// Bookings submitted while offline, waiting to be synced.
///
/// Every operation goes through one lock, so an enqueue can never interleave with the
/// reconciler's read-then-remove of a record.
pub struct PendingQueue {
    store: Arc<dyn QueueStore>,
    key: String,
    lock: AsyncMutex<()>,
}

impl PendingQueue {
    pub fn new(store: Arc<dyn QueueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
            lock: AsyncMutex::new(()),
        }
    }

    /// Append a record to durable storage
    pub async fn enqueue(&self, record: &PendingBookingRecord) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        self.store.append(&self.key, record).await?;
        info!(record_id = %record.id, queue = %self.key, "Booking queued for later sync");
        Ok(())
    }

    /// Every queued record, oldest submission first. Nothing is removed.
    pub async fn drain_all(&self) -> Result<Vec<PendingBookingRecord>, StoreError> {
        let _guard = self.lock.lock().await;
        let mut records = self.store.list(&self.key).await?;
        // Stable: records with equal timestamps keep enqueue order
        records.sort_by_key(|r| r.submitted_at);
        Ok(records)
    }

    /// Delete one record after its remote write was confirmed
    pub async fn remove(&self, record: &PendingBookingRecord) -> Result<bool, StoreError> {
        let _guard = self.lock.lock().await;
        let removed = self.store.remove(&self.key, record.id).await?;
        debug!(record_id = %record.id, removed, "Queue removal");
        Ok(removed)
    }

    pub async fn len(&self) -> Result<usize, StoreError> {
        let _guard = self.lock.lock().await;
        Ok(self.store.list(&self.key).await?.len())
    }

    pub async fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len().await? == 0)
    }
}

/// Non-durable store for tests and throwaway runs
pub struct MemoryQueueStore {
    lists: Mutex<HashMap<String, Vec<PendingBookingRecord>>>,
    reject_writes: AtomicBool,
}

impl MemoryQueueStore {
    pub fn new() -> Self {
        Self {
            lists: Mutex::new(HashMap::new()),
            reject_writes: AtomicBool::new(false),
        }
    }

    /// Make every following append fail, as a full or read-only disk would
    pub fn reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }

    fn lists(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<PendingBookingRecord>>> {
        self.lists.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for MemoryQueueStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QueueStore for MemoryQueueStore {
    async fn append(&self, key: &str, record: &PendingBookingRecord) -> Result<(), StoreError> {
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("storage quota exceeded".to_string()));
        }
        self.lists()
            .entry(key.to_string())
            .or_default()
            .push(record.clone());
        Ok(())
    }

    async fn list(&self, key: &str) -> Result<Vec<PendingBookingRecord>, StoreError> {
        Ok(self.lists().get(key).cloned().unwrap_or_default())
    }

    async fn remove(&self, key: &str, id: Uuid) -> Result<bool, StoreError> {
        let mut lists = self.lists();
        let Some(list) = lists.get_mut(key) else {
            return Ok(false);
        };
        let before = list.len();
        list.retain(|r| r.id != id);
        Ok(list.len() != before)
    }
}
