use async_trait::async_trait;
use uuid::Uuid;

use crate::record::PendingBookingRecord;

/// Queue identifier used when none is configured
pub const DEFAULT_QUEUE_KEY: &str = "pendingBookings";

/// Durable ordered-list storage, one list per queue key.
///
/// Lists keep append order. Implementations only need to be durable; the pending queue serializes
/// access on top of them.
#[async_trait]
pub trait QueueStore: Send + Sync {
    async fn append(&self, key: &str, record: &PendingBookingRecord) -> Result<(), StoreError>;

    async fn list(&self, key: &str) -> Result<Vec<PendingBookingRecord>, StoreError>;

    /// Delete the record with this id. Returns `false` when it was not present.
    async fn remove(&self, key: &str, id: Uuid) -> Result<bool, StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Stored record could not be (de)serialized: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid queue key: {0}")]
    InvalidKey(String),

    #[error("Storage backend failed: {0}")]
    Backend(String),
}
