use async_trait::async_trait;
use carhop_core::{PendingBookingRecord, QueueStore, StoreError};
use redis::AsyncCommands;
use tracing::{info, warn};
use uuid::Uuid;

/// Queue storage in Redis: one list per queue key, oldest entry at the head
#[derive(Clone)]
pub struct RedisQueueStore {
    client: redis::Client,
    prefix: String,
}

impl RedisQueueStore {
    pub fn new(connection_string: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(connection_string).map_err(backend)?;
        info!("Redis queue store configured");
        Ok(Self {
            client,
            prefix: "carhop:queue".to_string(),
        })
    }

    /// Namespace every list under a different prefix, e.g. per test run
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    fn list_key(&self, key: &str) -> String {
        format!("{}:{}", self.prefix, key)
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection, StoreError> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(backend)
    }
}

#[async_trait]
impl QueueStore for RedisQueueStore {
    async fn append(&self, key: &str, record: &PendingBookingRecord) -> Result<(), StoreError> {
        let payload = serde_json::to_string(record)?;
        let mut conn = self.connection().await?;
        conn.rpush::<_, _, ()>(self.list_key(key), payload)
            .await
            .map_err(backend)
    }

    async fn list(&self, key: &str) -> Result<Vec<PendingBookingRecord>, StoreError> {
        let mut conn = self.connection().await?;
        let raw: Vec<String> = conn
            .lrange(self.list_key(key), 0, -1)
            .await
            .map_err(backend)?;
        raw.iter()
            .map(|entry| serde_json::from_str(entry).map_err(StoreError::from))
            .collect()
    }

    async fn remove(&self, key: &str, id: Uuid) -> Result<bool, StoreError> {
        let list_key = self.list_key(key);
        let mut conn = self.connection().await?;
        let raw: Vec<String> = conn.lrange(&list_key, 0, -1).await.map_err(backend)?;

        // LREM matches on the exact stored payload, so find it first
        let Some(entry) = raw.into_iter().find(|entry| {
            match serde_json::from_str::<PendingBookingRecord>(entry) {
                Ok(record) => record.id == id,
                Err(e) => {
                    warn!("Skipping unreadable queue entry in {}: {}", list_key, e);
                    false
                }
            }
        }) else {
            return Ok(false);
        };

        let removed: i64 = conn.lrem(&list_key, 1, entry).await.map_err(backend)?;
        Ok(removed > 0)
    }
}

fn backend(e: redis::RedisError) -> StoreError {
    StoreError::Backend(e.to_string())
}
