use async_trait::async_trait;
use carhop_core::{PendingBookingRecord, QueueStore, StoreError};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

/// Queue storage on the local disk: one JSON array file per queue key.
///
/// Every write replaces the whole file through a temp file and a rename, so a crash mid-write
/// leaves either the old or the new list on disk.
pub struct FileQueueStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl FileQueueStore {
    /// Open (and create if needed) the queue directory
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;
        info!("File queue store opened at {}", dir.display());
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }

    async fn read(&self, path: &Path) -> Result<Vec<PendingBookingRecord>, StoreError> {
        match fs::read(path).await {
            Ok(bytes) if bytes.is_empty() => Ok(Vec::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, path: &Path, records: &[PendingBookingRecord]) -> Result<(), StoreError> {
        let payload = serde_json::to_vec_pretty(records)?;
        let tmp = path.with_extension("json.tmp");

        let mut file = fs::File::create(&tmp).await?;
        file.write_all(&payload).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&tmp, path).await?;
        debug!(path = %path.display(), records = records.len(), "Queue file rewritten");
        Ok(())
    }
}

#[async_trait]
impl QueueStore for FileQueueStore {
    async fn append(&self, key: &str, record: &PendingBookingRecord) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        let _guard = self.write_lock.lock().await;
        let mut records = self.read(&path).await?;
        records.push(record.clone());
        self.write(&path, &records).await
    }

    async fn list(&self, key: &str) -> Result<Vec<PendingBookingRecord>, StoreError> {
        let path = self.path_for(key)?;
        self.read(&path).await
    }

    async fn remove(&self, key: &str, id: Uuid) -> Result<bool, StoreError> {
        let path = self.path_for(key)?;
        let _guard = self.write_lock.lock().await;
        let mut records = self.read(&path).await?;
        let before = records.len();
        records.retain(|r| r.id != id);
        if records.len() == before {
            return Ok(false);
        }
        self.write(&path, &records).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carhop_core::HourSlot;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn record(minute: u32) -> PendingBookingRecord {
        PendingBookingRecord {
            id: Uuid::new_v4(),
            vehicle_id: Uuid::new_v4(),
            pickup_location: "Central Station".to_string(),
            dropoff_location: "Airport".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 10, 20).unwrap(),
            time: HourSlot::new(9).unwrap(),
            duration_hours: 3,
            derived_price: 60,
            submitted_at: Utc.with_ymd_and_hms(2026, 10, 18, 8, minute, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_records_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let first = record(1);
        let second = record(2);
        {
            let store = FileQueueStore::open(dir.path()).await.unwrap();
            store.append("pendingBookings", &first).await.unwrap();
            store.append("pendingBookings", &second).await.unwrap();
        }

        let reopened = FileQueueStore::open(dir.path()).await.unwrap();
        assert_eq!(
            reopened.list("pendingBookings").await.unwrap(),
            vec![first, second]
        );
        assert!(!dir.path().join("pendingBookings.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_remove_rewrites_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileQueueStore::open(dir.path()).await.unwrap();
        let kept = record(1);
        let synced = record(2);
        store.append("pendingBookings", &kept).await.unwrap();
        store.append("pendingBookings", &synced).await.unwrap();

        assert!(store.remove("pendingBookings", synced.id).await.unwrap());
        assert!(!store.remove("pendingBookings", synced.id).await.unwrap());

        let reopened = FileQueueStore::open(dir.path()).await.unwrap();
        assert_eq!(reopened.list("pendingBookings").await.unwrap(), vec![kept]);
    }

    #[tokio::test]
    async fn test_missing_file_is_empty_queue() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileQueueStore::open(dir.path().join("nested/queue")).await.unwrap();
        assert!(store.list("pendingBookings").await.unwrap().is_empty());
        assert!(!store.remove("pendingBookings", Uuid::new_v4()).await.unwrap());
    }

    #[tokio::test]
    async fn test_key_cannot_escape_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileQueueStore::open(dir.path()).await.unwrap();
        for key in ["", "../outside", "a/b", "queue.json"] {
            assert!(matches!(
                store.list(key).await,
                Err(StoreError::InvalidKey(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("pendingBookings.json"), b"{not json").unwrap();
        let store = FileQueueStore::open(dir.path()).await.unwrap();

        let err = store.list("pendingBookings").await.unwrap_err();
        assert!(matches!(err, StoreError::Serialization(_)));
        // Appending must not silently replace what could not be read
        assert!(store.append("pendingBookings", &record(3)).await.is_err());
    }

    #[tokio::test]
    async fn test_file_uses_camel_case_fields() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileQueueStore::open(dir.path()).await.unwrap();
        store.append("pendingBookings", &record(4)).await.unwrap();

        let raw = std::fs::read_to_string(dir.path().join("pendingBookings.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let entry = &value[0];
        assert!(entry["vehicleId"].as_str().is_some());
        assert_eq!(entry["date"], "2026-10-20");
        assert_eq!(entry["time"], "09:00");
        assert_eq!(entry["durationHours"], 3);
        assert_eq!(entry["derivedPrice"], 60);
    }
}
