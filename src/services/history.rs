use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::models::qr_record::QrRecord;

/// Storage key the browser application used for its history
pub const HISTORY_KEY: &str = "qrCodeHistory";

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("Cannot save a QR code without content")]
    EmptyRecord,
    #[error("History storage error: {0}")]
    Io(#[from] std::io::Error),
    #[error("History is corrupted: {0}")]
    Corrupted(#[from] serde_json::Error),
    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),
    #[error("Could not convert record: {0}")]
    Bson(#[from] mongodb::bson::ser::Error),
}

/// Ordered log of generated codes, newest first
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Put a record at the front of the list
    async fn append(&self, record: &QrRecord) -> Result<(), HistoryError>;

    /// The whole list, or an empty one if nothing was saved yet
    async fn load_all(&self) -> Result<Vec<QrRecord>, HistoryError>;

    /// Drop every record. Clearing an empty history does nothing.
    async fn clear(&self) -> Result<(), HistoryError>;

    /// Whether the backing is reachable
    async fn ping(&self) -> Result<(), HistoryError> {
        self.load_all().await.map(|_| ())
    }
}

pub(crate) fn ensure_persistable(record: &QrRecord) -> Result<(), HistoryError> {
    if record.text.is_empty() {
        return Err(HistoryError::EmptyRecord);
    }
    Ok(())
}

#[derive(Default)]
pub struct MemoryHistory {
    records: Mutex<Vec<QrRecord>>,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HistoryStore for MemoryHistory {
    async fn append(&self, record: &QrRecord) -> Result<(), HistoryError> {
        ensure_persistable(record)?;
        self.records.lock().await.insert(0, record.clone());
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<QrRecord>, HistoryError> {
        Ok(self.records.lock().await.clone())
    }

    async fn clear(&self) -> Result<(), HistoryError> {
        self.records.lock().await.clear();
        Ok(())
    }
}

/// Key/value JSON file standing in for the browser's local storage.
///
/// Values are stored as JSON strings, as local storage does, and the
/// history lives under [`HISTORY_KEY`]. Other keys in the file are kept.
pub struct LocalStorageHistory {
    path: PathBuf,
    // Serializes read-modify-write cycles on the file
    lock: Mutex<()>,
}

impl LocalStorageHistory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    async fn read_storage(&self) -> Result<BTreeMap<String, String>, HistoryError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(BTreeMap::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_storage(&self, storage: &BTreeMap<String, String>) -> Result<(), HistoryError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        // Write then rename so a crash never leaves half a file behind
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(storage)?).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    fn parse_history(storage: &BTreeMap<String, String>) -> Result<Vec<QrRecord>, HistoryError> {
        match storage.get(HISTORY_KEY) {
            Some(raw) => Ok(serde_json::from_str(raw)?),
            None => Ok(Vec::new()),
        }
    }
}

#[async_trait]
impl HistoryStore for LocalStorageHistory {
    async fn append(&self, record: &QrRecord) -> Result<(), HistoryError> {
        ensure_persistable(record)?;
        let _guard = self.lock.lock().await;

        let mut storage = self.read_storage().await?;
        let mut history = Self::parse_history(&storage)?;
        history.insert(0, record.clone());
        storage.insert(HISTORY_KEY.to_string(), serde_json::to_string(&history)?);
        self.write_storage(&storage).await
    }

    async fn load_all(&self) -> Result<Vec<QrRecord>, HistoryError> {
        let _guard = self.lock.lock().await;
        let storage = self.read_storage().await?;
        Self::parse_history(&storage)
    }

    async fn clear(&self) -> Result<(), HistoryError> {
        let _guard = self.lock.lock().await;
        let mut storage = self.read_storage().await?;
        if storage.remove(HISTORY_KEY).is_some() {
            self.write_storage(&storage).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(text: &str, created_at: i64) -> QrRecord {
        QrRecord {
            text: text.into(),
            foreground_color: "#4F46E5".into(),
            background_color: "#FFFFFF".into(),
            created_at,
            kind: None,
            details: None,
            logo: None,
        }
    }

    async fn newest_first(store: &dyn HistoryStore) {
        store.append(&record("one", 1)).await.unwrap();
        store.append(&record("two", 2)).await.unwrap();
        store.append(&record("three", 3)).await.unwrap();

        let texts: Vec<String> = store
            .load_all()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.text)
            .collect();
        assert_eq!(texts, vec!["three", "two", "one"]);
    }

    #[tokio::test]
    async fn memory_history_prepends() {
        newest_first(&MemoryHistory::new()).await;
    }

    #[tokio::test]
    async fn memory_history_rejects_empty_text() {
        let store = MemoryHistory::new();
        assert!(matches!(
            store.append(&record("", 1)).await,
            Err(HistoryError::EmptyRecord)
        ));
        assert!(store.load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn clearing_an_empty_history_is_a_no_op() {
        let store = MemoryHistory::new();
        store.clear().await.unwrap();
        assert!(store.load_all().await.unwrap().is_empty());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        let store = LocalStorageHistory::new(&path);
        store.clear().await.unwrap();
        assert!(store.load_all().await.unwrap().is_empty());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn local_storage_prepends_and_survives_reopening() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("storage.json");
        newest_first(&LocalStorageHistory::new(&path)).await;

        let reopened = LocalStorageHistory::new(&path);
        assert_eq!(reopened.load_all().await.unwrap().len(), 3);

        reopened.clear().await.unwrap();
        assert!(reopened.load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn local_storage_reads_browser_format_and_keeps_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        let history = r##"[{"text":"hi","fgColor":"#000000","bgColor":"#FFFFFF","timestamp":5}]"##;
        let storage = serde_json::json!({ HISTORY_KEY: history, "theme": "dark" });
        std::fs::write(&path, serde_json::to_vec(&storage).unwrap()).unwrap();

        let store = LocalStorageHistory::new(&path);
        let records = store.load_all().await.unwrap();
        assert_eq!(records[0].created_at, 5);

        store.clear().await.unwrap();
        let remaining: BTreeMap<String, String> =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(remaining.get("theme").map(String::as_str), Some("dark"));
        assert!(!remaining.contains_key(HISTORY_KEY));
    }
}
