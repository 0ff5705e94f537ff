use async_trait::async_trait;
use mongodb::bson::{doc, to_bson};
use mongodb::{Collection, Database};
use serde::{Deserialize, Serialize};

use crate::models::qr_record::QrRecord;
use crate::services::history::{HISTORY_KEY, HistoryError, HistoryStore, ensure_persistable};

const COLLECTION: &str = "local_storage";

/// One storage key and the records saved under it
#[derive(Serialize, Deserialize, Debug)]
struct StorageEntry {
    key: String,
    #[serde(default)]
    records: Vec<QrRecord>,
}

/// History kept in MongoDB as a single document per storage key
pub struct MongoHistory {
    db: Database,
    entries: Collection<StorageEntry>,
}

impl MongoHistory {
    pub fn new(db: &Database) -> Self {
        Self {
            db: db.clone(),
            entries: db.collection::<StorageEntry>(COLLECTION),
        }
    }
}

#[async_trait]
impl HistoryStore for MongoHistory {
    async fn append(&self, record: &QrRecord) -> Result<(), HistoryError> {
        ensure_persistable(record)?;
        let record = to_bson(record)?;

        self.entries
            .update_one(
                doc! { "key": HISTORY_KEY },
                doc! {
                    "$push": {
                        "records": { "$each": [record], "$position": 0 }
                    }
                },
            )
            .upsert(true)
            .await?;
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<QrRecord>, HistoryError> {
        let entry = self.entries.find_one(doc! { "key": HISTORY_KEY }).await?;
        Ok(entry.map(|e| e.records).unwrap_or_default())
    }

    async fn clear(&self) -> Result<(), HistoryError> {
        self.entries.delete_one(doc! { "key": HISTORY_KEY }).await?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), HistoryError> {
        self.db.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }
}
