use std::sync::Arc;

use anyhow::Result;
use tokio::sync::RwLock;

use crate::config::{Config, HistoryBackend};
use crate::db::history_repo::MongoHistory;
use crate::db::mongodb::get_database;
use crate::services::history::{HistoryStore, LocalStorageHistory, MemoryHistory};
use crate::services::scanner::{Capabilities, ScannerAdapter};
use crate::services::surface::RenderSurface;

pub struct AppState {
    pub history: Arc<dyn HistoryStore>,
    pub surface: RwLock<RenderSurface>,
    pub scanner: ScannerAdapter,
    pub camera_autostart: bool,
}

impl AppState {
    pub fn new(history: Arc<dyn HistoryStore>, config: &Config) -> Self {
        Self {
            history,
            surface: RwLock::new(RenderSurface::new()),
            scanner: ScannerAdapter::new(Capabilities::default(), config.redirect_delay),
            camera_autostart: config.camera_autostart,
        }
    }

    /// Build the state with the history backing named in the configuration
    pub async fn from_config(config: &Config) -> Result<Self> {
        let history: Arc<dyn HistoryStore> = match &config.history {
            HistoryBackend::Memory => Arc::new(MemoryHistory::new()),
            HistoryBackend::File(path) => {
                log::info!("Keeping history in {}", path.display());
                Arc::new(LocalStorageHistory::new(path))
            }
            HistoryBackend::MongoDb { uri, db_name } => {
                let db = get_database(uri, db_name).await?;
                Arc::new(MongoHistory::new(&db))
            }
        };
        Ok(Self::new(history, config))
    }
}
