use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};

/// Where the history is kept
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryBackend {
    Memory,
    File(PathBuf),
    MongoDb { uri: String, db_name: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_address: String,
    pub port: u16,
    pub history: HistoryBackend,
    pub cors_origins: Vec<String>,
    /// How long a scanned link stays on screen before the redirect
    pub redirect_delay: Duration,
    /// Start the camera as soon as permission is confirmed
    pub camera_autostart: bool,
}

const DEFAULT_ORIGINS: [&str; 2] = ["http://localhost:5173", "http://localhost:4173"];

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

impl Config {
    /// Read the configuration from the environment (after `.env` is loaded)
    pub fn from_env() -> Result<Self> {
        let port = var_or("PORT", "8080")
            .parse::<u16>()
            .context("PORT must be a port number")?;

        let history = match var_or("HISTORY_BACKEND", "file").as_str() {
            "memory" => HistoryBackend::Memory,
            "file" => HistoryBackend::File(var_or("HISTORY_PATH", "data/local_storage.json").into()),
            "mongodb" => HistoryBackend::MongoDb {
                uri: env::var("MONGODB_URI").context("MONGODB_URI not set")?,
                db_name: var_or("DB_NAME", "qrstudio"),
            },
            other => bail!("Unknown HISTORY_BACKEND {:?} (expected memory, file or mongodb)", other),
        };

        let cors_origins = match env::var("CORS_ORIGINS") {
            Ok(origins) => origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(String::from)
                .collect(),
            Err(_) => DEFAULT_ORIGINS.iter().map(|o| o.to_string()).collect(),
        };

        let redirect_delay = var_or("REDIRECT_DELAY_MS", "3000")
            .parse::<u64>()
            .map(Duration::from_millis)
            .context("REDIRECT_DELAY_MS must be a number of milliseconds")?;

        let camera_autostart = match var_or("CAMERA_AUTOSTART", "false").to_lowercase().as_str() {
            "1" | "true" | "yes" => true,
            "0" | "false" | "no" => false,
            other => bail!("CAMERA_AUTOSTART must be true or false, got {:?}", other),
        };

        Ok(Self {
            bind_address: var_or("BIND_ADDRESS", "127.0.0.1"),
            port,
            history,
            cors_origins,
            redirect_delay,
            camera_autostart,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: 8080,
            history: HistoryBackend::Memory,
            cors_origins: DEFAULT_ORIGINS.iter().map(|o| o.to_string()).collect(),
            redirect_delay: Duration::from_millis(3000),
            camera_autostart: false,
        }
    }
}
