//! Layered configuration.
//!
//! Settings are built from, in increasing priority: built-in defaults, the
//! TOML file `config.toml` in the config dir, and `QUOTER_*` environment
//! variables (`QUOTER_SYNC__FREQUENCY=60` sets `sync.frequency`).

use std::path::PathBuf;
use std::time::Duration;

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::storage::FileStorage;
use crate::store::QuoteStore;
use crate::sync::MergePolicy;

pub const DEFAULT_CONFIG: &str = include_str!("../config.toml");

pub const DEFAULT_SYNC_ENDPOINT: &str = "https://jsonplaceholder.typicode.com/posts";
pub const DEFAULT_SYNC_FREQUENCY: u64 = 30;
pub const DEFAULT_BATCH_SIZE: usize = 5;

const DURABLE_FILE: &str = "storage.json";
const SESSION_FILE: &str = "session.json";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncSettings {
    pub enabled: bool,
    pub endpoint: String,
    /// Seconds between cycles.
    pub frequency: u64,
    pub batch_size: usize,
    pub policy: MergePolicy,
    pub push: bool,
    pub backoff: bool,
    /// Request timeout in seconds.
    pub timeout: f64,
}

impl SyncSettings {
    pub fn period(&self) -> Duration {
        Duration::from_secs(self.frequency.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.timeout).unwrap_or(Duration::from_secs(10))
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: DEFAULT_SYNC_ENDPOINT.to_string(),
            frequency: DEFAULT_SYNC_FREQUENCY,
            batch_size: DEFAULT_BATCH_SIZE,
            policy: MergePolicy::default(),
            push: false,
            backoff: false,
            timeout: 10.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogSettings {
    pub enabled: bool,
    pub dir: String,
    pub file: String,
    pub level: LogLevel,
    pub retention_days: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub data_dir: String,
    pub session_dir: String,
    pub sync: SyncSettings,
    pub logs: LogSettings,
}

impl Settings {
    /// Load settings from every layer.
    pub fn new() -> Result<Self> {
        let settings = Self::builder()?.build()?.try_deserialize()?;
        Ok(settings)
    }

    /// The layered builder with defaults, file and environment in place.
    /// Callers may add overrides before building.
    pub fn builder() -> Result<ConfigBuilder<DefaultState>> {
        let data_dir = data_dir();
        let sync = SyncSettings::default();

        let builder = Config::builder()
            .set_default("data_dir", data_dir.to_string_lossy().to_string())?
            .set_default(
                "session_dir",
                std::env::temp_dir()
                    .join("quoter")
                    .to_string_lossy()
                    .to_string(),
            )?
            .set_default("sync.enabled", sync.enabled)?
            .set_default("sync.endpoint", sync.endpoint)?
            .set_default("sync.frequency", sync.frequency)?
            .set_default("sync.batch_size", sync.batch_size as u64)?
            .set_default("sync.policy", sync.policy.to_string())?
            .set_default("sync.push", sync.push)?
            .set_default("sync.backoff", sync.backoff)?
            .set_default("sync.timeout", sync.timeout)?
            .set_default("logs.enabled", true)?
            .set_default(
                "logs.dir",
                data_dir.join("logs").to_string_lossy().to_string(),
            )?
            .set_default("logs.file", "daemon.log")?
            .set_default("logs.level", LogLevel::default().as_directive())?
            .set_default("logs.retention_days", 4u64)?
            .add_source(
                File::new(
                    &config_dir().join(CONFIG_FILE).to_string_lossy(),
                    FileFormat::Toml,
                )
                .required(false),
            )
            .add_source(
                Environment::with_prefix("QUOTER")
                    .prefix_separator("_")
                    .separator("__"),
            );

        Ok(builder)
    }

    pub fn durable_storage_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(DURABLE_FILE)
    }

    pub fn session_storage_path(&self) -> PathBuf {
        PathBuf::from(&self.session_dir).join(SESSION_FILE)
    }

    /// Open the quote store over the configured file storage.
    pub fn open_store(&self) -> QuoteStore {
        QuoteStore::open(
            FileStorage::new(self.durable_storage_path()),
            FileStorage::new(self.session_storage_path()),
        )
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "quoter")
}

/// `QUOTER_CONFIG_DIR` wins over the platform config dir.
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("QUOTER_CONFIG_DIR") {
        return PathBuf::from(dir);
    }

    project_dirs()
        .map(|dirs| dirs.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".quoter"))
}

pub fn data_dir() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".quoter"))
}
