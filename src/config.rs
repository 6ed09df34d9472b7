//! Application paths and settings.

use anyhow::{Result, anyhow};
use log::LevelFilter;
use std::path::PathBuf;

/// Overrides the data directory.
pub const HOME_ENV: &str = "KEYSHARE_HOME";
/// Overrides the log level (off, error, warn, info, debug, trace).
pub const LOG_ENV: &str = "KEYSHARE_LOG";

const DATA_DIR_NAME: &str = ".keyshare";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub vault_path: PathBuf,
    pub history_path: PathBuf,
    pub log_path: PathBuf,
    pub log_level: LevelFilter,
}

impl AppConfig {
    /// Lays out every path under `data_dir`.
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            vault_path: data_dir.join("vault.json"),
            history_path: data_dir.join("history"),
            log_path: data_dir.join("keyshare.log"),
            data_dir,
            log_level: LevelFilter::Info,
        }
    }

    /// Builds the configuration from the home directory and environment.
    pub fn load() -> Result<Self> {
        let data_dir = match std::env::var_os(HOME_ENV) {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => dirs_next::home_dir()
                .ok_or_else(|| anyhow!("Could not determine home directory"))?
                .join(DATA_DIR_NAME),
        };

        let mut config = Self::new(data_dir);
        if let Ok(level) = std::env::var(LOG_ENV) {
            config.log_level = parse_level(&level)?;
        }
        Ok(config)
    }

    pub fn with_log_level(mut self, level: LevelFilter) -> Self {
        self.log_level = level;
        self
    }

    /// Creates the data directory if needed.
    pub fn ensure_dirs(&self) -> Result<()> {
        if !self.data_dir.exists() {
            std::fs::create_dir_all(&self.data_dir).map_err(|e| {
                anyhow!("Failed to create {}: {}", self.data_dir.display(), e)
            })?;
        }
        Ok(())
    }
}

fn parse_level(value: &str) -> Result<LevelFilter> {
    value
        .trim()
        .parse::<LevelFilter>()
        .map_err(|_| anyhow!("Invalid {} value '{}'", LOG_ENV, value))
}
