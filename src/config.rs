//! Application configuration, loaded from a TOML file.

use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use triage_session::TriageConfig;

fn default_quarantine_dir() -> String {
    "/.photo-triage-quarantine".to_string()
}

fn default_database_path() -> String {
    "photo-triage.db".to_string()
}

fn default_queue_cap() -> usize {
    5000
}

fn default_snapshot_ttl_hours() -> i64 {
    24
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server_url: String,
    pub username: String,
    pub app_password: String,
    /// Remote directory quarantined photos are moved into
    #[serde(default = "default_quarantine_dir")]
    pub quarantine_dir: String,
    /// Local SQLite database holding progress and session snapshots
    #[serde(default = "default_database_path")]
    pub database_path: String,
    #[serde(default = "default_queue_cap")]
    pub queue_cap: usize,
    #[serde(default = "default_snapshot_ttl_hours")]
    pub snapshot_ttl_hours: i64,
}

impl AppConfig {
    /// Loads and validates the configuration file
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: AppConfig = toml::from_str(&raw)
            .map_err(|e| AppError::Config(format!("invalid {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.server_url.trim().is_empty() {
            return Err(AppError::Config("server_url must not be empty".to_string()));
        }
        if self.username.trim().is_empty() {
            return Err(AppError::Config("username must not be empty".to_string()));
        }
        if self.queue_cap == 0 {
            return Err(AppError::Config("queue_cap must be at least 1".to_string()));
        }
        if self.snapshot_ttl_hours <= 0 {
            return Err(AppError::Config(
                "snapshot_ttl_hours must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn triage_config(&self) -> TriageConfig {
        TriageConfig {
            queue_cap: self.queue_cap,
            snapshot_ttl_ms: self.snapshot_ttl_hours * 60 * 60 * 1000,
        }
    }
}
