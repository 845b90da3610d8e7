//! Runtime configuration.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::db::DeletePolicy;

pub const DEFAULT_DATABASE_PATH: &str = "clinic.db";
pub const DEFAULT_DIAGNOSTIC_LOG_PATH: &str = "clinic_debug.log";

pub const ENV_DATABASE_PATH: &str = "CLINIC_DB_PATH";
pub const ENV_DIAGNOSTIC_LOG_PATH: &str = "CLINIC_LOG_PATH";
pub const ENV_DELETE_POLICY: &str = "CLINIC_DELETE_POLICY";

/// Default `tracing` filter when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "clinic_core=info"
}

/// Where the clinic keeps its data and how deletes treat dependent rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClinicConfig {
    pub database_path: PathBuf,
    pub diagnostic_log_path: PathBuf,
    pub delete_policy: DeletePolicy,
}

impl Default for ClinicConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            diagnostic_log_path: PathBuf::from(DEFAULT_DIAGNOSTIC_LOG_PATH),
            delete_policy: DeletePolicy::default(),
        }
    }
}

impl ClinicConfig {
    /// Defaults overridden by `CLINIC_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings from a JSON file. Missing keys keep their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("parsing config file {}", path.display()))
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup(ENV_DATABASE_PATH).filter(|v| !v.trim().is_empty()) {
            config.database_path = PathBuf::from(path);
        }
        if let Some(path) = lookup(ENV_DIAGNOSTIC_LOG_PATH).filter(|v| !v.trim().is_empty()) {
            config.diagnostic_log_path = PathBuf::from(path);
        }
        if let Some(raw) = lookup(ENV_DELETE_POLICY) {
            match DeletePolicy::from_str(&raw) {
                Ok(policy) => config.delete_policy = policy,
                Err(e) => tracing::warn!("{e}; using {:?}", config.delete_policy),
            }
        }

        config
    }
}
