use serde::{Deserialize, Serialize};

use crate::errors::{ServiceError, ServiceResult};
use crate::validation::validate_identifier;

pub const ENV_DATABASE_URL: &str = "IMPORT_CORE_DATABASE_URL";
pub const ENV_STORAGE_PATH: &str = "IMPORT_CORE_STORAGE_PATH";
pub const ENV_BASE_PATH: &str = "IMPORT_CORE_BASE_PATH";
pub const ENV_LOG_LEVEL: &str = "RUST_LOG";
pub const ENV_ENTITY_TYPES: &str = "IMPORT_CORE_ENTITY_TYPES";

const DEFAULT_ENTITY_TYPES: &[&str] = &[
    "Account", "Call", "Case", "Contact", "Document", "Lead", "Meeting", "Opportunity", "Task", "User",
];

/// Runtime settings of the library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// SQLite URL, e.g. `sqlite://import_core.db?mode=rwc`
    pub database_url: String,
    /// Root directory for attachment files
    pub storage_path: String,
    /// Site URL that download links are built on
    pub base_path: String,
    /// env_logger filter string
    pub log_level: String,
    /// Entity types records may be selected from
    pub entity_types: Vec<String>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://import_core.db?mode=rwc".to_string(),
            storage_path: "./storage".to_string(),
            base_path: "http://localhost/".to_string(),
            log_level: if cfg!(debug_assertions) { "debug" } else { "info" }.to_string(),
            entity_types: DEFAULT_ENTITY_TYPES.iter().map(|t| t.to_string()).collect(),
        }
    }
}

impl CoreConfig {
    /// Reads settings from the environment, after loading a `.env` file if present.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let value = |key: &str, default: String| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(default)
        };

        Self {
            database_url: value(ENV_DATABASE_URL, defaults.database_url),
            storage_path: value(ENV_STORAGE_PATH, defaults.storage_path),
            base_path: value(ENV_BASE_PATH, defaults.base_path),
            log_level: value(ENV_LOG_LEVEL, defaults.log_level),
            entity_types: lookup(ENV_ENTITY_TYPES)
                .map(|v| parse_entity_types(&v))
                .filter(|types| !types.is_empty())
                .unwrap_or(defaults.entity_types),
        }
    }

    pub fn validate(&self) -> ServiceResult<()> {
        if !self.database_url.starts_with("sqlite:") {
            return Err(ServiceError::Configuration(format!(
                "database_url must be a SQLite URL, got '{}'",
                self.database_url
            )));
        }
        if self.storage_path.trim().is_empty() {
            return Err(ServiceError::Configuration("storage_path is empty".to_string()));
        }
        if self.base_path.trim().is_empty() {
            return Err(ServiceError::Configuration("base_path is empty".to_string()));
        }
        if let Some(invalid) = self.entity_types.iter().find(|t| validate_identifier("entityTypes", t).is_err()) {
            return Err(ServiceError::Configuration(format!("invalid entity type '{}'", invalid)));
        }
        Ok(())
    }
}

/// Comma-separated list, blanks dropped.
fn parse_entity_types(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}
