//! TOML-based engine configuration.
//!
//! Selects the store backend and the global day-boundary offset. Stored at
//! `~/.config/vitalog/config.toml`; a missing file yields the defaults
//! (local SQLite store, UTC day boundary). Store credentials never live in
//! the file -- they come from `VITALOG_STORE_URL` and `VITALOG_SERVICE_KEY`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::day::DayBoundary;
use crate::error::ConfigError;

/// Environment variable holding the hosted store's base URL.
pub const ENV_STORE_URL: &str = "VITALOG_STORE_URL";
/// Environment variable holding the hosted store's service key.
pub const ENV_SERVICE_KEY: &str = "VITALOG_SERVICE_KEY";

/// Which backing store the engine talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    Rest,
    Sqlite,
}

/// Store selection and addressing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_backend")]
    pub backend: StoreBackend,
    /// Base URL of the hosted store; `VITALOG_STORE_URL` takes precedence.
    #[serde(default)]
    pub url: Option<String>,
    /// Path to the local SQLite database. Defaults to the data directory.
    #[serde(default)]
    pub db_path: Option<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            url: None,
            db_path: None,
        }
    }
}

/// Engine configuration.
///
/// Serialized to/from TOML at `~/.config/vitalog/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EngineConfig {
    #[serde(default)]
    pub store: StoreConfig,
    /// Hours east of UTC for the shared day boundary. One frame for all
    /// users; see the day module.
    #[serde(default = "default_day_offset_hours")]
    pub day_offset_hours: i32,
}

// Default functions
fn default_backend() -> StoreBackend {
    StoreBackend::Sqlite
}
fn default_day_offset_hours() -> i32 {
    0
}

/// Returns `~/.config/vitalog[-dev]/` based on VITALOG_ENV.
///
/// Set VITALOG_ENV=dev to use a separate development data directory.
///
/// # Errors
/// Returns an error if the directory cannot be created.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("VITALOG_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("vitalog-dev")
    } else {
        base_dir.join("vitalog")
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::LoadFailed {
        path: dir.clone(),
        message: e.to_string(),
    })?;
    Ok(dir)
}

impl EngineConfig {
    /// Load the configuration from the default location, falling back to
    /// defaults when no file exists.
    pub fn load() -> Result<Self, ConfigError> {
        let path = data_dir()?.join("config.toml");
        Self::load_from(&path)
    }

    /// Load the configuration from an explicit path.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        toml::from_str(&raw).map_err(|e| ConfigError::ParseFailed(e.to_string()))
    }

    /// The day boundary configured for this deployment.
    pub fn day_boundary(&self) -> Result<DayBoundary, ConfigError> {
        DayBoundary::from_offset_hours(self.day_offset_hours)
    }

    /// Resolve the hosted store's URL and service key.
    ///
    /// # Errors
    /// Returns `ConfigError::MissingKey` when either is absent -- the one
    /// fatal startup condition; no user is processed without credentials.
    pub fn rest_credentials(&self) -> Result<(String, String), ConfigError> {
        let url = std::env::var(ENV_STORE_URL)
            .ok()
            .or_else(|| self.store.url.clone())
            .ok_or_else(|| ConfigError::MissingKey(ENV_STORE_URL.to_string()))?;
        let key = std::env::var(ENV_SERVICE_KEY)
            .map_err(|_| ConfigError::MissingKey(ENV_SERVICE_KEY.to_string()))?;
        Ok((url, key))
    }

    /// Resolve the local database path.
    pub fn sqlite_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.store.db_path {
            Some(path) => Ok(path.clone()),
            None => Ok(data_dir()?.join("vitalog.db")),
        }
    }
}
