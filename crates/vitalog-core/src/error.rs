//! Core error types for vitalog-core.
//!
//! Fetch and persist failures are scoped to a single user and recorded in the
//! run summary; configuration failures are fatal and abort the run before any
//! user is processed.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for vitalog-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Event-store read errors
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// State-store write errors
    #[error("Persist error: {0}")]
    Persist(#[from] PersistError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised while reading check-in events or the user snapshot.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The backing store could not be reached
    #[error("Store unreachable: {0}")]
    Unreachable(#[from] reqwest::Error),

    /// The store answered with a non-success status
    #[error("Store rejected request (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    /// The store answered but the payload did not parse
    #[error("Malformed store response: {0}")]
    Malformed(String),

    /// Local database query failed
    #[error("Database error: {0}")]
    Database(String),
}

/// Errors raised while writing a user's streak state.
#[derive(Error, Debug)]
pub enum PersistError {
    /// The backing store could not be reached
    #[error("Store unreachable: {0}")]
    Unreachable(#[from] reqwest::Error),

    /// The store refused the write
    #[error("Store rejected write (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    /// Local database write failed
    #[error("Database error: {0}")]
    Database(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Missing required configuration key
    #[error("Missing required configuration key: {0}")]
    MissingKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

// Helper implementations for converting from other error types

impl From<rusqlite::Error> for FetchError {
    fn from(err: rusqlite::Error) -> Self {
        FetchError::Database(err.to_string())
    }
}

impl From<rusqlite::Error> for PersistError {
    fn from(err: rusqlite::Error) -> Self {
        PersistError::Database(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
