//! Error types for the autoplan_core library.

use std::io;

use crate::remote::RemoteError;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for autoplan_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Remote service error (after any retries)
    #[error("Remote service error: {0}")]
    Remote(#[from] RemoteError),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// State management error
    #[error("State error: {0}")]
    State(String),

    /// No valid routine could be assembled
    #[error("Selection error: {0}")]
    Selection(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}
