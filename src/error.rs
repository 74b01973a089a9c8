//! Error types for the finfresh freshness layer

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the freshness layer
#[derive(Error, Debug)]
pub enum Error {
    /// Key/value store command error
    #[error("store error: {0}")]
    Store(#[from] redis::RedisError),

    /// Serialization / deserialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Backing database error
    #[error("database error: {0}")]
    Database(String),

    /// Alert lookup failed
    #[error("alert not found or already resolved: {id}")]
    AlertNotFound { id: String },

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}
