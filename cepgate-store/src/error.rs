//! Error types for the storage tiers
//!
//! Every fallible tier operation returns [`StoreError`]. The lookup pipeline
//! treats all of them as "tier unavailable" and degrades to the next tier, so
//! the variants exist for logging and diagnostics rather than for callers.

use thiserror::Error;

/// Main error type for cache and durable store operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Connection error - network or connection pool issues
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Query execution error
    #[error("Query error: {0}")]
    QueryError(String),

    /// Operation timeout
    #[error("Operation timed out after {timeout_ms}ms: {context}")]
    TimeoutError { timeout_ms: u64, context: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Serialization/Deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// The raw postal code cannot be used as a lookup key
    #[error("Invalid key {key:?}: {reason}")]
    InvalidKey { key: String, reason: String },

    /// Redis client error (wrapper)
    #[error("Redis error: {0}")]
    RedisError(#[from] redis::RedisError),

    /// Generic error with context
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias for storage operations
pub type Result<T> = std::result::Result<T, StoreError>;

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::SerializationError(e.to_string())
    }
}
