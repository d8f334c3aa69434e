//! Error types for oracle_assets
//!
//! These never reach callers of `AssetCache::resolve`; the cache turns them
//! into tier outcomes. They surface only from the lower-level building blocks.

use thiserror::Error;

/// Unified error type for store and remote operations
#[derive(Debug, Error)]
pub enum AssetError {
    /// HTTP request failed (network error, timeout, etc.)
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    /// Remote generator answered with a non-success status
    #[error("HTTP error: {0}")]
    HttpStatus(reqwest::StatusCode),
    /// Durable store operation failed
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// No durable store in this environment
    #[error("Durable store unavailable: {0}")]
    StoreUnavailable(String),
}

/// Result alias for oracle_assets operations
pub type Result<T> = std::result::Result<T, AssetError>;
