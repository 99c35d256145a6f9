//! Error types for cfgstore
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using CfgError
pub type Result<T> = std::result::Result<T, CfgError>;

/// Unified error type for cfgstore operations
#[derive(Debug, Error)]
pub enum CfgError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Durable Log Errors
    // -------------------------------------------------------------------------
    /// The durable store could not be opened. Fatal at startup.
    #[error("durable store unreachable: {0}")]
    Connectivity(String),

    /// An interior log frame failed its checksum.
    #[error("log corruption detected: {0}")]
    Corruption(String),

    /// A durable append failed. The store guarantees no version was
    /// consumed, so the same write may be retried as-is.
    #[error("durable append failed: {0}")]
    Persistence(String),

    // -------------------------------------------------------------------------
    // Store Errors
    // -------------------------------------------------------------------------
    /// Latest-version cache reconstruction failed. Fatal at startup.
    #[error("store initialization failed: {0}")]
    Init(String),

    #[error("unknown key [{0}]")]
    UnknownKey(String),

    #[error("unknown version [{version}] for key [{key}]")]
    UnknownVersion { key: String, version: u64 },

    // -------------------------------------------------------------------------
    // Record Errors
    // -------------------------------------------------------------------------
    #[error("invalid config type [{0}]")]
    InvalidType(String),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Gateway Errors
    // -------------------------------------------------------------------------
    #[error("network error: {0}")]
    Network(String),
}

impl CfgError {
    /// Whether the error is a not-found class (unknown key or version).
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CfgError::UnknownKey(_) | CfgError::UnknownVersion { .. }
        )
    }
}
