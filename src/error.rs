//! Error types for logkv
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using KvError
pub type Result<T> = std::result::Result<T, KvError>;

/// Unified error type for logkv operations
#[derive(Debug, Error)]
pub enum KvError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Lookup Errors
    // -------------------------------------------------------------------------
    #[error("not found")]
    NotFound,

    /// The record at an indexed offset carries a different key.
    /// Index and log are out of sync.
    #[error("key mismatch at offset {offset}")]
    KeyMismatch { offset: u64 },

    // -------------------------------------------------------------------------
    // Log Errors
    // -------------------------------------------------------------------------
    #[error("corrupt log at offset {offset}: {reason}")]
    CorruptLog { offset: u64, reason: String },

    // -------------------------------------------------------------------------
    // Input Validation Errors
    // -------------------------------------------------------------------------
    #[error("key too long: {len} bytes (max {})", crate::log::MAX_KEY_LEN)]
    KeyTooLong { len: usize },

    #[error("value too long: {len} bytes (max {})", crate::log::MAX_VALUE_LEN)]
    ValueTooLong { len: usize },

    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    #[error("protocol error: {0}")]
    Protocol(String),

    /// An `ERROR` line returned by the server
    #[error("server error: {0}")]
    Server(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("configuration error: {0}")]
    Config(String),
}

impl KvError {
    /// Whether the error is the normal "key absent" outcome
    pub fn is_not_found(&self) -> bool {
        matches!(self, KvError::NotFound)
    }
}
