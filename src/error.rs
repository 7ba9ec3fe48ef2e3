//! Error types for btree_list
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using ListError
pub type Result<T> = std::result::Result<T, ListError>;

/// Unified error type for btree_list operations
///
/// Out-of-range indexes are not represented here: they are programmer errors
/// and panic, the same way slice indexing does.
#[derive(Debug, Error)]
pub enum ListError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // File Format Errors
    // -------------------------------------------------------------------------
    #[error("Corrupt list file: {0}")]
    CorruptFile(String),

    #[error("Incompatible list file: {0}")]
    Incompatible(String),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Structural Errors
    // -------------------------------------------------------------------------
    #[error("Tree structure violated: {0}")]
    Corruption(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<bincode::Error> for ListError {
    fn from(err: bincode::Error) -> Self {
        ListError::Serialization(err.to_string())
    }
}
