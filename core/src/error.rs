//! Error types for the core crate
//!
//! Validation problems are reported as values by the validator and the
//! coercion engine; this module wraps them, together with I/O and storage
//! failures, for the operations that cross the persistence boundary.

use std::io;
use thiserror::Error;

use crate::coercion::CoercionError;
use crate::schema::SchemaError;

/// Core error type
#[derive(Error, Debug)]
pub enum CoreError {
    /// Form definition failed schema validation
    #[error("Schema validation failed: {}", join(.0))]
    Schema(Vec<SchemaError>),

    /// Response values failed coercion
    #[error("Response validation failed: {}", join(.0))]
    Coercion(Vec<CoercionError>),

    /// Record not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid session state transition
    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    /// Persistence collaborator failure
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Blob encoding failure
    #[error("Blob error: {0}")]
    BlobError(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for the core crate
pub type Result<T> = std::result::Result<T, CoreError>;

fn join<E: std::fmt::Display>(errors: &[E]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Convert an error to a StorageError
pub fn to_storage_error<E: std::fmt::Display>(err: E) -> CoreError {
    CoreError::StorageError(err.to_string())
}

/// Convert an error to a ConfigError
pub fn to_config_error<E: std::fmt::Display>(err: E) -> CoreError {
    CoreError::ConfigError(err.to_string())
}

/// Convert an error to a BlobError
pub fn to_blob_error<E: std::fmt::Display>(err: E) -> CoreError {
    CoreError::BlobError(err.to_string())
}
