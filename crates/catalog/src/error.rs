//! Error types for the catalog crate.
//!
//! Every failure a collaborator can report ends up here. The scoring core
//! never produces these itself; it only passes them through to the caller.

use thiserror::Error;

/// Errors raised by the event catalog, category index and like history store.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Snapshot file could not be found or opened
    #[error("Failed to open file: {path}")]
    FileNotFound { path: String },

    /// I/O error occurred while reading or writing a snapshot
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// A snapshot file was not valid JSON for its record type
    #[error("Parse error in {file}: {reason}")]
    ParseError { file: String, reason: String },

    /// A data field had an invalid value
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    /// Referenced entity doesn't exist (e.g. a like for an unknown event)
    #[error("Missing reference: {entity} with id {id}")]
    MissingReference { entity: String, id: String },

    /// The store's lock was poisoned by a panicking writer
    #[error("Catalog lock poisoned")]
    LockPoisoned,
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, CatalogError>;

impl CatalogError {
    pub(crate) fn missing(entity: &str, id: impl ToString) -> Self {
        Self::MissingReference {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }
}
