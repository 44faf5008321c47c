//! Error types for the catalog

use bookshelf_core::{RecordError, RecordId};
use std::path::PathBuf;
use thiserror::Error;

/// Result type for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Errors that can occur during catalog operations
#[derive(Debug, Error)]
pub enum CatalogError {
    // ===== Business outcomes =====
    /// A record with this id is already in the catalog
    #[error("A book with ID {0} already exists")]
    DuplicateId(RecordId),

    /// No record with this id exists
    #[error("No book with ID {0}")]
    NotFound(RecordId),

    /// The record is already on loan
    #[error("Book {0} is already borrowed")]
    AlreadyBorrowed(RecordId),

    /// The record is not on loan
    #[error("Book {0} is not currently borrowed")]
    NotBorrowed(RecordId),

    // ===== Load failures =====
    /// Failed to read the store file
    #[error("Failed to read catalog store at {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The store file is not a valid JSON array
    #[error("Failed to parse catalog store at {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// A stored entry could not be decoded
    #[error("Malformed record at position {index}: {source}")]
    MalformedRecord {
        index: usize,
        #[source]
        source: RecordError,
    },

    /// The store holds the same id twice
    #[error("Catalog store contains duplicate book ID {0}")]
    DuplicateInStore(RecordId),

    // ===== Persistence failures =====
    /// Failed to write the store file
    #[error("Failed to write catalog store at {path}: {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to serialize the collection
    #[error("Failed to serialize catalog: {0}")]
    SerializeError(#[source] serde_json::Error),

    /// Failed to create the store directory
    #[error("Failed to create catalog directory at {path}: {source}")]
    DirectoryCreationError {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to copy the previous store aside
    #[error("Failed to backup catalog store: {source}")]
    BackupError { source: std::io::Error },

    /// Failed to move an unusable store aside
    #[error("Failed to move unusable catalog store to {path}: {source}")]
    QuarantineError {
        path: PathBuf,
        source: std::io::Error,
    },

    // ===== Configuration =====
    /// Failed to read or parse a config file
    #[error("Failed to load config file at {path}: {reason}")]
    ConfigLoadError { path: PathBuf, reason: String },

    /// Config values are not usable
    #[error("Config validation failed: {0}")]
    ConfigValidationError(String),

    /// Config directory path could not be determined
    #[error("Could not determine config directory path: {reason}")]
    PathResolutionError { reason: String },
}

impl CatalogError {
    /// Returns true for expected outcomes of catalog rules
    ///
    /// These leave the catalog unchanged and the caller can carry on.
    pub fn is_business(&self) -> bool {
        matches!(
            self,
            Self::DuplicateId(_)
                | Self::NotFound(_)
                | Self::AlreadyBorrowed(_)
                | Self::NotBorrowed(_)
        )
    }

    /// Returns true if the store could not be written
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            Self::WriteError { .. }
                | Self::SerializeError(_)
                | Self::DirectoryCreationError { .. }
                | Self::BackupError { .. }
                | Self::QuarantineError { .. }
        )
    }

    /// Returns true if the store could not be loaded
    pub fn is_load(&self) -> bool {
        matches!(
            self,
            Self::ReadError { .. }
                | Self::ParseError { .. }
                | Self::MalformedRecord { .. }
                | Self::DuplicateInStore(_)
        )
    }
}
