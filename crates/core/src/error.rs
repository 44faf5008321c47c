//! Errors raised while building or decoding a record

use thiserror::Error;

/// Result type for record construction and decoding
pub type RecordResult<T> = Result<T, RecordError>;

/// A serialized record could not be turned into a [`Record`](crate::Record)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    /// The serialized value is not a key/value mapping
    #[error("Record is not an object (got {found})")]
    NotAnObject { found: &'static str },

    /// A required key is absent
    #[error("Record is missing required field '{field}'")]
    MissingField { field: &'static str },

    /// A key is present but holds a value of the wrong kind
    #[error("Record field '{field}' must be {expected} (got {found})")]
    WrongType {
        field: &'static str,
        expected: &'static str,
        found: String,
    },

    /// A text field is empty or whitespace only
    #[error("Record field '{field}' cannot be empty")]
    EmptyField { field: &'static str },
}
