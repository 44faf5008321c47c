//! Bookshelf core domain types
//!
//! This crate holds the catalog entry model and its serialization contract.
//! It has no knowledge of storage or of the catalog that owns records.

pub mod error;
pub mod types;

pub use error::{RecordError, RecordResult};
pub use types::{LoanStatus, Record, RecordId, RecordMap};
