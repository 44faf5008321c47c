//! Domain types for Bookshelf
//!
//! - `record`: the catalog entry and its mapping contract

mod record;

pub use record::{LoanStatus, Record, RecordId, RecordMap};
