//! Bookshelf catalog
//!
//! An ordered collection of [`Record`]s persisted to a single JSON file.
//!
//! # Architecture
//!
//! - **Write-through**: every successful mutation saves the whole collection
//! - **All-or-nothing**: a mutation whose save fails is undone in memory
//! - **Atomic writes**: the store is replaced via temp file and rename
//! - **Recovering load**: a missing or unusable store yields an empty catalog
//! - **Scoped lifetime**: [`Catalog::close`] / [`Catalog::scoped`] perform the
//!   final save; dropping an unclosed catalog saves as a fallback
//!
//! # Example
//!
//! ```rust,no_run
//! use bookshelf_catalog::{Catalog, CatalogConfig, CatalogError};
//! use bookshelf_core::Record;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = CatalogConfig::new("books.json");
//! Catalog::scoped(&config, |catalog| {
//!     catalog.add(Record::new(1, "Dune", "Frank Herbert")?)?;
//!     match catalog.borrow_item(1) {
//!         Ok(()) => println!("Borrowed"),
//!         Err(CatalogError::AlreadyBorrowed(id)) => println!("{} is out", id),
//!         Err(e) => return Err(e.into()),
//!     }
//!     Ok::<_, Box<dyn std::error::Error>>(())
//! })?;
//! # Ok(())
//! # }
//! ```

mod catalog;
mod config;
mod error;
mod persistence;

pub use catalog::{Catalog, CatalogStats, LoadStatus};
pub use config::{CatalogConfig, DEFAULT_STORE_FILE, ENV_BACKUP_ON_SAVE, ENV_STORE_PATH};
pub use error::{CatalogError, CatalogResult};
pub use persistence::CatalogPersistence;

pub use bookshelf_core::{Record, RecordId};
