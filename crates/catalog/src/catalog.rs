//! The catalog: an ordered record collection bound to its store file
//!
//! Every successful mutation is written through to the store before the
//! call returns. A mutation whose save fails is undone in memory, so the
//! in-memory collection always matches the last successful save.

use crate::persistence::CatalogPersistence;
use crate::{CatalogConfig, CatalogError, CatalogResult};
use bookshelf_core::{Record, RecordId};
use std::path::{Path, PathBuf};

/// Outcome of reading the store into the catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    /// No store file existed; the catalog starts empty
    Missing,
    /// The store was read successfully
    Loaded { count: usize },
    /// The store could not be used; the catalog starts empty
    ///
    /// `preserved_at` is where the unusable file was moved. When it is
    /// `None` the file is still at the store path and is only overwritten
    /// by a successful mutation, never by the final save.
    Recovered {
        reason: String,
        preserved_at: Option<PathBuf>,
    },
}

impl LoadStatus {
    pub fn is_recovered(&self) -> bool {
        matches!(self, Self::Recovered { .. })
    }
}

/// Loan counts across the catalog
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatalogStats {
    pub total: usize,
    pub borrowed: usize,
    pub available: usize,
}

/// Record collection with write-through persistence
///
/// Call [`Catalog::close`] when done, or use [`Catalog::scoped`]. A catalog
/// dropped without being closed still attempts a final save and logs the
/// error if that fails.
#[derive(Debug)]
pub struct Catalog {
    records: Vec<Record>,
    persistence: CatalogPersistence,
    load_status: LoadStatus,
    closed: bool,
    /// Set while an unusable store is still in place; cleared by the first
    /// successful mutation
    guard_store: bool,
}

impl Catalog {
    /// Opens a catalog on the given store file
    ///
    /// Never fails: a missing store gives an empty catalog, and an unusable
    /// store (unreadable, invalid JSON, malformed entries) gives an empty
    /// catalog with [`LoadStatus::Recovered`].
    pub fn open(store_path: impl Into<PathBuf>) -> Self {
        Self::from_persistence(CatalogPersistence::new(store_path.into()))
    }

    /// Opens a catalog using the given configuration
    pub fn with_config(config: &CatalogConfig) -> Self {
        Self::from_persistence(
            CatalogPersistence::new(config.store_path.clone()).with_backup(config.backup_on_save),
        )
    }

    /// Opens a catalog, returning an error instead of recovering from a bad store
    pub fn open_strict(store_path: impl Into<PathBuf>) -> CatalogResult<Self> {
        let persistence = CatalogPersistence::new(store_path.into());
        let (records, load_status) = match persistence.load()? {
            Some(records) => {
                let count = records.len();
                (records, LoadStatus::Loaded { count })
            }
            None => (Vec::new(), LoadStatus::Missing),
        };

        Ok(Self {
            records,
            persistence,
            load_status,
            closed: false,
            guard_store: false,
        })
    }

    /// Opens a catalog, runs `f` on it, then closes it
    ///
    /// The final save happens whether `f` succeeds or fails. An error from
    /// `f` takes precedence over an error from the final save.
    pub fn scoped<T, E, F>(config: &CatalogConfig, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Catalog) -> Result<T, E>,
        E: From<CatalogError>,
    {
        let mut catalog = Self::with_config(config);
        let result = f(&mut catalog);
        let closed = catalog.close();
        let value = result?;
        closed?;
        Ok(value)
    }

    fn from_persistence(persistence: CatalogPersistence) -> Self {
        let mut catalog = Self {
            records: Vec::new(),
            persistence,
            load_status: LoadStatus::Missing,
            closed: false,
            guard_store: false,
        };
        catalog.load();
        catalog
    }

    /// Replaces the in-memory collection with the store's contents
    ///
    /// An unusable store is moved aside before the catalog starts empty, so
    /// later saves cannot destroy it.
    pub fn load(&mut self) -> &LoadStatus {
        self.guard_store = false;
        let (records, status) = match self.persistence.load() {
            Ok(Some(records)) => {
                let count = records.len();
                (records, LoadStatus::Loaded { count })
            }
            Ok(None) => (Vec::new(), LoadStatus::Missing),
            Err(e) => {
                log::warn!(
                    "Could not load catalog from {}: {}; starting with an empty catalog",
                    self.persistence.store_path().display(),
                    e
                );
                let preserved_at = match self.persistence.quarantine() {
                    Ok(moved) => moved,
                    Err(move_err) => {
                        log::warn!("{}; leaving the store in place", move_err);
                        self.guard_store = true;
                        None
                    }
                };
                (
                    Vec::new(),
                    LoadStatus::Recovered {
                        reason: e.to_string(),
                        preserved_at,
                    },
                )
            }
        };

        self.records = records;
        self.load_status = status;
        &self.load_status
    }

    /// Writes the whole collection to the store
    pub fn save(&self) -> CatalogResult<()> {
        self.persistence.save(&self.records)
    }

    /// Appends a record
    ///
    /// Fails with [`CatalogError::DuplicateId`] if the id is taken. If the
    /// save fails the record is not kept.
    pub fn add(&mut self, record: Record) -> CatalogResult<()> {
        let id = record.id();
        if self.position(id).is_some() {
            return Err(CatalogError::DuplicateId(id));
        }

        self.records.push(record);
        if let Err(e) = self.save() {
            self.records.pop();
            return Err(e);
        }
        self.guard_store = false;

        log::debug!("Added book {}", id);
        Ok(())
    }

    /// Returns all records in insertion order
    pub fn list(&self) -> &[Record] {
        &self.records
    }

    /// Returns the record with the given id, if any
    pub fn find(&self, id: impl Into<RecordId>) -> Option<&Record> {
        let id = id.into();
        self.records.iter().find(|record| record.id() == id)
    }

    /// Marks an available record as borrowed
    pub fn borrow_item(&mut self, id: impl Into<RecordId>) -> CatalogResult<()> {
        self.set_loan(id.into(), true)
    }

    /// Marks a borrowed record as available again
    pub fn return_item(&mut self, id: impl Into<RecordId>) -> CatalogResult<()> {
        self.set_loan(id.into(), false)
    }

    /// Removes a record and returns it
    pub fn remove(&mut self, id: impl Into<RecordId>) -> CatalogResult<Record> {
        let id = id.into();
        let index = self.position(id).ok_or(CatalogError::NotFound(id))?;

        let record = self.records.remove(index);
        if let Err(e) = self.save() {
            self.records.insert(index, record);
            return Err(e);
        }
        self.guard_store = false;

        log::debug!("Removed book {}", id);
        Ok(record)
    }

    pub fn stats(&self) -> CatalogStats {
        let borrowed = self.records.iter().filter(|r| r.is_borrowed()).count();
        CatalogStats {
            total: self.records.len(),
            borrowed,
            available: self.records.len() - borrowed,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the store file path
    pub fn path(&self) -> &Path {
        self.persistence.store_path()
    }

    /// Returns how the last load went
    pub fn load_status(&self) -> &LoadStatus {
        &self.load_status
    }

    /// Performs the final save and consumes the catalog
    ///
    /// Skipped if the store could not be loaded, could not be moved aside,
    /// and nothing has changed since.
    pub fn close(mut self) -> CatalogResult<()> {
        self.closed = true;
        self.final_save()
    }

    fn final_save(&self) -> CatalogResult<()> {
        if self.guard_store {
            log::warn!(
                "Leaving unusable catalog store {} untouched",
                self.persistence.store_path().display()
            );
            return Ok(());
        }
        self.save()
    }

    fn position(&self, id: RecordId) -> Option<usize> {
        self.records.iter().position(|record| record.id() == id)
    }

    fn set_loan(&mut self, id: RecordId, borrowed: bool) -> CatalogResult<()> {
        let index = self.position(id).ok_or(CatalogError::NotFound(id))?;

        if self.records[index].is_borrowed() == borrowed {
            return Err(if borrowed {
                CatalogError::AlreadyBorrowed(id)
            } else {
                CatalogError::NotBorrowed(id)
            });
        }

        self.records[index].set_borrowed(borrowed);
        if let Err(e) = self.save() {
            self.records[index].set_borrowed(!borrowed);
            return Err(e);
        }
        self.guard_store = false;

        log::debug!("Book {} is now {}", id, self.records[index].status());
        Ok(())
    }
}

impl Drop for Catalog {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Err(e) = self.final_save() {
            log::error!(
                "Final save of catalog to {} failed: {}",
                self.persistence.store_path().display(),
                e
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn setup_test_catalog() -> (TempDir, Catalog) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let catalog = Catalog::open(temp_dir.path().join("books.json"));
        (temp_dir, catalog)
    }

    fn record(id: i64, title: &str, author: &str) -> Record {
        Record::new(id, title, author).expect("valid record")
    }

    #[test]
    fn test_open_missing_store_is_empty() {
        let (_temp_dir, catalog) = setup_test_catalog();
        assert!(catalog.is_empty());
        assert_eq!(catalog.load_status(), &LoadStatus::Missing);
    }

    #[test]
    fn test_add_appends_and_persists() {
        let (_temp_dir, mut catalog) = setup_test_catalog();
        catalog.add(record(1, "Dune", "Herbert")).unwrap();
        catalog.add(record(2, "Emma", "Austen")).unwrap();

        let ids: Vec<i64> = catalog.list().iter().map(|r| r.id().get()).collect();
        assert_eq!(ids, vec![1, 2]);

        let reopened = Catalog::open(catalog.path().to_path_buf());
        assert_eq!(reopened.list(), catalog.list());
    }

    #[test]
    fn test_add_duplicate_leaves_catalog_unchanged() {
        let (_temp_dir, mut catalog) = setup_test_catalog();
        catalog.add(record(1, "Dune", "Herbert")).unwrap();
        let before = fs::read_to_string(catalog.path()).unwrap();

        let err = catalog.add(record(1, "X", "Y")).unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateId(id) if id.get() == 1));
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.find(1).unwrap().title(), "Dune");
        assert_eq!(fs::read_to_string(catalog.path()).unwrap(), before);
    }

    #[test]
    fn test_find_absent_returns_none() {
        let (_temp_dir, catalog) = setup_test_catalog();
        assert!(catalog.find(42).is_none());
    }

    #[test]
    fn test_borrow_and_return_state_machine() {
        let (_temp_dir, mut catalog) = setup_test_catalog();
        catalog.add(record(1, "Dune", "Herbert")).unwrap();

        catalog.borrow_item(1).unwrap();
        assert!(catalog.find(1).unwrap().is_borrowed());
        assert!(matches!(
            catalog.borrow_item(1),
            Err(CatalogError::AlreadyBorrowed(_))
        ));
        assert!(catalog.find(1).unwrap().is_borrowed());

        catalog.return_item(1).unwrap();
        assert!(!catalog.find(1).unwrap().is_borrowed());
        assert!(matches!(
            catalog.return_item(1),
            Err(CatalogError::NotBorrowed(_))
        ));
    }

    #[test]
    fn test_unknown_id_is_not_found() {
        let (_temp_dir, mut catalog) = setup_test_catalog();
        assert!(matches!(catalog.borrow_item(99), Err(CatalogError::NotFound(_))));
        assert!(matches!(catalog.return_item(99), Err(CatalogError::NotFound(_))));
        assert!(matches!(catalog.remove(99), Err(CatalogError::NotFound(_))));
    }

    #[test]
    fn test_remove_keeps_order_of_rest() {
        let (_temp_dir, mut catalog) = setup_test_catalog();
        for id in 1..=3 {
            catalog.add(record(id, "Title", "Author")).unwrap();
        }

        let removed = catalog.remove(2).unwrap();
        assert_eq!(removed.id().get(), 2);

        let ids: Vec<i64> = catalog.list().iter().map(|r| r.id().get()).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_stats() {
        let (_temp_dir, mut catalog) = setup_test_catalog();
        catalog.add(record(1, "Dune", "Herbert")).unwrap();
        catalog.add(record(2, "Emma", "Austen")).unwrap();
        catalog.borrow_item(2).unwrap();

        assert_eq!(
            catalog.stats(),
            CatalogStats {
                total: 2,
                borrowed: 1,
                available: 1
            }
        );
    }

    #[test]
    fn test_corrupt_store_recovers_empty() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("books.json");
        fs::write(&path, "{ not json").unwrap();

        let catalog = Catalog::open(&path);
        assert!(catalog.is_empty());
        assert!(catalog.load_status().is_recovered());
    }

    #[test]
    fn test_recovered_store_survives_repeated_sessions() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("books.json");
        let original =
            r#"[{"book_id": 1, "title": "Dune", "author": "Herbert", "is_borrowed": "yes"}]"#;
        fs::write(&path, original).unwrap();

        let first = Catalog::open(&path);
        let preserved = match first.load_status() {
            LoadStatus::Recovered {
                preserved_at: Some(moved),
                ..
            } => moved.clone(),
            other => panic!("expected the store to be moved aside, got {:?}", other),
        };
        first.close().unwrap();
        Catalog::open(&path).close().unwrap();
        Catalog::open(&path).close().unwrap();

        assert_eq!(fs::read_to_string(&preserved).unwrap(), original);
        assert_eq!(fs::read_to_string(&path).unwrap().trim(), "[]");
    }

    #[cfg(unix)]
    #[test]
    fn test_unmovable_corrupt_store_is_not_overwritten_on_close() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("shelf");
        fs::create_dir(&dir).unwrap();
        let path = dir.join("books.json");
        fs::write(&path, "{ not json").unwrap();

        // A read-only directory makes the rename fail
        fs::set_permissions(&dir, fs::Permissions::from_mode(0o555)).unwrap();
        let catalog = Catalog::open(&path);
        let moved = matches!(
            catalog.load_status(),
            LoadStatus::Recovered { preserved_at: Some(_), .. }
        );
        let closed = catalog.close();
        fs::set_permissions(&dir, fs::Permissions::from_mode(0o755)).unwrap();

        // Privileged users can rename regardless of the directory mode
        if !moved {
            assert!(closed.is_ok());
            assert_eq!(fs::read_to_string(&path).unwrap(), "{ not json");
        }
    }

    #[test]
    fn test_open_strict_surfaces_corruption() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("books.json");
        fs::write(&path, "{ not json").unwrap();

        let err = Catalog::open_strict(&path).unwrap_err();
        assert!(err.is_load());
    }

    #[test]
    fn test_failed_add_is_rolled_back() {
        let temp_dir = TempDir::new().unwrap();
        // The store's parent is a regular file, so every save fails
        let blocker = temp_dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();
        let mut catalog = Catalog::open(blocker.join("books.json"));

        let err = catalog.add(record(1, "Dune", "Herbert")).unwrap_err();
        assert!(err.is_persistence());
        assert!(catalog.is_empty());
    }

    /// Builds a catalog with one saved record, then breaks its directory so
    /// every later save fails
    fn catalog_with_broken_store(borrowed: bool) -> (TempDir, Catalog) {
        let temp_dir = TempDir::new().unwrap();
        let sub = temp_dir.path().join("sub");
        let mut catalog = Catalog::open(sub.join("books.json"));
        catalog.add(record(1, "Dune", "Herbert")).unwrap();
        catalog.add(record(2, "Emma", "Austen")).unwrap();
        if borrowed {
            catalog.borrow_item(1).unwrap();
        }

        fs::remove_dir_all(&sub).unwrap();
        fs::write(&sub, "").unwrap();
        (temp_dir, catalog)
    }

    #[test]
    fn test_failed_borrow_is_rolled_back() {
        let (_temp_dir, mut catalog) = catalog_with_broken_store(false);
        let before = catalog.list().to_vec();

        let err = catalog.borrow_item(1).unwrap_err();
        assert!(err.is_persistence());
        assert!(!catalog.find(1).unwrap().is_borrowed());
        assert_eq!(catalog.list(), before.as_slice());
    }

    #[test]
    fn test_failed_return_is_rolled_back() {
        let (_temp_dir, mut catalog) = catalog_with_broken_store(true);
        let before = catalog.list().to_vec();

        let err = catalog.return_item(1).unwrap_err();
        assert!(err.is_persistence());
        assert!(catalog.find(1).unwrap().is_borrowed());
        assert_eq!(catalog.list(), before.as_slice());
    }

    #[test]
    fn test_failed_remove_is_rolled_back() {
        let (_temp_dir, mut catalog) = catalog_with_broken_store(false);
        let before = catalog.list().to_vec();

        let err = catalog.remove(1).unwrap_err();
        assert!(err.is_persistence());
        assert_eq!(catalog.list(), before.as_slice());
    }

    #[test]
    fn test_close_writes_store() {
        let (_temp_dir, catalog) = setup_test_catalog();
        let path = catalog.path().to_path_buf();
        assert!(!path.exists());

        catalog.close().unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents.trim(), "[]");
    }

    #[test]
    fn test_drop_without_close_saves() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("books.json");
        {
            let _catalog = Catalog::open(&path);
        }
        assert!(path.exists());
    }
}
