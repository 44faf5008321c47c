//! File system persistence for the catalog
//!
//! This module handles reading and writing the catalog store with:
//! - Atomic writes (temp file in the same directory, then rename)
//! - A copy of the previous store before each overwrite
//! - Moving an unusable store aside so later saves cannot overwrite it
//! - Directory creation
//! - Strict decoding: any bad entry fails the whole load

use crate::{CatalogError, CatalogResult};
use bookshelf_core::Record;
use serde_json::Value;
use std::collections::HashSet;
use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Handles catalog store persistence
#[derive(Debug, Clone)]
pub struct CatalogPersistence {
    store_path: PathBuf,
    backup_on_save: bool,
}

impl CatalogPersistence {
    /// Creates a persistence handler for the given store file
    pub fn new(store_path: PathBuf) -> Self {
        Self {
            store_path,
            backup_on_save: true,
        }
    }

    /// Enables or disables copying the previous store aside on save
    pub fn with_backup(mut self, enabled: bool) -> Self {
        self.backup_on_save = enabled;
        self
    }

    /// Returns the store file path
    pub fn store_path(&self) -> &Path {
        &self.store_path
    }

    /// Returns the path the previous store is copied to before a save
    pub fn backup_path(&self) -> PathBuf {
        self.suffixed_path(".backup")
    }

    fn suffixed_path(&self, suffix: &str) -> PathBuf {
        let mut name = self
            .store_path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| OsString::from("catalog"));
        name.push(suffix);
        self.store_path.with_file_name(name)
    }

    /// Returns the first free `<store>.corrupt[.N]` path
    pub fn corrupt_path(&self) -> PathBuf {
        let base = self.suffixed_path(".corrupt");
        if !base.exists() {
            return base;
        }
        (1u32..)
            .map(|n| self.suffixed_path(&format!(".corrupt.{}", n)))
            .find(|candidate| !candidate.exists())
            .unwrap_or(base)
    }

    /// Moves an unusable store file to [`corrupt_path`](Self::corrupt_path)
    ///
    /// Returns the new location, or `None` if there was no store file.
    /// Neither saves nor backups ever write to that name.
    pub fn quarantine(&self) -> CatalogResult<Option<PathBuf>> {
        if !self.store_path.is_file() {
            return Ok(None);
        }

        let target = self.corrupt_path();
        fs::rename(&self.store_path, &target).map_err(|e| CatalogError::QuarantineError {
            path: target.clone(),
            source: e,
        })?;
        log::warn!(
            "Moved unusable catalog store {} to {}",
            self.store_path.display(),
            target.display()
        );
        Ok(Some(target))
    }

    /// Loads all records from the store
    ///
    /// Returns `Ok(None)` if the store does not exist. Unreadable files,
    /// invalid JSON, a non-array document, malformed entries and repeated
    /// ids are all errors.
    pub fn load(&self) -> CatalogResult<Option<Vec<Record>>> {
        if !self.store_path.exists() {
            log::info!(
                "Catalog store not found at {}, starting empty",
                self.store_path.display()
            );
            return Ok(None);
        }

        let contents =
            fs::read_to_string(&self.store_path).map_err(|e| CatalogError::ReadError {
                path: self.store_path.clone(),
                source: e,
            })?;

        let entries: Vec<Value> =
            serde_json::from_str(&contents).map_err(|e| CatalogError::ParseError {
                path: self.store_path.clone(),
                source: e,
            })?;

        let records = decode_records(&entries)?;

        log::info!(
            "Loaded {} records from {}",
            records.len(),
            self.store_path.display()
        );
        Ok(Some(records))
    }

    /// Writes all records to the store atomically
    ///
    /// The store file is either the old content or the new content, never
    /// a partial write.
    pub fn save(&self, records: &[Record]) -> CatalogResult<()> {
        let dir = self.store_dir();
        self.ensure_directory_exists(&dir)?;

        if self.backup_on_save && self.store_path.is_file() {
            self.backup_store()?;
        }

        let json = serde_json::to_string_pretty(records).map_err(CatalogError::SerializeError)?;

        let temp_file = NamedTempFile::new_in(&dir).map_err(|e| CatalogError::WriteError {
            path: self.store_path.clone(),
            source: e,
        })?;
        self.write_atomic(temp_file, &json)?;

        log::info!(
            "Saved {} records to {}",
            records.len(),
            self.store_path.display()
        );
        Ok(())
    }

    /// Directory holding the store; a bare file name lives in the current directory
    fn store_dir(&self) -> PathBuf {
        match self.store_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    fn ensure_directory_exists(&self, path: &Path) -> CatalogResult<()> {
        if !path.exists() {
            fs::create_dir_all(path).map_err(|e| CatalogError::DirectoryCreationError {
                path: path.to_path_buf(),
                source: e,
            })?;
            log::info!("Created catalog directory: {}", path.display());
        }
        Ok(())
    }

    fn backup_store(&self) -> CatalogResult<()> {
        let backup_path = self.backup_path();
        fs::copy(&self.store_path, &backup_path)
            .map_err(|e| CatalogError::BackupError { source: e })?;
        log::debug!("Backed up catalog store to {}", backup_path.display());
        Ok(())
    }

    fn write_atomic(&self, mut temp_file: NamedTempFile, content: &str) -> CatalogResult<()> {
        let write_err = |e| CatalogError::WriteError {
            path: self.store_path.clone(),
            source: e,
        };

        temp_file.write_all(content.as_bytes()).map_err(write_err)?;
        temp_file.write_all(b"\n").map_err(write_err)?;
        temp_file.flush().map_err(write_err)?;
        // Replacing the store keeps its mode bits
        if let Ok(metadata) = fs::metadata(&self.store_path) {
            temp_file
                .as_file()
                .set_permissions(metadata.permissions())
                .map_err(write_err)?;
        }
        temp_file.as_file().sync_all().map_err(write_err)?;

        temp_file
            .persist(&self.store_path)
            .map_err(|e| CatalogError::WriteError {
                path: self.store_path.clone(),
                source: e.error,
            })?;

        Ok(())
    }
}

/// Decodes store entries in order, rejecting the batch on the first bad one
fn decode_records(entries: &[Value]) -> CatalogResult<Vec<Record>> {
    let mut seen = HashSet::with_capacity(entries.len());
    let mut records = Vec::with_capacity(entries.len());

    for (index, entry) in entries.iter().enumerate() {
        let record = Record::from_value(entry)
            .map_err(|source| CatalogError::MalformedRecord { index, source })?;
        if !seen.insert(record.id()) {
            return Err(CatalogError::DuplicateInStore(record.id()));
        }
        records.push(record);
    }

    Ok(records)
}
