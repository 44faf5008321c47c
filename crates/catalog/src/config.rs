//! Catalog configuration
//!
//! Values are layered, later sources overriding earlier ones:
//! defaults < TOML config file < environment variables < explicit overrides
//! applied by the caller (for example CLI flags).

use crate::{CatalogError, CatalogResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Store file used when nothing else is configured
pub const DEFAULT_STORE_FILE: &str = "books.json";

/// Environment variable overriding the store path
pub const ENV_STORE_PATH: &str = "BOOKSHELF_STORE_PATH";

/// Environment variable toggling the pre-save backup
pub const ENV_BACKUP_ON_SAVE: &str = "BOOKSHELF_BACKUP_ON_SAVE";

/// Catalog settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CatalogConfig {
    /// Path of the JSON store file
    pub store_path: PathBuf,

    /// Copy the previous store to `<store>.backup` before each save
    pub backup_on_save: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from(DEFAULT_STORE_FILE),
            backup_on_save: true,
        }
    }
}

impl CatalogConfig {
    /// Creates a config for the given store path with default settings
    pub fn new(store_path: impl Into<PathBuf>) -> Self {
        Self {
            store_path: store_path.into(),
            ..Default::default()
        }
    }

    pub fn with_backup_on_save(mut self, enabled: bool) -> Self {
        self.backup_on_save = enabled;
        self
    }

    /// Returns the default config file location for the platform
    ///
    /// - Linux: `~/.config/bookshelf/config.toml`
    /// - macOS: `~/Library/Application Support/bookshelf/config.toml`
    /// - Windows: `%APPDATA%\bookshelf\config\config.toml`
    pub fn default_config_file() -> CatalogResult<PathBuf> {
        ProjectDirs::from("", "", "bookshelf")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .ok_or_else(|| CatalogError::PathResolutionError {
                reason: "Could not determine user config directory".to_string(),
            })
    }

    /// Reads a TOML config file
    ///
    /// Missing keys take their default values.
    pub fn from_file(path: &Path) -> CatalogResult<Self> {
        let contents = fs::read_to_string(path).map_err(|e| CatalogError::ConfigLoadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        toml::from_str(&contents).map_err(|e| CatalogError::ConfigLoadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Resolves the effective config
    ///
    /// An explicit `config_file` must exist. Without one, the platform
    /// default file is read if present and skipped otherwise. Environment
    /// overrides are applied last, then the result is validated.
    pub fn load(config_file: Option<&Path>) -> CatalogResult<Self> {
        let mut config = match config_file {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_config_file() {
                Ok(path) if path.is_file() => Self::from_file(&path)?,
                Ok(_) => Self::default(),
                Err(e) => {
                    log::debug!("{}, using built-in defaults", e);
                    Self::default()
                }
            },
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Applies `BOOKSHELF_*` environment variables
    ///
    /// Values that cannot be parsed are ignored with a warning.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(ENV_STORE_PATH) {
            log::debug!("Store path override from environment: {}", path);
            self.store_path = PathBuf::from(path);
        }

        if let Some(value) = lookup(ENV_BACKUP_ON_SAVE) {
            match parse_flag(&value) {
                Some(enabled) => self.backup_on_save = enabled,
                None => log::warn!(
                    "Ignoring {}={}: expected true/false",
                    ENV_BACKUP_ON_SAVE,
                    value
                ),
            }
        }
    }

    /// Checks that the store path is usable
    pub fn validate(&self) -> CatalogResult<()> {
        if self.store_path.as_os_str().is_empty() {
            return Err(CatalogError::ConfigValidationError(
                "store_path cannot be empty".to_string(),
            ));
        }

        if self.store_path.is_dir() {
            return Err(CatalogError::ConfigValidationError(format!(
                "store_path {} is a directory",
                self.store_path.display()
            )));
        }

        Ok(())
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
