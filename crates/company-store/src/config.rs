//! Store configuration
//!
//! A `StoreConfig` names the database file and the per-connection settings
//! every scoped connection applies. It can be built in code or parsed from
//! TOML:
//!
//! ```toml
//! path = "company.db"
//! foreign_keys = true
//! busy_timeout_ms = 2000
//! wal = false
//! cache_divergence = "delete_anyway"
//! ```

#![allow(clippy::result_large_err)]

use crate::errors::{config_parse, invalid_config, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default database file, relative to the working directory
pub const DEFAULT_DB_PATH: &str = "company.db";

/// Default SQLite busy timeout in milliseconds
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5000;

/// What `delete` does when a persisted object's id is missing from the
/// identity map
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheDivergencePolicy {
    /// Fail with `CacheDivergence` and roll the DELETE back
    #[default]
    Fail,
    /// Log a warning and keep the DELETE
    DeleteAnyway,
}

/// Configuration for opening scoped connections
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Path of the SQLite database file
    pub path: PathBuf,

    /// Enforce declared foreign keys (`PRAGMA foreign_keys`)
    pub foreign_keys: bool,

    /// How long a connection waits on a locked database
    pub busy_timeout_ms: u64,

    /// Switch the database to write-ahead logging
    pub wal: bool,

    /// What `delete` does for a persisted object missing from the identity map
    pub cache_divergence: CacheDivergencePolicy,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_DB_PATH),
            foreign_keys: false,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            wal: false,
            cache_divergence: CacheDivergencePolicy::Fail,
        }
    }
}

impl StoreConfig {
    /// Default configuration pointing at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Parse a configuration from TOML; missing keys take their defaults
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let config: StoreConfig = toml::from_str(input).map_err(config_parse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_foreign_keys(mut self, enabled: bool) -> Self {
        self.foreign_keys = enabled;
        self
    }

    pub fn with_busy_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.busy_timeout_ms = timeout_ms;
        self
    }

    pub fn with_wal(mut self, enabled: bool) -> Self {
        self.wal = enabled;
        self
    }

    pub fn with_cache_divergence(mut self, policy: CacheDivergencePolicy) -> Self {
        self.cache_divergence = policy;
        self
    }

    /// Database file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reject configurations no scoped connection could work with
    ///
    /// Every scope opens a fresh connection, so an in-memory database would
    /// be empty on each open. That covers `:memory:` and the URI forms
    /// `file::memory:` and `file:...?mode=memory`.
    pub fn validate(&self) -> Result<()> {
        let path = self.path.to_string_lossy();
        if path.trim().is_empty() {
            return Err(invalid_config("path must not be empty"));
        }
        if is_in_memory(&path) {
            return Err(invalid_config(
                "in-memory databases do not survive across scoped connections",
            ));
        }
        Ok(())
    }
}

fn is_in_memory(path: &str) -> bool {
    if path == ":memory:" {
        return true;
    }
    let Some(uri) = path.strip_prefix("file:") else {
        return false;
    };
    let (location, query) = uri.split_once('?').unwrap_or((uri, ""));
    location == ":memory:" || query.split('&').any(|param| param == "mode=memory")
}

#[cfg(test)]
mod tests {
    use super::*;
    use company_core::ExErrorKind;

    #[test]
    fn test_defaults() {
        let config = StoreConfig::default();

        assert_eq!(config.path(), Path::new("company.db"));
        assert!(!config.foreign_keys);
        assert!(!config.wal);
        assert_eq!(config.busy_timeout_ms, 5000);
        assert_eq!(config.cache_divergence, CacheDivergencePolicy::Fail);
    }

    #[test]
    fn test_from_toml_partial() {
        let config = StoreConfig::from_toml_str(
            r#"
            path = "/tmp/hr.db"
            foreign_keys = true
            cache_divergence = "delete_anyway"
            "#,
        )
        .unwrap();

        assert_eq!(config.path(), Path::new("/tmp/hr.db"));
        assert!(config.foreign_keys);
        assert_eq!(config.busy_timeout_ms, DEFAULT_BUSY_TIMEOUT_MS);
        assert_eq!(
            config.cache_divergence,
            CacheDivergencePolicy::DeleteAnyway
        );
    }

    #[test]
    fn test_from_toml_rejects_unknown_key() {
        let err = StoreConfig::from_toml_str("pool_size = 4").unwrap_err();

        assert_eq!(err.kind(), ExErrorKind::Serialization);
    }

    #[test]
    fn test_validate_rejects_empty_and_memory_paths() {
        let empty = StoreConfig::new("").validate().unwrap_err();
        let memory = StoreConfig::new(":memory:").validate().unwrap_err();

        assert_eq!(empty.kind(), ExErrorKind::InvalidConfig);
        assert_eq!(memory.kind(), ExErrorKind::InvalidConfig);
    }

    #[test]
    fn test_validate_rejects_in_memory_uris() {
        for path in [
            "file::memory:",
            "file::memory:?cache=shared",
            "file:hr?mode=memory&cache=shared",
        ] {
            let err = StoreConfig::new(path).validate().unwrap_err();
            assert_eq!(err.kind(), ExErrorKind::InvalidConfig, "{}", path);
        }
    }

    #[test]
    fn test_validate_accepts_file_uris_on_disk() {
        assert!(StoreConfig::new("file:hr.db").validate().is_ok());
        assert!(StoreConfig::new("file:hr.db?mode=rwc").validate().is_ok());
        assert!(StoreConfig::new("memory.db").validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = StoreConfig::new("x.db")
            .with_foreign_keys(true)
            .with_wal(true)
            .with_busy_timeout_ms(10)
            .with_cache_divergence(CacheDivergencePolicy::DeleteAnyway);

        assert!(config.foreign_keys);
        assert!(config.wal);
        assert_eq!(config.busy_timeout_ms, 10);
        assert_eq!(
            config.cache_divergence,
            CacheDivergencePolicy::DeleteAnyway
        );
    }
}
