//! Database connection management
//!
//! Every unit of work runs inside [`Database::scoped`]: a fresh connection and
//! transaction are opened, the work commits on `Ok` and rolls back on `Err`,
//! and the connection is closed on every exit path.

#![allow(clippy::result_large_err)]

use crate::config::StoreConfig;
use crate::errors::{sqlite_error, Result};
use rusqlite::{Connection, Transaction};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Open a SQLite database at the given path
pub fn open<P: AsRef<Path>>(path: P) -> Result<Connection> {
    Connection::open(path).map_err(|e| sqlite_error("open", e))
}

/// Apply the per-connection settings from `config`
pub fn configure(conn: &Connection, config: &StoreConfig) -> Result<()> {
    conn.pragma_update(None, "foreign_keys", config.foreign_keys)
        .map_err(|e| sqlite_error("configure", e))?;

    conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))
        .map_err(|e| sqlite_error("configure", e))?;

    if config.wal {
        let mode: String = conn
            .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))
            .map_err(|e| sqlite_error("configure", e))?;
        tracing::debug!(journal_mode = %mode, "Configured journal mode");
    }

    Ok(())
}

/// Handle to one database file
///
/// Cheap to clone. Holds configuration only; connections are opened per scope
/// and never shared.
#[derive(Debug, Clone)]
pub struct Database {
    config: Arc<StoreConfig>,
}

impl Database {
    /// Create a handle after validating `config`
    pub fn new(config: StoreConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
        })
    }

    /// Configuration this handle was created with
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Database file path
    pub fn path(&self) -> &Path {
        self.config.path()
    }

    /// Open and configure a new connection outside any scope
    ///
    /// The caller owns the connection; prefer [`Database::scoped`].
    pub fn connect(&self) -> Result<Connection> {
        let conn = open(self.path())?;
        configure(&conn, &self.config)?;
        Ok(conn)
    }

    /// Run `work` inside a transaction on a freshly opened connection
    ///
    /// - `work` returns `Ok`: the transaction is committed; a failed commit
    ///   is returned as the error.
    /// - `work` returns `Err`: the transaction is rolled back and the original
    ///   error is returned.
    /// - `work` panics: the transaction guard rolls back while unwinding.
    ///
    /// The connection is closed before this returns in every case.
    pub fn scoped<T, F>(&self, op: &str, work: F) -> Result<T>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T>,
    {
        let mut conn = self.connect()?;

        let outcome = match conn.transaction() {
            Ok(tx) => match work(&tx) {
                Ok(value) => tx
                    .commit()
                    .map(|()| value)
                    .map_err(|e| sqlite_error(op, e)),
                Err(err) => {
                    if let Err(rollback_err) = tx.rollback() {
                        tracing::warn!(op, error = %rollback_err, "Rollback failed");
                    }
                    Err(err)
                }
            },
            Err(e) => Err(sqlite_error(op, e)),
        };

        release(conn, op);
        outcome
    }
}

/// Close a connection, logging instead of failing if SQLite refuses
fn release(conn: Connection, op: &str) {
    if let Err((_conn, err)) = conn.close() {
        tracing::warn!(op, error = %err, "Failed to close connection");
    }
}
