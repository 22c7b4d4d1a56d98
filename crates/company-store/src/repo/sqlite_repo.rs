//! SQLite repository implementation
//!
//! One `SqliteRepo<E>` per entity type. Each operation runs in its own scoped
//! connection and resolves loaded rows through the repository's identity map.

#![allow(clippy::result_large_err)]

use crate::config::CacheDivergencePolicy;
use crate::db::Database;
use crate::errors::{cache_divergence, sqlite_error, Result};
use crate::repo::entity::{
    delete_sql, drop_table_sql, insert_sql, select_sql, update_sql, Entity, NamedEntity,
};
use crate::repo::hydration::{EntityRef, IdentityMap};
use company_core::errors::ExError;
use company_core::{log_op_end, log_op_error, log_op_start};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, OptionalExtension, Row};
use std::time::Instant;

/// Result of a `save`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// A new row was written and the object now carries its id
    Inserted { id: i64 },
    /// The row with `id` was rewritten; zero rows means the id is stale
    Updated { id: i64, rows_affected: usize },
}

impl SaveOutcome {
    pub fn id(&self) -> i64 {
        match self {
            SaveOutcome::Inserted { id } | SaveOutcome::Updated { id, .. } => *id,
        }
    }

    /// Rows written by the statement; always 1 for an insert
    pub fn rows_affected(&self) -> usize {
        match self {
            SaveOutcome::Inserted { .. } => 1,
            SaveOutcome::Updated { rows_affected, .. } => *rows_affected,
        }
    }

    /// True for an update that matched no row
    pub fn is_stale(&self) -> bool {
        matches!(self, SaveOutcome::Updated { rows_affected: 0, .. })
    }
}

/// SQLite repository for one entity type
pub struct SqliteRepo<E: Entity> {
    db: Database,
    cache: IdentityMap<E>,
    divergence: CacheDivergencePolicy,
}

fn read_row<E: Entity>(row: &Row<'_>) -> rusqlite::Result<(i64, E)> {
    Ok((row.get("id")?, E::from_row(row)?))
}

impl<E: Entity> SqliteRepo<E> {
    /// Create a repository with an empty identity map
    pub fn new(db: Database) -> Self {
        let divergence = db.config().cache_divergence;
        Self {
            db,
            cache: IdentityMap::new(),
            divergence,
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn identity_map(&self) -> &IdentityMap<E> {
        &self.cache
    }

    /// Number of objects currently mapped
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    /// Drop every mapped object; later loads build fresh objects
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    fn instrumented<T>(&self, op: &'static str, work: impl FnOnce() -> Result<T>) -> Result<T> {
        log_op_start!(op, table = E::TABLE);
        let start = Instant::now();

        let result = work().map_err(|e| self.failed(op, start, e))?;

        log_op_end!(
            op,
            duration_ms = start.elapsed().as_millis() as u64,
            table = E::TABLE
        );

        Ok(result)
    }

    fn failed(&self, op: &'static str, start: Instant, err: ExError) -> ExError {
        log_op_error!(
            op,
            err.clone(),
            duration_ms = start.elapsed().as_millis() as u64,
            table = E::TABLE
        );
        err.with_table(E::TABLE)
    }

    /// Create the table if it does not exist
    pub fn create_table(&self) -> Result<()> {
        self.instrumented("create_table", || {
            self.db.scoped("create_table", |tx| {
                tx.execute(E::CREATE_TABLE_SQL, [])
                    .map_err(|e| sqlite_error("create_table", e))?;
                Ok(())
            })
        })
    }

    /// Drop the table if it exists
    ///
    /// The identity map is left alone; mapped objects keep their ids.
    pub fn drop_table(&self) -> Result<()> {
        self.instrumented("drop_table", || {
            self.db.scoped("drop_table", |tx| {
                tx.execute(&drop_table_sql::<E>(), [])
                    .map_err(|e| sqlite_error("drop_table", e))?;
                Ok(())
            })
        })
    }

    /// Insert a transient object or update a persisted one
    ///
    /// An insert assigns the new row id to the object and maps it before the
    /// transaction commits, so no other connection can load the row ahead of
    /// its canonical object. A failed commit unmaps it and clears the id again.
    /// An update rewrites every non-key column; an id with no row is reported
    /// through `SaveOutcome::is_stale`, not as an error.
    pub fn save(&self, entity: &EntityRef<E>) -> Result<SaveOutcome> {
        log_op_start!("save", table = E::TABLE);
        let start = Instant::now();

        let outcome = self
            .save_impl(entity)
            .map_err(|e| self.failed("save", start, e))?;

        log_op_end!(
            "save",
            duration_ms = start.elapsed().as_millis() as u64,
            table = E::TABLE,
            row_id = outcome.id(),
            rows_affected = outcome.rows_affected()
        );

        Ok(outcome)
    }

    fn save_impl(&self, entity: &EntityRef<E>) -> Result<SaveOutcome> {
        let (id, values) = {
            let record = entity.read();
            (record.id(), record.values())
        };

        match id {
            None => {
                let inserted = self.db.scoped("save", |tx| {
                    tx.execute(&insert_sql::<E>(), params_from_iter(values))
                        .map_err(|e| sqlite_error("save", e))?;
                    let new_id = tx.last_insert_rowid();

                    // Uncommitted rows are invisible to other connections
                    entity.write().set_id(Some(new_id));
                    self.cache.insert(new_id, entity.clone());
                    Ok(new_id)
                });

                match inserted {
                    Ok(new_id) => {
                        tracing::debug!(table = E::TABLE, row_id = new_id, "Inserted row");
                        Ok(SaveOutcome::Inserted { id: new_id })
                    }
                    Err(err) => {
                        if let Some(new_id) = entity.id() {
                            entity.write().set_id(None);
                            self.cache.remove_if_same(new_id, entity);
                        }
                        Err(err)
                    }
                }
            }
            Some(id) => {
                let mut params = values;
                params.push(Value::Integer(id));

                let rows_affected = self.db.scoped("save", |tx| {
                    tx.execute(&update_sql::<E>(), params_from_iter(params))
                        .map_err(|e| sqlite_error("save", e))
                })?;

                if rows_affected == 0 {
                    tracing::warn!(
                        table = E::TABLE,
                        row_id = id,
                        "Update matched no rows; the object's id is stale"
                    );
                }

                Ok(SaveOutcome::Updated { id, rows_affected })
            }
        }
    }

    /// Save a new record and return its canonical handle
    pub fn create(&self, entity: E) -> Result<EntityRef<E>> {
        let handle = EntityRef::new(entity);
        self.save(&handle)?;
        Ok(handle)
    }

    /// Canonical object for a loaded row
    ///
    /// If `id` is already mapped the mapped object is returned unchanged and
    /// `fresh` is discarded.
    pub fn hydrate(&self, id: i64, fresh: E) -> EntityRef<E> {
        self.cache.resolve(id, fresh)
    }

    /// Load by primary key; `None` when no row matches
    pub fn find_by_id(&self, id: i64) -> Result<Option<EntityRef<E>>> {
        self.instrumented("find_by_id", || {
            self.find_first_where("find_by_id", "id", Value::Integer(id))
        })
    }

    /// Load every row in the database's natural order
    pub fn get_all(&self) -> Result<Vec<EntityRef<E>>> {
        self.instrumented("get_all", || {
            let rows = self.db.scoped("get_all", |tx| {
                let mut stmt = tx
                    .prepare(&select_sql::<E>())
                    .map_err(|e| sqlite_error("get_all", e))?;
                let rows = stmt
                    .query_map([], read_row::<E>)
                    .map_err(|e| sqlite_error("get_all", e))?
                    .collect::<std::result::Result<Vec<_>, _>>()
                    .map_err(|e| sqlite_error("get_all", e))?;
                Ok(rows)
            })?;

            tracing::debug!(table = E::TABLE, row_count = rows.len(), "Loaded rows");
            Ok(self.hydrate_all(rows))
        })
    }

    /// Delete the object's row, unmap it and clear its id
    ///
    /// A transient object is left alone. If the id is not in the identity
    /// map, the configured `CacheDivergencePolicy` decides between failing
    /// (the DELETE is rolled back and the object keeps its id) and deleting
    /// with a warning.
    pub fn delete(&self, entity: &EntityRef<E>) -> Result<()> {
        self.instrumented("delete", || self.delete_impl(entity))
    }

    fn delete_impl(&self, entity: &EntityRef<E>) -> Result<()> {
        let Some(id) = entity.id() else {
            return Ok(());
        };

        self.db.scoped("delete", |tx| {
            tx.execute(&delete_sql::<E>(), [id])
                .map_err(|e| sqlite_error("delete", e))?;

            if !self.cache.contains(id) {
                match self.divergence {
                    CacheDivergencePolicy::Fail => return Err(cache_divergence(E::TABLE, id)),
                    CacheDivergencePolicy::DeleteAnyway => {
                        tracing::warn!(
                            table = E::TABLE,
                            row_id = id,
                            "Deleting row whose id is not in the identity map"
                        );
                    }
                }
            }
            Ok(())
        })?;

        self.cache.remove(id);
        entity.write().set_id(None);
        Ok(())
    }

    /// Save a persisted object; `Ok(None)` for a transient one
    pub fn update(&self, entity: &EntityRef<E>) -> Result<Option<SaveOutcome>> {
        if entity.id().is_none() {
            return Ok(None);
        }
        self.save(entity).map(Some)
    }

    /// Number of rows in the table
    pub fn count(&self) -> Result<i64> {
        self.db.scoped("count", |tx| {
            tx.query_row(&format!("SELECT COUNT(*) FROM {}", E::TABLE), [], |row| {
                row.get(0)
            })
            .map_err(|e| sqlite_error("count", e))
        })
    }

    /// Every row whose `column` equals `value`, hydrated
    pub(crate) fn find_where(
        &self,
        op: &'static str,
        column: &str,
        value: Value,
    ) -> Result<Vec<EntityRef<E>>> {
        let sql = format!("{} WHERE {} = ?1", select_sql::<E>(), column);
        let rows = self.db.scoped(op, |tx| {
            let mut stmt = tx.prepare(&sql).map_err(|e| sqlite_error(op, e))?;
            let rows = stmt
                .query_map([value], read_row::<E>)
                .map_err(|e| sqlite_error(op, e))?
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| sqlite_error(op, e))?;
            Ok(rows)
        })?;

        Ok(self.hydrate_all(rows))
    }

    /// First row whose `column` equals `value`, hydrated
    pub(crate) fn find_first_where(
        &self,
        op: &'static str,
        column: &str,
        value: Value,
    ) -> Result<Option<EntityRef<E>>> {
        let sql = format!("{} WHERE {} = ?1", select_sql::<E>(), column);
        let row = self.db.scoped(op, |tx| {
            tx.query_row(&sql, [value], read_row::<E>)
                .optional()
                .map_err(|e| sqlite_error(op, e))
        })?;

        Ok(row.map(|(id, fresh)| self.hydrate(id, fresh)))
    }

    fn hydrate_all(&self, rows: Vec<(i64, E)>) -> Vec<EntityRef<E>> {
        rows.into_iter()
            .map(|(id, fresh)| self.hydrate(id, fresh))
            .collect()
    }
}

impl<E: NamedEntity> SqliteRepo<E> {
    /// Load the first row with this name; `None` when no row matches
    ///
    /// Names are not unique; which duplicate comes back is up to SQLite.
    pub fn find_by_name(&self, name: &str) -> Result<Option<EntityRef<E>>> {
        self.instrumented("find_by_name", || {
            self.find_first_where("find_by_name", E::NAME_COLUMN, Value::Text(name.to_string()))
        })
    }
}
