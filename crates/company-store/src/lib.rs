//! Company Store - SQLite persistence with identity-mapped repositories
//!
//! Provides:
//! - Store configuration (path, pragmas, cache divergence policy)
//! - Scoped connections that commit or roll back around a unit of work
//! - A generic repository shared by Department, Employee and Review
//! - Identity maps so repeated loads of a row yield the same object
//! - Association accessors (employee reviews, department employees)
//! - A `Session` owning one repository per entity type

pub mod config;
pub mod db;
pub mod errors;
pub mod repo;
pub mod session;

// Re-export key types
pub use config::{CacheDivergencePolicy, StoreConfig};
pub use db::Database;
pub use errors::Result;
pub use repo::{Entity, EntityRef, IdentityMap, NamedEntity, SaveOutcome, SqliteRepo};
pub use session::Session;
