//! Repository layer for persisting company records to SQLite

pub mod association;
pub mod entity;
pub mod hydration;
pub mod sqlite_repo;

pub use entity::{Entity, NamedEntity};
pub use hydration::{EntityRef, IdentityMap};
pub use sqlite_repo::{SaveOutcome, SqliteRepo};
