//! Company Core - plain data model and shared facilities
//!
//! This crate provides the pieces of the company data-access layer that do not
//! touch the database:
//! - Department, Employee and Review records (transient until persisted)
//! - Structured error facility (`ExError`, `ExErrorKind`, `CompanyError`)
//! - Structured logging facility with test capture
//! - Canonical log field and event names
//!
//! Persistence lives in `company-store`.

pub mod errors;
pub mod logging_facility;
pub mod model;
pub mod schema;

// Re-export commonly used types
pub use errors::{CompanyError, ExError, ExErrorKind, Result};
pub use model::{Department, Employee, Review};
