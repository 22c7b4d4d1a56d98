//! Error handling for company-store
//!
//! Wraps company-core ExError with store-specific helpers

use company_core::errors::{CompanyError, ExError, ExErrorKind};

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// Create a database error from rusqlite::Error
///
/// Constraint failures (foreign key, NOT NULL, UNIQUE) are classified as
/// `ConstraintViolation`; everything else is `Persistence`.
pub fn sqlite_error(op: &str, err: rusqlite::Error) -> ExError {
    let message = err.to_string();
    let op = op.to_string();
    let classified = match &err {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            CompanyError::Constraint { op, message }
        }
        _ => CompanyError::Database { op, message },
    };
    classified.into()
}

/// Create a cache divergence error
pub fn cache_divergence(table: &str, id: i64) -> ExError {
    CompanyError::CacheDivergence {
        table: table.to_string(),
        id,
    }
    .into()
}

/// Create an invalid configuration error
pub fn invalid_config(reason: &str) -> ExError {
    CompanyError::InvalidConfig {
        reason: reason.to_string(),
    }
    .into()
}

/// Create a configuration parse error
pub fn config_parse(err: toml::de::Error) -> ExError {
    ExError::new(ExErrorKind::Serialization)
        .with_op("config_parse")
        .with_message(err.to_string())
}
