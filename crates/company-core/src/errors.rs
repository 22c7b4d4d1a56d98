use thiserror::Error;

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code that callers and tests can match on
/// without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Configuration
    InvalidConfig,

    // Database
    ConstraintViolation,
    /// A persisted object's id is missing from its identity map
    CacheDivergence,
    Persistence,

    // Parsing
    Serialization,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidConfig => "ERR_INVALID_CONFIG",
            ExErrorKind::ConstraintViolation => "ERR_CONSTRAINT_VIOLATION",
            ExErrorKind::CacheDivergence => "ERR_CACHE_DIVERGENCE",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
        }
    }
}

/// Canonical structured error type
///
/// Carries a classification kind for programmatic handling plus optional
/// context (operation, table, row id) for debugging.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    table: Option<String>,
    entity_id: Option<i64>,
    message: String,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            table: None,
            entity_id: None,
            message: String::new(),
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add table context
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Add row id context
    pub fn with_entity_id(mut self, id: i64) -> Self {
        self.entity_id = Some(id);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Get the operation context, if any
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Get the table context, if any
    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    /// Get the row id context, if any
    pub fn entity_id(&self) -> Option<i64> {
        self.entity_id
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(table) = &self.table {
            write!(f, " (table: {})", table)?;
        }
        if let Some(id) = self.entity_id {
            write!(f, " (id: {})", id)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {}

// ========== End Error Facility ==========

/// Domain failures of the company data-access layer
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompanyError {
    /// A persisted object was deleted but its id was never registered in the
    /// identity map (the map and the database disagree)
    #[error("Identity map has no entry for {table} id {id}")]
    CacheDivergence { table: String, id: i64 },

    /// A statement was rejected by a table constraint
    #[error("Constraint violation: {message}")]
    Constraint { op: String, message: String },

    /// Any other database failure
    #[error("Database error: {message}")]
    Database { op: String, message: String },

    /// Store configuration is unusable
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl From<CompanyError> for ExError {
    fn from(err: CompanyError) -> Self {
        match err {
            CompanyError::CacheDivergence { table, id } => {
                ExError::new(ExErrorKind::CacheDivergence)
                    .with_op("delete")
                    .with_table(table)
                    .with_entity_id(id)
                    .with_message("Object is persisted but absent from the identity map")
            }

            CompanyError::Constraint { op, message } => {
                ExError::new(ExErrorKind::ConstraintViolation)
                    .with_op(op)
                    .with_message(message)
            }

            CompanyError::Database { op, message } => ExError::new(ExErrorKind::Persistence)
                .with_op(op)
                .with_message(message),

            CompanyError::InvalidConfig { reason } => ExError::new(ExErrorKind::InvalidConfig)
                .with_op("config")
                .with_message(format!("Invalid configuration: {}", reason)),
        }
    }
}
