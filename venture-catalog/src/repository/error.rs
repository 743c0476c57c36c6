//! Catalog error types
//!
//! Every request-path failure is a [`CatalogError`]: an operation, a kind from
//! the fixed taxonomy, a caller-facing message and, for validation failures,
//! the full set of field-level reasons.
//!
//! # Example
//!
//! ```rust
//! use venture_catalog::repository::{CatalogError, CatalogErrorKind};
//!
//! let error = CatalogError::not_found("Organization", "42");
//! assert!(matches!(error.kind, CatalogErrorKind::NotFound));
//! assert_eq!(error.entity_id.as_deref(), Some("42"));
//! ```

use std::fmt;

use crate::validation::FieldError;

/// Operation being performed when the error occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogOperation {
    /// Filtered, paginated read
    List,
    /// Single record read by id
    Get,
    /// Insert
    Create,
    /// Partial update
    Update,
    /// Physical delete
    Delete,
    /// Raw statement execution before an operation is attached
    Execute,
}

impl fmt::Display for CatalogOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::List => write!(f, "list"),
            Self::Get => write!(f, "get"),
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
            Self::Execute => write!(f, "execute"),
        }
    }
}

/// Category of catalog error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogErrorKind {
    /// Bad or missing input, with field-level reasons
    ValidationFailed,
    /// Identifier has no matching record
    NotFound,
    /// Update payload supplied no mutable field
    NoFieldsToUpdate,
    /// A paging or id argument could not be coerced
    InvalidArgument,
    /// Store reported a uniqueness or constraint violation
    ConflictingState,
    /// Store could not be reached
    StoreUnavailable,
    /// Anything else from the storage layer
    Unexpected,
}

impl fmt::Display for CatalogErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValidationFailed => write!(f, "validation_failed"),
            Self::NotFound => write!(f, "not_found"),
            Self::NoFieldsToUpdate => write!(f, "no_fields_to_update"),
            Self::InvalidArgument => write!(f, "invalid_argument"),
            Self::ConflictingState => write!(f, "conflicting_state"),
            Self::StoreUnavailable => write!(f, "store_unavailable"),
            Self::Unexpected => write!(f, "unexpected"),
        }
    }
}

/// Structured catalog error with operation context
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogError {
    /// The operation being performed when the error occurred
    pub operation: CatalogOperation,
    /// The category of error
    pub kind: CatalogErrorKind,
    /// Human-readable error message
    pub message: String,
    /// Record kind involved, if known
    pub entity_type: Option<String>,
    /// Record id involved, if known
    pub entity_id: Option<String>,
    /// Field-level reasons for `ValidationFailed`
    pub field_errors: Vec<FieldError>,
}

impl CatalogError {
    /// Create a new catalog error
    pub fn new(
        operation: CatalogOperation,
        kind: CatalogErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            operation,
            kind,
            message: message.into(),
            entity_type: None,
            entity_id: None,
            field_errors: Vec::new(),
        }
    }

    /// Record `entity_id` of `entity_type` does not exist
    pub fn not_found(entity_type: impl Into<String>, entity_id: impl Into<String>) -> Self {
        let entity_type = entity_type.into();
        let entity_id = entity_id.into();
        Self {
            operation: CatalogOperation::Get,
            kind: CatalogErrorKind::NotFound,
            message: format!("{} not found", entity_type),
            entity_type: Some(entity_type),
            entity_id: Some(entity_id),
            field_errors: Vec::new(),
        }
    }

    /// Input failed one or more field checks
    pub fn validation_failed(field_errors: Vec<FieldError>) -> Self {
        let message = match field_errors.as_slice() {
            [single] => single.message.clone(),
            errors => format!("{} fields failed validation", errors.len()),
        };
        Self {
            operation: CatalogOperation::Create,
            kind: CatalogErrorKind::ValidationFailed,
            message,
            entity_type: None,
            entity_id: None,
            field_errors,
        }
    }

    /// Update payload named no mutable field
    pub fn no_fields_to_update() -> Self {
        Self::new(
            CatalogOperation::Update,
            CatalogErrorKind::NoFieldsToUpdate,
            "No valid fields to update",
        )
    }

    /// Argument could not be coerced
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(
            CatalogOperation::List,
            CatalogErrorKind::InvalidArgument,
            message,
        )
    }

    /// Store-reported constraint violation
    pub fn conflicting_state(message: impl Into<String>) -> Self {
        Self::new(
            CatalogOperation::Execute,
            CatalogErrorKind::ConflictingState,
            message,
        )
    }

    /// Store could not be reached
    pub fn store_unavailable(message: impl Into<String>) -> Self {
        Self::new(
            CatalogOperation::Execute,
            CatalogErrorKind::StoreUnavailable,
            message,
        )
    }

    /// Unclassified storage failure
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::new(
            CatalogOperation::Execute,
            CatalogErrorKind::Unexpected,
            message,
        )
    }

    /// Attach the record kind and id
    pub fn with_entity(
        mut self,
        entity_type: impl Into<String>,
        entity_id: impl Into<String>,
    ) -> Self {
        self.entity_type = Some(entity_type.into());
        self.entity_id = Some(entity_id.into());
        self
    }

    /// Attach the record kind only
    pub fn with_entity_type(mut self, entity_type: impl Into<String>) -> Self {
        self.entity_type = Some(entity_type.into());
        self
    }

    /// Set the operation
    pub fn with_operation(mut self, operation: CatalogOperation) -> Self {
        self.operation = operation;
        self
    }

    /// Failures that may succeed if the caller tries again later
    ///
    /// Nothing in the engine retries; this picks the 503 wording and is
    /// logged alongside store failures.
    pub fn is_retriable(&self) -> bool {
        matches!(self.kind, CatalogErrorKind::StoreUnavailable)
    }

    /// Failures whose message must not reach the caller
    pub fn is_internal(&self) -> bool {
        matches!(
            self.kind,
            CatalogErrorKind::StoreUnavailable | CatalogErrorKind::Unexpected
        )
    }
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Catalog {} error during {}: {}",
            self.kind, self.operation, self.message
        )?;
        match (&self.entity_type, &self.entity_id) {
            (Some(t), Some(id)) => write!(f, " [{}: {}]", t, id),
            (Some(t), None) => write!(f, " [{}]", t),
            _ => Ok(()),
        }
    }
}

impl std::error::Error for CatalogError {}

/// Caller-facing message for values the store refused; the driver text stays in the logs
#[cfg(feature = "database")]
pub(crate) const STORE_REJECTED_MESSAGE: &str = "A value was rejected by the store";

/// SQLSTATE codes surfaced as `ConflictingState`
#[cfg(feature = "database")]
const CONFLICT_STATES: [&str; 4] = [
    "23505", // unique_violation
    "23503", // foreign_key_violation
    "23514", // check_violation
    "23502", // not_null_violation
];

#[cfg(feature = "database")]
impl From<sqlx::Error> for CatalogError {
    fn from(err: sqlx::Error) -> Self {
        use sqlx::Error as E;
        match err {
            E::PoolTimedOut => Self::store_unavailable("Connection pool timed out"),
            E::PoolClosed => Self::store_unavailable("Connection pool is closed"),
            E::WorkerCrashed => Self::store_unavailable("Database worker crashed"),
            E::Io(e) => Self::store_unavailable(e.to_string()),
            E::Tls(e) => Self::store_unavailable(format!("TLS error: {}", e)),
            E::Database(db_err) => {
                let code = db_err.code().map(|c| c.into_owned()).unwrap_or_default();
                if CONFLICT_STATES.contains(&code.as_str()) {
                    Self::conflicting_state(db_err.message())
                } else if code.starts_with("22") {
                    // data exception: the store rejected a bound value
                    tracing::debug!(sqlstate = %code, "Store rejected a value: {}", db_err.message());
                    let mut error = Self::new(
                        CatalogOperation::Execute,
                        CatalogErrorKind::ValidationFailed,
                        STORE_REJECTED_MESSAGE,
                    );
                    if let Some(column) = db_err
                        .try_downcast_ref::<sqlx::postgres::PgDatabaseError>()
                        .and_then(|pg| pg.column())
                    {
                        error.field_errors.push(FieldError::rejected_by_store(column));
                    }
                    error
                } else {
                    Self::unexpected(format!("[{}] {}", code, db_err))
                }
            }
            other => Self::unexpected(other.to_string()),
        }
    }
}
