//! Error types for tablekit

use thiserror::Error;

/// Result type alias for tablekit operations
pub type OrmResult<T> = Result<T, OrmError>;

/// Error types for table helper operations
#[derive(Debug, Error)]
pub enum OrmError {
    /// A required argument was missing or invalid (e.g. an entity without its id)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Construction-time or invariant violation
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// A query expected at most one row (or exactly one after an insert)
    #[error("Incorrect row count (expected {expected}, got {actual}): {message}")]
    IncorrectRowCount {
        expected: usize,
        actual: usize,
        message: String,
    },

    /// A mutating statement affected fewer rows than required
    #[error("Too few rows affected (expected {expected}, got {actual}): {message}")]
    TooFewRowsAffected {
        expected: u64,
        actual: u64,
        message: String,
    },

    /// Generic statement/row access failure reported by an executor
    #[error("Data access error: {0}")]
    DataAccess(String),

    /// Query execution error from the Postgres driver
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Pool error
    #[cfg(feature = "pool")]
    #[error("Pool error: {0}")]
    Pool(String),
}

impl OrmError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    pub fn data_access(message: impl Into<String>) -> Self {
        Self::DataAccess(message.into())
    }

    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    pub fn incorrect_row_count(expected: usize, actual: usize, message: impl Into<String>) -> Self {
        Self::IncorrectRowCount {
            expected,
            actual,
            message: message.into(),
        }
    }

    pub fn too_few_rows_affected(expected: u64, actual: u64, message: impl Into<String>) -> Self {
        Self::TooFewRowsAffected {
            expected,
            actual,
            message: message.into(),
        }
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }

    pub fn is_invalid_state(&self) -> bool {
        matches!(self, Self::InvalidState(_))
    }

    pub fn is_incorrect_row_count(&self) -> bool {
        matches!(self, Self::IncorrectRowCount { .. })
    }

    pub fn is_too_few_rows_affected(&self) -> bool {
        matches!(self, Self::TooFewRowsAffected { .. })
    }

    /// Whether this error came from statement execution or row reading.
    pub fn is_data_access(&self) -> bool {
        matches!(
            self,
            Self::DataAccess(_) | Self::Query(_) | Self::Decode { .. }
        )
    }

    /// Parse a tokio_postgres error, attaching constraint details when present.
    pub fn from_db_error(err: tokio_postgres::Error) -> Self {
        if let Some(db_err) = err.as_db_error() {
            let constraint = db_err.constraint().unwrap_or("unknown");
            return Self::DataAccess(format!(
                "{} ({}): {}",
                db_err.code().code(),
                constraint,
                db_err.message()
            ));
        }
        Self::Query(err)
    }
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::PoolError> for OrmError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}
