//! Error types for the database layer
//!
//! This module defines all error types that can occur while compiling,
//! executing or migrating statements.

/// Result type alias for database operations
pub type Result<T> = std::result::Result<T, DatabaseError>;

/// Error types for database operations
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    /// A statement could not be compiled (missing component, arity mismatch, ...)
    #[error("Compilation error: {0}")]
    Compilation(String),

    /// The grammar does not know how to compile this statement kind
    #[error("Unsupported SQL {0}")]
    UnsupportedStatement(String),

    /// The statement kind was handed to the wrong handler operation
    #[error("Invalid statement: {0}")]
    InvalidStatement(String),

    /// Query execution error
    #[error("Query execution error: {0}")]
    QueryError(String),

    /// Query timeout
    #[error("Query timeout after {timeout_ms}ms")]
    QueryTimeout { timeout_ms: u64 },

    /// No link is open for the database
    #[error("Connection to database {0} isn't open")]
    NotConnected(String),

    /// Required configuration is missing or malformed
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Named database was never registered
    #[error("Database not found: {0}")]
    DatabaseNotFound(String),

    /// Type conversion error
    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    /// Migration error
    #[error("Migration error: {0}")]
    Migration(String),

    /// Configuration parse error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// SQLite error
    #[cfg(feature = "sqlite")]
    #[error("SQLite error: {0}")]
    SqliteError(#[from] rusqlite::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl DatabaseError {
    /// Create a new compilation error
    pub fn compilation<S: Into<String>>(msg: S) -> Self {
        DatabaseError::Compilation(msg.into())
    }

    /// Create an unsupported statement error for the given kind name
    pub fn unsupported<S: Into<String>>(kind: S) -> Self {
        DatabaseError::UnsupportedStatement(kind.into())
    }

    /// Create an invalid statement error
    pub fn invalid_statement<S: Into<String>>(msg: S) -> Self {
        DatabaseError::InvalidStatement(msg.into())
    }

    /// Create a new query error
    pub fn query<S: Into<String>>(msg: S) -> Self {
        DatabaseError::QueryError(msg.into())
    }

    /// Create a query timeout error
    pub fn query_timeout(timeout_ms: u64) -> Self {
        DatabaseError::QueryTimeout { timeout_ms }
    }

    /// Create a new configuration error
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        DatabaseError::Configuration(msg.into())
    }

    /// Create a new type mismatch error
    pub fn type_mismatch(expected: &str, actual: &str) -> Self {
        DatabaseError::TypeMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Create a new migration error
    pub fn migration<S: Into<String>>(msg: S) -> Self {
        DatabaseError::Migration(msg.into())
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        DatabaseError::Other(msg.into())
    }

    /// Whether this error was raised by the compiler before execution
    pub fn is_compilation(&self) -> bool {
        matches!(
            self,
            DatabaseError::Compilation(_) | DatabaseError::UnsupportedStatement(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = DatabaseError::compilation("Undefined table");
        assert!(matches!(err, DatabaseError::Compilation(_)));
        assert!(err.is_compilation());

        let err = DatabaseError::query("Invalid SQL");
        assert!(matches!(err, DatabaseError::QueryError(_)));
        assert!(!err.is_compilation());

        let err = DatabaseError::type_mismatch("date", "bytes");
        assert!(matches!(err, DatabaseError::TypeMismatch { .. }));
    }

    #[test]
    fn test_error_display() {
        let err = DatabaseError::compilation("Can't create offset without limit");
        assert_eq!(
            err.to_string(),
            "Compilation error: Can't create offset without limit"
        );

        let err = DatabaseError::unsupported("DROP");
        assert_eq!(err.to_string(), "Unsupported SQL DROP");

        let err = DatabaseError::type_mismatch("i64", "f64");
        assert_eq!(err.to_string(), "Type mismatch: expected i64, got f64");
    }

    #[test]
    fn test_source_conversions() {
        fn parse(json: &str) -> Result<serde_json::Value> {
            Ok(serde_json::from_str(json)?)
        }

        let err = parse("{").unwrap_err();
        assert!(matches!(err, DatabaseError::JsonError(_)));
        assert!(err.to_string().starts_with("JSON error: "));

        #[cfg(feature = "sqlite")]
        {
            let err = DatabaseError::from(rusqlite::Error::QueryReturnedNoRows);
            assert!(matches!(err, DatabaseError::SqliteError(_)));
        }
    }
}
