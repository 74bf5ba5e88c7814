//! Error types for the DB tools MCP server.
//!
//! Every failure inside a tool handler is a [`DbError`]. The tool boundary
//! turns it into the uniform response envelope together with the numeric
//! [`ErrorCode`] callers rely on.

use serde::Serialize;
use thiserror::Error;

/// Numeric error codes surfaced in the response envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(i32)]
pub enum ErrorCode {
    ConnectionFailed = 1001,
    QueryExecutionFailed = 1002,
    DangerousOperation = 1003,
    InvalidParameters = 1004,
    ConfigurationError = 1005,
    UnknownError = 9999,
}

impl ErrorCode {
    /// Integer value written to `errorCode`.
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Connection failed: {message}")]
    Connection { message: String, suggestion: String },

    #[error("Query execution failed: {message}")]
    QueryExecution {
        message: String,
        /// e.g., "42P01" for undefined table
        sql_state: Option<String>,
    },

    #[error(
        "Dangerous operation detected ({operation}). Use the dedicated schema tools for structural changes."
    )]
    DangerousOperation { operation: String },

    #[error("Invalid parameters: {message}")]
    InvalidParameters { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("{operation} is not supported for {engine}")]
    Unsupported { operation: String, engine: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DbError {
    /// Create a connection error with a helpful suggestion.
    pub fn connection(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Create a query execution error with optional SQL state.
    pub fn query_execution(message: impl Into<String>, sql_state: Option<String>) -> Self {
        Self::QueryExecution {
            message: message.into(),
            sql_state,
        }
    }

    /// Create a dangerous operation rejection.
    pub fn dangerous_operation(operation: impl Into<String>) -> Self {
        Self::DangerousOperation {
            operation: operation.into(),
        }
    }

    /// Create an invalid parameters error.
    pub fn invalid_parameters(message: impl Into<String>) -> Self {
        Self::InvalidParameters {
            message: message.into(),
        }
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an unsupported operation error.
    pub fn unsupported(operation: impl Into<String>, engine: impl Into<String>) -> Self {
        Self::Unsupported {
            operation: operation.into(),
            engine: engine.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Error code reported to callers.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Connection { .. } => ErrorCode::ConnectionFailed,
            Self::QueryExecution { .. } | Self::Unsupported { .. } => {
                ErrorCode::QueryExecutionFailed
            }
            Self::DangerousOperation { .. } => ErrorCode::DangerousOperation,
            Self::InvalidParameters { .. } => ErrorCode::InvalidParameters,
            Self::Configuration { .. } => ErrorCode::ConfigurationError,
            Self::Internal { .. } => ErrorCode::UnknownError,
        }
    }

    /// Message placed in the envelope's `error` field.
    ///
    /// Connection errors carry their suggestion; database errors carry the
    /// SQLSTATE when the driver reported one.
    pub fn envelope_message(&self) -> String {
        match self {
            Self::Connection { suggestion, .. } if !suggestion.is_empty() => {
                format!("{}. {}", self, suggestion)
            }
            Self::QueryExecution {
                sql_state: Some(code),
                ..
            } => format!("{} (SQLSTATE: {})", self, code),
            _ => self.to_string(),
        }
    }

    /// Re-classify any failure as a connection failure (used by the probe).
    pub fn into_connection_failure(self) -> Self {
        match self {
            Self::Connection { .. } | Self::Configuration { .. } => self,
            other => Self::connection(
                other.to_string(),
                "Check that the database server is reachable and the credentials are valid",
            ),
        }
    }
}

/// Convert sqlx errors to DbError.
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Configuration(msg) => DbError::configuration(format!(
                "Invalid connection settings: {}",
                msg
            )),
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|c| c.to_string());
                DbError::query_execution(db_err.message(), code)
            }
            sqlx::Error::RowNotFound => DbError::query_execution("No rows returned", None),
            sqlx::Error::PoolTimedOut => DbError::connection(
                "Timed out waiting for a database connection",
                "Check that the database server is running and accepting connections",
            ),
            sqlx::Error::PoolClosed => {
                DbError::connection("Connection pool is closed", "Retry the tool call")
            }
            sqlx::Error::Io(io_err) => DbError::connection(
                format!("I/O error: {}", io_err),
                "Check network connectivity and database server status",
            ),
            sqlx::Error::Tls(tls_err) => DbError::connection(
                format!("TLS error: {}", tls_err),
                "Verify TLS configuration and certificates",
            ),
            sqlx::Error::Protocol(msg) => DbError::connection(
                format!("Protocol error: {}", msg),
                "Check database server compatibility",
            ),
            sqlx::Error::TypeNotFound { type_name } => {
                DbError::query_execution(format!("Type not found: {}", type_name), None)
            }
            sqlx::Error::ColumnNotFound(col) => {
                DbError::query_execution(format!("Column not found: {}", col), None)
            }
            sqlx::Error::ColumnIndexOutOfBounds { index, len } => DbError::query_execution(
                format!("Column index {} out of bounds (len: {})", index, len),
                None,
            ),
            sqlx::Error::ColumnDecode { index, source } => DbError::query_execution(
                format!("Failed to decode column {}: {}", index, source),
                None,
            ),
            sqlx::Error::Decode(source) => {
                DbError::query_execution(format!("Decode error: {}", source), None)
            }
            sqlx::Error::AnyDriverError(err) => DbError::connection(
                format!("Driver error: {}", err),
                "Check database driver configuration",
            ),
            sqlx::Error::WorkerCrashed => DbError::internal("Database worker crashed"),
            _ => DbError::internal(format!("Unknown database error: {}", err)),
        }
    }
}

/// Malformed JSON arguments are the caller's fault.
impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        DbError::invalid_parameters(format!("Malformed JSON: {}", err))
    }
}

/// Result type alias for database operations.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DbError::connection("Failed to connect", "Check credentials");
        assert!(err.to_string().contains("Connection failed"));
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            DbError::connection("x", "y").code(),
            ErrorCode::ConnectionFailed
        );
        assert_eq!(
            DbError::query_execution("x", None).code().as_i32(),
            1002
        );
        assert_eq!(DbError::dangerous_operation("DROP TABLE").code().as_i32(), 1003);
        assert_eq!(DbError::invalid_parameters("x").code().as_i32(), 1004);
        assert_eq!(DbError::configuration("x").code().as_i32(), 1005);
        assert_eq!(DbError::internal("x").code().as_i32(), 9999);
    }

    #[test]
    fn test_unsupported_is_execution_failure() {
        let err = DbError::unsupported("Stored procedures", "Sqlite");
        assert_eq!(err.code(), ErrorCode::QueryExecutionFailed);
        assert_eq!(err.to_string(), "Stored procedures is not supported for Sqlite");
    }

    #[test]
    fn test_envelope_message_includes_sql_state() {
        let err = DbError::query_execution("syntax error", Some("42601".to_string()));
        assert!(err.envelope_message().contains("42601"));
    }

    #[test]
    fn test_envelope_message_includes_suggestion() {
        let err = DbError::connection("refused", "Start the server");
        assert_eq!(
            err.envelope_message(),
            "Connection failed: refused. Start the server"
        );
    }

    #[test]
    fn test_pool_timeout_maps_to_connection() {
        let err: DbError = sqlx::Error::PoolTimedOut.into();
        assert_eq!(err.code(), ErrorCode::ConnectionFailed);
    }

    #[test]
    fn test_row_not_found_maps_to_execution() {
        let err: DbError = sqlx::Error::RowNotFound.into();
        assert_eq!(err.code(), ErrorCode::QueryExecutionFailed);
    }

    #[test]
    fn test_json_error_maps_to_invalid_parameters() {
        let err: DbError = serde_json::from_str::<serde_json::Value>("{oops")
            .unwrap_err()
            .into();
        assert_eq!(err.code(), ErrorCode::InvalidParameters);
    }

    #[test]
    fn test_into_connection_failure() {
        let err = DbError::query_execution("no such table", None).into_connection_failure();
        assert_eq!(err.code(), ErrorCode::ConnectionFailed);

        let err = DbError::configuration("missing").into_connection_failure();
        assert_eq!(err.code(), ErrorCode::ConfigurationError);
    }
}
