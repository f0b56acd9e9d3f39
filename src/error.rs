//! Error types for the data-management core.

use thiserror::Error;

use crate::services::database::traits::DatabaseType;

/// Errors observable by callers of the core (drivers, registry, transfer engines, config).
#[derive(Error, Debug)]
pub enum DataError {
    /// An operation was issued while no driver is connected.
    #[error("not connected to any database")]
    NotConnected,

    /// The dialect tag is not one this build knows about.
    #[error("unsupported database type: {0}")]
    UnsupportedDialect(String),

    /// The dialect is known but its driver is not compiled into this build.
    #[error("{0} is not available on this platform (rebuild with the `odbc` feature)")]
    UnsupportedOnPlatform(DatabaseType),

    /// Transport, authentication or ping failure while connecting.
    #[error("failed to connect to {dialect}: {message}")]
    ConnectFailed {
        dialect: DatabaseType,
        message: String,
    },

    /// The registry already holds a live connection.
    #[error("already connected to {0}; disconnect first")]
    AlreadyConnected(String),

    /// A driver has already been torn down and cannot be reused.
    #[error("connection already closed")]
    Closed,

    /// Query returned a driver error (message preserved verbatim).
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// Statement execution returned a driver error (message preserved verbatim).
    #[error("execute failed: {0}")]
    ExecuteFailed(String),

    /// The table does not exist or has no columns.
    #[error("table {0} does not exist or has no columns")]
    TableNotFound(String),

    #[error("file not found: {0}")]
    FileNotFound(String),

    /// The file could not be decoded as the requested format.
    #[error("file format error: {0}")]
    FileFormat(String),

    #[error("table {0} has no primary key - upsert mode requires one")]
    UpsertNeedsPrimaryKey(String),

    #[error("upsert mode requires the primary key column {0} in the file headers")]
    PrimaryKeyColumnMissingInFile(String),

    /// The persisted default connection does not exist.
    #[error("no default config")]
    NoDefaultConfig,

    /// The persisted default connection exists but cannot be used.
    #[error("config is corrupt: {0}")]
    ConfigCorrupt(String),

    /// Malformed user input (bad config key, bad port, ...).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The line editor failed to read from the terminal.
    #[error("terminal error: {0}")]
    Terminal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Spreadsheet reader or writer failure.
    #[error("XLSX error: {0}")]
    Xlsx(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DataError {
    /// Create a ConnectFailed error for a dialect.
    pub fn connect(dialect: DatabaseType, message: impl ToString) -> Self {
        DataError::ConnectFailed {
            dialect,
            message: message.to_string(),
        }
    }

    pub fn query(err: impl ToString) -> Self {
        DataError::QueryFailed(err.to_string())
    }

    pub fn execute(err: impl ToString) -> Self {
        DataError::ExecuteFailed(err.to_string())
    }

    pub fn format(message: impl Into<String>) -> Self {
        DataError::FileFormat(message.into())
    }
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, DataError>;
