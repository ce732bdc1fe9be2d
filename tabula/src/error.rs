//! Error types for the Tabula engine.
//!
//! Errors follow three families: metadata failures while enumerating tables and
//! columns, query failures while executing a generated statement, and the
//! input/configuration problems that prevent a statement from being built at all.
//! Values that fail to parse as numbers are *not* errors; see [`crate::numeric`].

use thiserror::Error;

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, TabulaError>;

/// Errors that can occur while querying a dataset.
#[derive(Error, Debug)]
pub enum TabulaError {
    /// Table or column enumeration failed.
    #[error("Metadata query failed: {0}")]
    Metadata(String),

    /// A generated filter/sort/aggregate statement failed.
    #[error("Query execution failed: {0}")]
    Query(#[from] rusqlite::Error),

    /// The requested table does not exist in the dataset.
    #[error("Table not found: '{0}'")]
    TableNotFound(String),

    /// A request named a column the table does not have.
    #[error("Column not found: '{column}' in table '{table}'")]
    ColumnNotFound { table: String, column: String },

    /// An identifier or input value was rejected before reaching the store.
    #[error("Security error: {0}")]
    SecurityError(String),

    /// Invalid engine configuration.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// I/O failure while opening the dataset or writing an export.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV encoding failure.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON (de)serialization failure.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal failure (task join, poisoned pool, ...).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl TabulaError {
    /// Creates a metadata error with the given message.
    pub fn metadata(msg: impl Into<String>) -> Self {
        Self::Metadata(msg.into())
    }

    pub fn column_not_found(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::ColumnNotFound {
            table: table.into(),
            column: column.into(),
        }
    }

    /// Creates a configuration error with the given message.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns true if the error came from schema enumeration or a name lookup.
    pub fn is_metadata(&self) -> bool {
        matches!(
            self,
            Self::Metadata(_) | Self::TableNotFound(_) | Self::ColumnNotFound { .. }
        )
    }
}

/// Extension trait for attaching context to fallible results.
pub trait ErrorContext<T> {
    /// Reclassifies the error as a metadata error prefixed with `context`.
    fn metadata_context(self, context: impl AsRef<str>) -> Result<T>;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: std::fmt::Display,
{
    fn metadata_context(self, context: impl AsRef<str>) -> Result<T> {
        self.map_err(|e| TabulaError::metadata(format!("{}: {e}", context.as_ref())))
    }
}
