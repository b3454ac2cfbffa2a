//! Error types for the storage layer.

/// Errors that can occur while talking to the embedded database.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Driver error: unopenable file, constraint violation, malformed SQL.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A statement was issued before `connect()` completed.
    #[error("Storage is not connected")]
    NotConnected,

    /// A table or column name is not a plain SQL identifier.
    #[error("Invalid identifier: '{0}'")]
    InvalidIdentifier(String),

    /// The WHERE fragment and its arguments disagree on parameter count.
    #[error("WHERE clause has {placeholders} placeholder(s) but {arguments} argument(s) were supplied")]
    PlaceholderMismatch {
        /// Number of `?` tokens found in the fragment.
        placeholders: usize,
        /// Number of arguments supplied by the caller.
        arguments: usize,
    },

    /// INSERT columns and values are not positionally paired.
    #[error("INSERT has {columns} column(s) but {values} value(s)")]
    ColumnValueMismatch {
        /// Number of column names.
        columns: usize,
        /// Number of values.
        values: usize,
    },

    /// UPDATE was called without any column to set.
    #[error("UPDATE requires at least one column to set")]
    EmptyUpdate,

    /// Reconciling a table's schema failed during `connect()`.
    #[error("Failed to reconcile table '{table}': {source}")]
    Reconcile {
        /// The table whose reconciliation failed.
        table: String,
        /// The underlying failure.
        #[source]
        source: Box<StorageError>,
    },

    /// Invalid configuration (bad database URL, unreadable config file).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Two catalog entries share an identifier.
    #[error("Duplicate identifier: {0}")]
    DuplicateId(String),

    /// A result row is missing a column or holds the wrong type.
    #[error("Row decode error: {0}")]
    Decode(String),

    /// A row expected to exist was not found.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl StorageError {
    /// Wraps an error raised while reconciling `table`.
    pub(crate) fn reconcile(table: &str, source: Self) -> Self {
        Self::Reconcile {
            table: table.to_string(),
            source: Box::new(source),
        }
    }
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;
