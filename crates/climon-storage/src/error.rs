/// Errors that can occur within the storage layer.
///
/// # Examples
///
/// ```rust
/// use climon_storage::error::StorageError;
///
/// let err = StorageError::InvalidColumn {
///     column: "status",
///     value: "sleeping".to_string(),
/// };
/// assert!(err.to_string().contains("status"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// An underlying SQLite error.
    #[error("Storage: SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// JSON serialization or deserialization failure (the alert `data` column).
    #[error("Storage: JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The database directory could not be created.
    #[error("Storage: I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored timestamp is not valid RFC 3339.
    #[error("Storage: invalid timestamp in column '{column}': {source}")]
    InvalidTimestamp {
        column: &'static str,
        source: chrono::ParseError,
    },

    /// A column held a value outside its enumerated domain.
    #[error("Storage: invalid value in column '{column}': {value}")]
    InvalidColumn { column: &'static str, value: String },
}

/// Convenience `Result` alias for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;
