use diesel::r2d2;
use thiserror::Error;

use ledgerlink_core::errors::{DatabaseError, Error};

/// Failures raised inside the SQLite layer before they cross into the domain.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Query failed: {0}")]
    Query(#[from] diesel::result::Error),

    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::PoolError),

    #[error("Connection error: {0}")]
    Connection(#[from] diesel::ConnectionError),

    #[error("Migration failed: {0}")]
    Migration(String),

    /// A stored column could not be decoded into its domain type.
    #[error("Invalid stored value in {column}: {value}")]
    InvalidData { column: &'static str, value: String },
}

impl StorageError {
    pub fn invalid_data(column: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidData {
            column,
            value: value.into(),
        }
    }
}

impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        let db_err = match err {
            StorageError::Query(e) => DatabaseError::QueryFailed(e.to_string()),
            StorageError::Pool(e) => DatabaseError::ConnectionFailed(e.to_string()),
            StorageError::Connection(e) => DatabaseError::ConnectionFailed(e.to_string()),
            StorageError::Migration(msg) => DatabaseError::MigrationFailed(msg),
            e @ StorageError::InvalidData { .. } => DatabaseError::Internal(e.to_string()),
        };
        Error::Database(db_err)
    }
}
