//! Error types shared by every LedgerLink crate.

use thiserror::Error;

use crate::provider::ProviderError;

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error for the domain and sync engine.
#[derive(Debug, Error)]
pub enum Error {
    /// Storage layer failure
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// No connection exists with the requested id
    #[error("Connection not found")]
    ConnectionNotFound { connection_id: String },

    /// Connection was explicitly disconnected and can no longer be synced
    #[error("Connection is disconnected")]
    ConnectionDisconnected { connection_id: String },

    /// Single insert collided with an existing external transaction id
    #[error("Duplicate transaction with external id: {external_id}")]
    DuplicateTransaction { external_id: String },

    /// Provider failure that was not retried
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Transient provider failure that persisted through every retry
    #[error("Transient provider error persisted after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: ProviderError,
    },

    /// Invalid input or provider payload
    #[error("Validation error: {0}")]
    Validation(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Storage failures, independent of the underlying engine.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Failed to acquire database connection: {0}")]
    ConnectionFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl Error {
    pub fn connection_not_found(connection_id: impl Into<String>) -> Self {
        Self::ConnectionNotFound {
            connection_id: connection_id.into(),
        }
    }

    pub fn connection_disconnected(connection_id: impl Into<String>) -> Self {
        Self::ConnectionDisconnected {
            connection_id: connection_id.into(),
        }
    }

    pub fn duplicate_transaction(external_id: impl Into<String>) -> Self {
        Self::DuplicateTransaction {
            external_id: external_id.into(),
        }
    }

    /// True for failures raised before any provider call or state change.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::ConnectionNotFound { .. } | Self::ConnectionDisconnected { .. }
        )
    }
}
