//! Store-specific error types and conversions.

use quill_core::error::CoreError;

/// Store-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Unique constraint violated: {entity}")]
    Duplicate { entity: String },

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => CoreError::NotFound { entity, id },
            StoreError::Duplicate { entity } => CoreError::AlreadyExists { entity },
            StoreError::Unavailable(msg) => CoreError::Unavailable(msg),
            other => CoreError::Store(other.to_string()),
        }
    }
}
