//! Database-specific error types and conversions.

use lyceum_core::error::LyceumError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("query failed: {0}")]
    Query(String),

    #[error("migration failed: {0}")]
    Migration(String),

    #[error("record not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },
}

impl From<DbError> for LyceumError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => LyceumError::NotFound { entity, id },
            other => LyceumError::Database(other.to_string()),
        }
    }
}
