//! Error types for the database client

use studyslot_common::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("Database error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Database configuration error: {0}")]
    ConfigError(String),

    #[error("Database pool error: {0}")]
    PoolError(String),

    #[error("Database query error: {0}")]
    QueryError(String),

    /// A stored value could not be read back into the domain model
    #[error("Corrupt row: {0}")]
    DecodeError(String),
}

impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        StoreError::Backend(err.to_string())
    }
}

/// Whether `err` is a UNIQUE constraint violation.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => {
            db.is_unique_violation() || db.message().contains("UNIQUE constraint failed")
        }
        _ => false,
    }
}
