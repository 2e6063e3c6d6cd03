//! Error types for zenbali storage.

use zenbali_core::MarketError;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(String),

    /// A stored value could not be decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Record not found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of record, e.g. `"event"`.
        entity: &'static str,
        /// Key that was looked up.
        id: String,
    },

    /// A foreign key points at a row that does not exist.
    #[error("invalid reference: {0}")]
    InvalidReference(String),

    /// A unique constraint was violated.
    #[error("conflict: {0}")]
    Conflict(String),
}

impl StoreError {
    /// Shorthand for a `NotFound` error.
    #[must_use]
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_foreign_key_violation() {
                return Self::InvalidReference(
                    db_err.constraint().unwrap_or("foreign key").to_string(),
                );
            }
            if db_err.is_unique_violation() {
                return Self::Conflict(db_err.constraint().unwrap_or("unique").to_string());
            }
        }
        if let sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) = &err {
            return Self::Serialization(err.to_string());
        }
        Self::Database(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for StoreError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        Self::Database(format!("migration failed: {err}"))
    }
}

impl From<StoreError> for MarketError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity: "event", id } => Self::EventNotFound { event_id: id },
            StoreError::NotFound {
                entity: "payment",
                id,
            } => Self::PaymentNotFound { session_id: id },
            StoreError::NotFound {
                entity: "creator",
                id,
            } => Self::CreatorNotFound { creator_id: id },
            StoreError::NotFound { entity, id } => Self::ReferenceNotFound {
                kind: entity.to_string(),
                id,
            },
            StoreError::InvalidReference(what) => Self::InvalidReference(what),
            StoreError::Conflict(what) => Self::Duplicate(what),
            StoreError::Serialization(msg) => Self::Serialization(msg),
            StoreError::Database(msg) => Self::Storage(msg),
        }
    }
}
