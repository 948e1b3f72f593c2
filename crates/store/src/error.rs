//! Store error model and sqlx error mapping.
//!
//! SQLx errors are mapped as follows:
//!
//! | PostgreSQL error code | Meaning              | Mapped to                 |
//! |-----------------------|----------------------|---------------------------|
//! | `23505`               | unique violation     | `Domain(Conflict)` at the call site (the caller knows which key) |
//! | `23503`               | foreign key violation| `Domain(Conflict)` at the call site |
//! | anything else         | backend failure      | `Backend`                 |

use comercio_core::DomainError;
use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

/// Error returned by every store operation.
///
/// Domain failures keep their kind all the way to the HTTP layer; only
/// genuine backend trouble collapses into `Backend`.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Deterministic domain failure (validation, business rule, conflict,
    /// not-found, auth).
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// A stored row could not be decoded into its domain type.
    #[error("corrupt row: {0}")]
    Decode(String),

    /// The backend itself failed (connection, constraint we did not map,
    /// transaction machinery).
    #[error("storage backend failure during {operation}")]
    Backend {
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },
}

impl StoreError {
    pub fn backend(operation: &'static str, source: sqlx::Error) -> Self {
        Self::Backend { operation, source }
    }
}

/// True when the error is a PostgreSQL unique constraint violation (23505).
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

/// True when the error is a PostgreSQL foreign key violation (23503).
pub fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23503"))
}
