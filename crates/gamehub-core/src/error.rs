//! Domain error types.

use thiserror::Error;

/// Top-level domain error type.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A requested record does not exist (or is not visible).
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of record that was looked up.
        entity: &'static str,
        /// The identifier that was looked up.
        id: i64,
    },

    /// Optimistic concurrency conflict on a progress row.
    #[error("concurrency conflict on progress row {id}: expected version {expected}, found {actual}")]
    ConcurrencyConflict {
        /// The progress row that had the conflict.
        id: i64,
        /// The version the writer read.
        expected: i64,
        /// The version found at write time.
        actual: i64,
    },

    /// A validation error in domain logic or request input.
    #[error("validation error: {0}")]
    Validation(String),

    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

impl DomainError {
    /// Shorthand for a missing achievement definition.
    #[must_use]
    pub fn achievement_not_found(id: i64) -> Self {
        Self::NotFound {
            entity: "achievement",
            id,
        }
    }
}
