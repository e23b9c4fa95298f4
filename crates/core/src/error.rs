//! Domain error taxonomy.
//!
//! Input shape problems (`Validation`) are distinguished from unknown
//! entities (`NotFound`) and from ownership mismatches (`Ownership`) so
//! the API layer can log abuse separately from honest client bugs, even
//! though `Ownership` is deliberately surfaced to callers as a plain 404.

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Malformed input: wrong shape, length, or charset. Raised before
    /// any store lookup.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A well-formed identifier that does not match any entity.
    #[error("Entity not found: {entity} {id}")]
    NotFound { entity: &'static str, id: String },

    /// The entity exists but the caller's token triple does not own it.
    /// Surfaced to the caller as a 404 to avoid revealing which leg of
    /// the (job, runner token, job token) agreement failed.
    #[error("Ownership mismatch: {0}")]
    Ownership(String),

    /// The caller owns the entity but it is not in the required state
    /// for this operation.
    #[error("Invalid state: {0}")]
    StateConflict(String),

    /// Unique-constraint violation.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Missing or invalid credential.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but lacking the required right, or accessing media
    /// that belongs to another job.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Shorthand for a `NotFound` with any displayable id.
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        CoreError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}
