use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Entity not found: {entity} with key '{key}'")]
    KeyNotFound { entity: &'static str, key: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    /// A state-machine guard rejected the requested transition. The message
    /// always names the precondition that was not met.
    #[error("Invalid state transition: {0}")]
    InvalidTransition(String),

    #[error("Daily ticket limit reached (maximum {max} tickets per day)")]
    CapacityExceeded { max: i64 },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
