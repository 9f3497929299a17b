use thiserror::Error;

use crate::data::DataError;

pub type Result<T> = std::result::Result<T, NavError>;

/// Errors surfaced by planning, movement and probe operations.
///
/// A blocked autopilot is not an error; see [`crate::movement::AutopilotState`].
#[derive(Debug, Error)]
pub enum NavError {
    /// Malformed coordinates, unknown directions or inconsistent steps.
    #[error("validation error: {0}")]
    Validation(String),

    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },

    /// A precondition on a consumable (fuel, probes) was not met.
    #[error("insufficient {resource}: have {available}, need {required}")]
    InsufficientResource {
        resource: &'static str,
        available: u32,
        required: u32,
    },

    #[error("internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Data(#[from] DataError),
}

impl NavError {
    pub fn validation(message: impl Into<String>) -> Self {
        NavError::Validation(message.into())
    }

    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        NavError::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// Short machine-readable label, used in response payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            NavError::Validation(_) => "validation",
            NavError::NotFound { .. } => "not_found",
            NavError::InsufficientResource { .. } => "insufficient_resource",
            NavError::Internal(_) | NavError::Data(_) => "internal",
        }
    }
}
