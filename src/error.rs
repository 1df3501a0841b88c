use thiserror::Error;
use uuid::Uuid;

use crate::models::RideStatus;

/// Error taxonomy for dispatch operations.
///
/// Conflict-class errors (`ClaimConflict`, `IllegalTransition`) mean the
/// caller raced against another mutation: refresh state before retrying the
/// workflow, never the identical call. Transient errors (`Storage`,
/// `External`) are safe to retry with backoff.
#[derive(Debug, Error)]
pub enum RideError {
    #[error("not authenticated")]
    Unauthenticated,

    #[error("missing or invalid required fields: {}", .0.join(", "))]
    Validation(Vec<String>),

    #[error("ride is no longer available to claim")]
    ClaimConflict,

    #[error("illegal transition from {from:?} to {to:?}")]
    IllegalTransition { from: RideStatus, to: RideStatus },

    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: Uuid },

    #[error("external service failure: {0}")]
    External(String),

    #[error("storage failure: {0}")]
    Storage(#[from] sqlx::Error),
}

impl RideError {
    pub fn not_found(kind: &'static str, id: Uuid) -> Self {
        RideError::NotFound { kind, id }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            RideError::ClaimConflict | RideError::IllegalTransition { .. }
        )
    }

    /// Transient failures may be retried; conflicts and validation must not.
    pub fn is_transient(&self) -> bool {
        matches!(self, RideError::Storage(_) | RideError::External(_))
    }
}
