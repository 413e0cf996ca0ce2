//! Dispatch error types.

use common::{AggregateId, UserId};
use domain::DomainError;
use event_store::EventStoreError;
use thiserror::Error;

use crate::services::directory::Role;

/// Errors that can occur at the dispatch boundary.
///
/// Claim races collapse here: losing the conditional append and loading
/// a job another agent already holds are both reported as
/// [`DispatchError::ClaimConflict`].
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Order not found.
    #[error("Order not found: {0}")]
    OrderNotFound(AggregateId),

    /// Delivery job not found.
    #[error("Delivery job not found: {0}")]
    JobNotFound(AggregateId),

    /// Another agent won the claim on this job.
    #[error("Delivery job {job_id} was claimed by another agent")]
    ClaimConflict { job_id: AggregateId },

    /// The caller does not hold the role the operation requires.
    #[error("User {user_id} does not hold the {required} role")]
    PermissionDenied { user_id: UserId, required: Role },

    /// Notification recipient unknown to the user directory.
    #[error("Unknown notification recipient: {user_id}")]
    UnknownRecipient { user_id: UserId },

    /// Domain error.
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// Event store error.
    #[error("Event store error: {0}")]
    EventStore(#[from] EventStoreError),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience type alias for dispatch results.
pub type Result<T> = std::result::Result<T, DispatchError>;
