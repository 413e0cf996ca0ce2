//! Delivery job aggregate and related types.

mod aggregate;
mod commands;
mod events;
mod service;
mod state;

pub use aggregate::DeliveryJob;
pub use commands::*;
pub use events::{
    DeliveryJobClaimedData, DeliveryJobCreatedData, DeliveryJobDeliveredData, DeliveryJobEvent,
    DeliveryJobInTransitData, DeliveryJobPickedUpData,
};
pub use service::DeliveryJobService;
pub use state::JobStatus;

use common::{AggregateId, UserId};
use thiserror::Error;

/// Errors that can occur during delivery job operations.
#[derive(Debug, Error)]
pub enum DeliveryJobError {
    /// Job has already been created.
    #[error("Delivery job already created")]
    AlreadyCreated,

    /// Job has not been created yet.
    #[error("Delivery job does not exist")]
    NotCreated,

    /// Job already carries an assigned agent.
    #[error("Delivery job {job_id} has already been claimed")]
    AlreadyClaimed { job_id: AggregateId },

    /// Caller is not the agent assigned to the job.
    #[error("Agent {agent_id} is not assigned to delivery job {job_id}")]
    NotAssignee {
        job_id: AggregateId,
        agent_id: UserId,
    },

    /// Target status is not the immediate successor.
    #[error("Invalid transition: cannot move from {from} to {to}")]
    InvalidTransition { from: JobStatus, to: JobStatus },

    /// Job is in a terminal status.
    #[error("Delivery job is already {status}, no further transitions allowed")]
    TerminalState { status: JobStatus },
}
