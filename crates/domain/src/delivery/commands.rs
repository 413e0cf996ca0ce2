//! Delivery job commands.

use common::{AggregateId, UserId};

use crate::command::Command;
use crate::order::Address;

use super::{DeliveryJob, JobStatus};

/// Command to create a delivery job for a confirmed order.
#[derive(Debug, Clone)]
pub struct CreateDeliveryJob {
    /// The job ID to create.
    pub job_id: AggregateId,

    /// The order this job delivers.
    pub order_id: AggregateId,

    /// The buyer awaiting the delivery.
    pub buyer_id: UserId,

    /// Where the agent collects the goods.
    pub pickup_address: Address,

    /// Where the agent delivers the goods.
    pub delivery_address: Address,

    /// Free-text note carried over from the order.
    pub notes: Option<String>,
}

impl CreateDeliveryJob {
    /// Creates a new CreateDeliveryJob command.
    pub fn new(
        job_id: AggregateId,
        order_id: AggregateId,
        buyer_id: UserId,
        pickup_address: Address,
        delivery_address: Address,
    ) -> Self {
        Self {
            job_id,
            order_id,
            buyer_id,
            pickup_address,
            delivery_address,
            notes: None,
        }
    }

    /// Creates a new CreateDeliveryJob command with a generated job ID.
    pub fn for_order(
        order_id: AggregateId,
        buyer_id: UserId,
        pickup_address: Address,
        delivery_address: Address,
    ) -> Self {
        Self::new(
            AggregateId::new(),
            order_id,
            buyer_id,
            pickup_address,
            delivery_address,
        )
    }

    /// Attaches a note to the job.
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

impl Command for CreateDeliveryJob {
    type Aggregate = DeliveryJob;

    fn aggregate_id(&self) -> AggregateId {
        self.job_id
    }
}

/// Command for an agent to claim a pending delivery job.
#[derive(Debug, Clone)]
pub struct ClaimDeliveryJob {
    /// The job to claim.
    pub job_id: AggregateId,

    /// The claiming agent.
    pub agent_id: UserId,
}

impl ClaimDeliveryJob {
    /// Creates a new ClaimDeliveryJob command.
    pub fn new(job_id: AggregateId, agent_id: UserId) -> Self {
        Self { job_id, agent_id }
    }
}

impl Command for ClaimDeliveryJob {
    type Aggregate = DeliveryJob;

    fn aggregate_id(&self) -> AggregateId {
        self.job_id
    }
}

/// Command to advance a claimed delivery job one step.
#[derive(Debug, Clone)]
pub struct AdvanceDeliveryJob {
    /// The job to advance.
    pub job_id: AggregateId,

    /// The agent reporting the transition.
    pub agent_id: UserId,

    /// The target status; must be the immediate successor.
    pub target: JobStatus,
}

impl AdvanceDeliveryJob {
    /// Creates a new AdvanceDeliveryJob command.
    pub fn new(job_id: AggregateId, agent_id: UserId, target: JobStatus) -> Self {
        Self {
            job_id,
            agent_id,
            target,
        }
    }
}

impl Command for AdvanceDeliveryJob {
    type Aggregate = DeliveryJob;

    fn aggregate_id(&self) -> AggregateId {
        self.job_id
    }
}
