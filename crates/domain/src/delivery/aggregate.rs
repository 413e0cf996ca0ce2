//! Delivery job aggregate implementation.

use chrono::{DateTime, Utc};
use common::{AggregateId, UserId};
use event_store::Version;
use serde::{Deserialize, Serialize};

use crate::aggregate::{Aggregate, SnapshotCapable};
use crate::order::Address;

use super::{
    DeliveryJobError, DeliveryJobEvent, JobStatus,
    events::{
        DeliveryJobClaimedData, DeliveryJobCreatedData, DeliveryJobDeliveredData,
        DeliveryJobInTransitData, DeliveryJobPickedUpData,
    },
};

/// Delivery job aggregate root.
///
/// One job transports one order from the seller's pickup address to the
/// buyer's delivery address. A job starts unassigned in the pending
/// pool; exactly one agent ever claims it, then walks it through
/// picked_up and in_transit to delivered.
///
/// Claim validation happens here, but the at-most-one-winner guarantee
/// comes from the conditional append on the job's event stream: two
/// agents racing on the same version produce one persisted claim and
/// one concurrency conflict.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeliveryJob {
    /// Unique job identifier.
    id: Option<AggregateId>,

    /// Current version for optimistic concurrency.
    #[serde(default)]
    version: Version,

    /// The order this job delivers.
    order_id: Option<AggregateId>,

    /// The buyer awaiting the delivery.
    buyer_id: Option<UserId>,

    /// Where the agent collects the goods.
    pickup_address: Address,

    /// Where the agent delivers the goods.
    delivery_address: Address,

    /// The agent holding the job, once claimed.
    assigned_agent_id: Option<UserId>,

    /// Current status.
    status: JobStatus,

    /// Free-text note carried over from the order.
    notes: Option<String>,

    /// When the job was created.
    created_at: Option<DateTime<Utc>>,

    /// When the job was claimed.
    assigned_at: Option<DateTime<Utc>>,

    /// When the job reached delivered.
    completed_at: Option<DateTime<Utc>>,
}

impl Aggregate for DeliveryJob {
    type Event = DeliveryJobEvent;
    type Error = DeliveryJobError;

    fn aggregate_type() -> &'static str {
        "DeliveryJob"
    }

    fn id(&self) -> Option<AggregateId> {
        self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn apply(&mut self, event: Self::Event) {
        match event {
            DeliveryJobEvent::DeliveryJobCreated(data) => self.apply_created(data),
            DeliveryJobEvent::DeliveryJobClaimed(data) => self.apply_claimed(data),
            DeliveryJobEvent::DeliveryJobPickedUp(data) => self.apply_picked_up(data),
            DeliveryJobEvent::DeliveryJobInTransit(data) => self.apply_in_transit(data),
            DeliveryJobEvent::DeliveryJobDelivered(data) => self.apply_delivered(data),
        }
    }
}

impl SnapshotCapable for DeliveryJob {
    fn snapshot_interval() -> usize {
        50 // Snapshot every 50 events
    }
}

// Query methods
impl DeliveryJob {
    /// Returns the order this job delivers.
    pub fn order_id(&self) -> Option<AggregateId> {
        self.order_id
    }

    /// Returns the buyer awaiting the delivery.
    pub fn buyer_id(&self) -> Option<UserId> {
        self.buyer_id
    }

    /// Returns the pickup address.
    pub fn pickup_address(&self) -> &Address {
        &self.pickup_address
    }

    /// Returns the delivery address.
    pub fn delivery_address(&self) -> &Address {
        &self.delivery_address
    }

    /// Returns the agent holding the job, if claimed.
    pub fn assigned_agent_id(&self) -> Option<UserId> {
        self.assigned_agent_id
    }

    /// Returns the current status.
    pub fn status(&self) -> JobStatus {
        self.status
    }

    /// Returns the job note.
    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    /// Returns when the job was created.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    /// Returns when the job was claimed.
    pub fn assigned_at(&self) -> Option<DateTime<Utc>> {
        self.assigned_at
    }

    /// Returns when the job reached delivered.
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Returns true if the job is unclaimed and waiting in the pool.
    pub fn is_available(&self) -> bool {
        self.id.is_some() && self.status.can_claim()
    }

    /// Returns true if the job is in a terminal status.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

// Command methods (return events)
impl DeliveryJob {
    /// Creates a delivery job for a confirmed order.
    pub fn create(
        &self,
        job_id: AggregateId,
        order_id: AggregateId,
        buyer_id: UserId,
        pickup_address: Address,
        delivery_address: Address,
        notes: Option<String>,
    ) -> Result<Vec<DeliveryJobEvent>, DeliveryJobError> {
        if self.id.is_some() {
            return Err(DeliveryJobError::AlreadyCreated);
        }

        Ok(vec![DeliveryJobEvent::created(
            job_id,
            order_id,
            buyer_id,
            pickup_address,
            delivery_address,
            notes,
        )])
    }

    /// Claims the job for an agent.
    ///
    /// Only a pending job can be claimed. A job that already carries an
    /// agent is rejected with `AlreadyClaimed`; callers surface that
    /// the same way as losing the append race.
    pub fn claim(&self, agent_id: UserId) -> Result<Vec<DeliveryJobEvent>, DeliveryJobError> {
        let job_id = self.id.ok_or(DeliveryJobError::NotCreated)?;

        if self.status.is_terminal() {
            return Err(DeliveryJobError::TerminalState {
                status: self.status,
            });
        }

        if !self.status.can_claim() {
            return Err(DeliveryJobError::AlreadyClaimed { job_id });
        }

        Ok(vec![DeliveryJobEvent::claimed(agent_id)])
    }

    /// Advances the job to the given target status.
    ///
    /// The target must be the immediate successor of the current
    /// status, and only the assigned agent may advance. Claims are not
    /// an advance target; they go through [`DeliveryJob::claim`].
    pub fn advance(
        &self,
        agent_id: UserId,
        target: JobStatus,
    ) -> Result<Vec<DeliveryJobEvent>, DeliveryJobError> {
        let job_id = self.id.ok_or(DeliveryJobError::NotCreated)?;

        if self.status.is_terminal() {
            return Err(DeliveryJobError::TerminalState {
                status: self.status,
            });
        }

        if self.status.successor() != Some(target) || target == JobStatus::Assigned {
            return Err(DeliveryJobError::InvalidTransition {
                from: self.status,
                to: target,
            });
        }

        if self.assigned_agent_id != Some(agent_id) {
            return Err(DeliveryJobError::NotAssignee { job_id, agent_id });
        }

        let event = match target {
            JobStatus::PickedUp => DeliveryJobEvent::picked_up(),
            JobStatus::InTransit => DeliveryJobEvent::in_transit(),
            JobStatus::Delivered => DeliveryJobEvent::delivered(),
            // Unreachable: the successor check above admits only the three above.
            _ => {
                return Err(DeliveryJobError::InvalidTransition {
                    from: self.status,
                    to: target,
                });
            }
        };

        Ok(vec![event])
    }
}

// Apply event helpers
impl DeliveryJob {
    fn apply_created(&mut self, data: DeliveryJobCreatedData) {
        self.id = Some(data.job_id);
        self.order_id = Some(data.order_id);
        self.buyer_id = Some(data.buyer_id);
        self.pickup_address = data.pickup_address;
        self.delivery_address = data.delivery_address;
        self.notes = data.notes;
        self.status = JobStatus::Pending;
        self.created_at = Some(data.created_at);
    }

    fn apply_claimed(&mut self, data: DeliveryJobClaimedData) {
        self.status = JobStatus::Assigned;
        self.assigned_agent_id = Some(data.agent_id);
        self.assigned_at = Some(data.assigned_at);
    }

    fn apply_picked_up(&mut self, _data: DeliveryJobPickedUpData) {
        self.status = JobStatus::PickedUp;
    }

    fn apply_in_transit(&mut self, _data: DeliveryJobInTransitData) {
        self.status = JobStatus::InTransit;
    }

    fn apply_delivered(&mut self, data: DeliveryJobDeliveredData) {
        self.status = JobStatus::Delivered;
        self.completed_at = Some(data.delivered_at);
    }
}
