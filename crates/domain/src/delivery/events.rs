//! Delivery job domain events.

use chrono::{DateTime, Utc};
use common::{AggregateId, UserId};
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;
use crate::order::Address;

/// Events that can occur on a delivery job aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum DeliveryJobEvent {
    /// Job was created for a confirmed order.
    DeliveryJobCreated(DeliveryJobCreatedData),

    /// An agent claimed the job.
    DeliveryJobClaimed(DeliveryJobClaimedData),

    /// The agent collected the goods from the seller.
    DeliveryJobPickedUp(DeliveryJobPickedUpData),

    /// The agent departed for the buyer.
    DeliveryJobInTransit(DeliveryJobInTransitData),

    /// The goods reached the buyer.
    DeliveryJobDelivered(DeliveryJobDeliveredData),
}

impl DomainEvent for DeliveryJobEvent {
    fn event_type(&self) -> &'static str {
        match self {
            DeliveryJobEvent::DeliveryJobCreated(_) => "DeliveryJobCreated",
            DeliveryJobEvent::DeliveryJobClaimed(_) => "DeliveryJobClaimed",
            DeliveryJobEvent::DeliveryJobPickedUp(_) => "DeliveryJobPickedUp",
            DeliveryJobEvent::DeliveryJobInTransit(_) => "DeliveryJobInTransit",
            DeliveryJobEvent::DeliveryJobDelivered(_) => "DeliveryJobDelivered",
        }
    }
}

/// Data for DeliveryJobCreated event.
///
/// Carries everything lifecycle notifications need so later transitions
/// can run without loading the parent order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryJobCreatedData {
    /// The unique job ID.
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

    /// When the job was created.
    pub created_at: DateTime<Utc>,
}

/// Data for DeliveryJobClaimed event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryJobClaimedData {
    /// The agent who claimed the job.
    pub agent_id: UserId,

    /// When the claim was recorded.
    pub assigned_at: DateTime<Utc>,
}

/// Data for DeliveryJobPickedUp event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryJobPickedUpData {
    /// When the agent collected the goods.
    pub picked_up_at: DateTime<Utc>,
}

/// Data for DeliveryJobInTransit event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryJobInTransitData {
    /// When the agent departed for the buyer.
    pub departed_at: DateTime<Utc>,
}

/// Data for DeliveryJobDelivered event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryJobDeliveredData {
    /// When the goods reached the buyer.
    pub delivered_at: DateTime<Utc>,
}

// Convenience constructors for events
impl DeliveryJobEvent {
    /// Creates a DeliveryJobCreated event.
    pub fn created(
        job_id: AggregateId,
        order_id: AggregateId,
        buyer_id: UserId,
        pickup_address: Address,
        delivery_address: Address,
        notes: Option<String>,
    ) -> Self {
        DeliveryJobEvent::DeliveryJobCreated(DeliveryJobCreatedData {
            job_id,
            order_id,
            buyer_id,
            pickup_address,
            delivery_address,
            notes,
            created_at: Utc::now(),
        })
    }

    /// Creates a DeliveryJobClaimed event.
    pub fn claimed(agent_id: UserId) -> Self {
        DeliveryJobEvent::DeliveryJobClaimed(DeliveryJobClaimedData {
            agent_id,
            assigned_at: Utc::now(),
        })
    }

    /// Creates a DeliveryJobPickedUp event.
    pub fn picked_up() -> Self {
        DeliveryJobEvent::DeliveryJobPickedUp(DeliveryJobPickedUpData {
            picked_up_at: Utc::now(),
        })
    }

    /// Creates a DeliveryJobInTransit event.
    pub fn in_transit() -> Self {
        DeliveryJobEvent::DeliveryJobInTransit(DeliveryJobInTransitData {
            departed_at: Utc::now(),
        })
    }

    /// Creates a DeliveryJobDelivered event.
    pub fn delivered() -> Self {
        DeliveryJobEvent::DeliveryJobDelivered(DeliveryJobDeliveredData {
            delivered_at: Utc::now(),
        })
    }
}
