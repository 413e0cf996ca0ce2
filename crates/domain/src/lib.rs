//! Domain layer for the AgroCom fulfillment engine.
//!
//! This crate provides the core domain abstractions including:
//! - Aggregate trait for event-sourced entities
//! - DomainEvent trait for domain events
//! - Command trait and CommandHandler for command processing
//! - Order aggregate covering checkout, payment confirmation and delivery
//! - DeliveryJob aggregate covering the claim and delivery state machine

pub mod aggregate;
pub mod command;
pub mod delivery;
pub mod error;
pub mod order;

pub use aggregate::{Aggregate, DomainEvent};
pub use command::{Command, CommandHandler, CommandResult};
pub use delivery::{
    AdvanceDeliveryJob, ClaimDeliveryJob, CreateDeliveryJob, DeliveryJob, DeliveryJobClaimedData,
    DeliveryJobCreatedData, DeliveryJobDeliveredData, DeliveryJobError, DeliveryJobEvent,
    DeliveryJobInTransitData, DeliveryJobPickedUpData, DeliveryJobService, JobStatus,
};
pub use error::DomainError;
pub use order::{
    Address, ConfirmPayment, MarkOrderDelivered, Money, Order, OrderDeliveredData, OrderError,
    OrderEvent, OrderItem, OrderPaymentConfirmedData, OrderPlacedData, OrderService, OrderStatus,
    PaymentStatus, PlaceOrder, ProductId,
};
