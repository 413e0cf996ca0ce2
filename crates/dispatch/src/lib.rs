//! Fulfillment orchestration for the marketplace.
//!
//! This crate wires payment confirmations to the delivery workflow and
//! keeps the people involved informed along the way.
//!
//! The fulfillment flow follows these steps:
//! 1. A settled payment flips the order and opens a delivery job
//! 2. Delivery agents claim pending jobs, first come first served
//! 3. The assigned agent walks the job to delivered, which closes the order
//!
//! Each step notifies the affected users through their notification feeds.
//! A reconciliation pass repairs confirmed orders whose job never appeared.

pub mod confirmation;
pub mod error;
pub mod lifecycle;
pub mod notify;
pub mod reconcile;
pub mod registry;
pub mod services;

pub use confirmation::{ConfirmationOutcome, PaymentConfirmationHandler};
pub use error::DispatchError;
pub use lifecycle::DeliveryLifecycle;
pub use notify::{Notification, NotificationDispatcher, NotificationKind};
pub use reconcile::{ReconciliationReport, Reconciler};
pub use registry::DeliveryJobRegistry;
pub use services::{
    InMemoryNotificationStore, InMemoryUserDirectory, NotificationStore, Role, UserDirectory,
    UserRecord,
};
