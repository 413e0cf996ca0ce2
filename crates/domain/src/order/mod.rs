//! Order aggregate and related types.

mod aggregate;
mod commands;
mod events;
mod service;
mod state;
mod value_objects;

pub use aggregate::Order;
pub use commands::*;
pub use events::{OrderDeliveredData, OrderEvent, OrderPaymentConfirmedData, OrderPlacedData};
pub use service::OrderService;
pub use state::{OrderStatus, PaymentStatus};
pub use value_objects::{Address, Money, OrderItem, ProductId};

use common::AggregateId;
use thiserror::Error;

/// Errors that can occur during order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Order has already been placed.
    #[error("Order already placed")]
    AlreadyPlaced,

    /// Order has not been placed yet.
    #[error("Order has not been placed")]
    NotPlaced,

    /// Payment was already confirmed for this order.
    ///
    /// Callers treat this as a signal to skip side effects, not as a
    /// failure of the order itself.
    #[error("Payment already confirmed for order {order_id}")]
    AlreadyConfirmed { order_id: AggregateId },

    /// Payment has not settled.
    #[error("Payment has not been completed")]
    PaymentNotCompleted,

    /// Order is in a terminal status.
    #[error("Order is already {status}, no further transitions allowed")]
    AlreadyTerminal { status: OrderStatus },

    /// Invalid quantity.
    #[error("Invalid quantity: {quantity} (must be greater than 0)")]
    InvalidQuantity { quantity: u32 },

    /// Invalid unit price.
    #[error("Invalid price: {price} kobo (must be greater than 0)")]
    InvalidPrice { price: i64 },
}
