//! Order commands.

use common::{AggregateId, UserId};

use crate::command::Command;

use super::{Address, Order, OrderItem};

/// Command to place a new order at checkout.
#[derive(Debug, Clone)]
pub struct PlaceOrder {
    /// The order ID to create.
    pub order_id: AggregateId,

    /// The buyer placing the order.
    pub buyer_id: UserId,

    /// The seller whose product is ordered.
    pub seller_id: UserId,

    /// The product line of the order.
    pub item: OrderItem,

    /// Where the order should be delivered.
    pub shipping_address: Address,

    /// Free-text note from the buyer.
    pub notes: Option<String>,
}

impl PlaceOrder {
    /// Creates a new PlaceOrder command.
    pub fn new(
        order_id: AggregateId,
        buyer_id: UserId,
        seller_id: UserId,
        item: OrderItem,
        shipping_address: Address,
    ) -> Self {
        Self {
            order_id,
            buyer_id,
            seller_id,
            item,
            shipping_address,
            notes: None,
        }
    }

    /// Creates a new PlaceOrder command with a generated order ID.
    pub fn at_checkout(
        buyer_id: UserId,
        seller_id: UserId,
        item: OrderItem,
        shipping_address: Address,
    ) -> Self {
        Self::new(
            AggregateId::new(),
            buyer_id,
            seller_id,
            item,
            shipping_address,
        )
    }

    /// Attaches a buyer note to the order.
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

impl Command for PlaceOrder {
    type Aggregate = Order;

    fn aggregate_id(&self) -> AggregateId {
        self.order_id
    }
}

/// Command to record a settled payment against an order.
#[derive(Debug, Clone)]
pub struct ConfirmPayment {
    /// The order whose payment settled.
    pub order_id: AggregateId,

    /// Gateway reference for the settled transaction.
    pub transaction_reference: String,

    /// Gateway that settled the payment.
    pub payment_provider: Option<String>,
}

impl ConfirmPayment {
    /// Creates a new ConfirmPayment command.
    pub fn new(order_id: AggregateId, transaction_reference: impl Into<String>) -> Self {
        Self {
            order_id,
            transaction_reference: transaction_reference.into(),
            payment_provider: None,
        }
    }

    /// Names the gateway that settled the payment.
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.payment_provider = Some(provider.into());
        self
    }
}

impl Command for ConfirmPayment {
    type Aggregate = Order;

    fn aggregate_id(&self) -> AggregateId {
        self.order_id
    }
}

/// Command to mark an order delivered.
#[derive(Debug, Clone)]
pub struct MarkOrderDelivered {
    /// The order that reached the buyer.
    pub order_id: AggregateId,
}

impl MarkOrderDelivered {
    /// Creates a new MarkOrderDelivered command.
    pub fn new(order_id: AggregateId) -> Self {
        Self { order_id }
    }
}

impl Command for MarkOrderDelivered {
    type Aggregate = Order;

    fn aggregate_id(&self) -> AggregateId {
        self.order_id
    }
}
