//! Order aggregate implementation.

use chrono::{DateTime, Utc};
use common::{AggregateId, UserId};
use event_store::Version;
use serde::{Deserialize, Serialize};

use crate::aggregate::{Aggregate, SnapshotCapable};

use super::{
    Address, Money, OrderError, OrderEvent, OrderItem, OrderStatus, PaymentStatus, ProductId,
    events::{OrderDeliveredData, OrderPaymentConfirmedData, OrderPlacedData},
};

/// Order aggregate root.
///
/// Represents a marketplace order from checkout through payment
/// confirmation to delivery. The delivery itself is tracked by a
/// separate `DeliveryJob` aggregate; the order only records the
/// outcome.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Order {
    /// Unique order identifier.
    id: Option<AggregateId>,

    /// Current version for optimistic concurrency.
    #[serde(default)]
    version: Version,

    /// Buyer who placed the order.
    buyer_id: Option<UserId>,

    /// Seller whose product was ordered.
    seller_id: Option<UserId>,

    /// The product ordered.
    product_id: Option<ProductId>,

    /// Product name as shown at checkout.
    product_name: String,

    /// Quantity ordered.
    quantity: u32,

    /// Price per unit at checkout time.
    unit_price: Money,

    /// Order total.
    total: Money,

    /// Currency code.
    currency: String,

    /// Where the order should be delivered.
    shipping_address: Address,

    /// Fulfillment status.
    status: OrderStatus,

    /// Payment settlement status.
    payment_status: PaymentStatus,

    /// Gateway that settled the payment, once confirmed.
    payment_provider: Option<String>,

    /// Gateway transaction reference, once confirmed.
    transaction_reference: Option<String>,

    /// Free-text note from the buyer.
    notes: Option<String>,

    /// When the order was placed.
    placed_at: Option<DateTime<Utc>>,

    /// When payment was confirmed.
    confirmed_at: Option<DateTime<Utc>>,

    /// When the order reached the buyer.
    delivered_at: Option<DateTime<Utc>>,

    /// Most recent state change.
    updated_at: Option<DateTime<Utc>>,
}

impl Aggregate for Order {
    type Event = OrderEvent;
    type Error = OrderError;

    fn aggregate_type() -> &'static str {
        "Order"
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
            OrderEvent::OrderPlaced(data) => self.apply_order_placed(data),
            OrderEvent::OrderPaymentConfirmed(data) => self.apply_payment_confirmed(data),
            OrderEvent::OrderDelivered(data) => self.apply_order_delivered(data),
        }
    }
}

impl SnapshotCapable for Order {
    fn snapshot_interval() -> usize {
        50 // Snapshot every 50 events
    }
}

// Query methods
impl Order {
    /// Returns the buyer ID.
    pub fn buyer_id(&self) -> Option<UserId> {
        self.buyer_id
    }

    /// Returns the seller ID.
    pub fn seller_id(&self) -> Option<UserId> {
        self.seller_id
    }

    /// Returns the product ID.
    pub fn product_id(&self) -> Option<&ProductId> {
        self.product_id.as_ref()
    }

    /// Returns the product name.
    pub fn product_name(&self) -> &str {
        &self.product_name
    }

    /// Returns the quantity ordered.
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Returns the unit price.
    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    /// Returns the order total.
    pub fn total(&self) -> Money {
        self.total
    }

    /// Returns the currency code.
    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Returns the shipping address.
    pub fn shipping_address(&self) -> &Address {
        &self.shipping_address
    }

    /// Returns the fulfillment status.
    pub fn status(&self) -> OrderStatus {
        self.status
    }

    /// Returns the payment status.
    pub fn payment_status(&self) -> PaymentStatus {
        self.payment_status
    }

    /// Returns the gateway that settled the payment.
    pub fn payment_provider(&self) -> Option<&str> {
        self.payment_provider.as_deref()
    }

    /// Returns the gateway transaction reference.
    pub fn transaction_reference(&self) -> Option<&str> {
        self.transaction_reference.as_deref()
    }

    /// Returns the buyer's note.
    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    /// Returns when the order was placed.
    pub fn placed_at(&self) -> Option<DateTime<Utc>> {
        self.placed_at
    }

    /// Returns when payment was confirmed.
    pub fn confirmed_at(&self) -> Option<DateTime<Utc>> {
        self.confirmed_at
    }

    /// Returns when the order reached the buyer.
    pub fn delivered_at(&self) -> Option<DateTime<Utc>> {
        self.delivered_at
    }

    /// Returns the most recent state change.
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// Returns true if payment has settled.
    pub fn is_paid(&self) -> bool {
        self.payment_status.is_completed()
    }

    /// Returns true if the order is in a terminal status.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

// Command methods (return events)
impl Order {
    /// Places a new order at checkout.
    pub fn place(
        &self,
        order_id: AggregateId,
        buyer_id: UserId,
        seller_id: UserId,
        item: OrderItem,
        shipping_address: Address,
        notes: Option<String>,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        if self.id.is_some() {
            return Err(OrderError::AlreadyPlaced);
        }

        if item.quantity == 0 {
            return Err(OrderError::InvalidQuantity {
                quantity: item.quantity,
            });
        }

        if !item.unit_price.is_positive() {
            return Err(OrderError::InvalidPrice {
                price: item.unit_price.kobo(),
            });
        }

        Ok(vec![OrderEvent::order_placed(
            order_id,
            buyer_id,
            seller_id,
            &item,
            shipping_address,
            notes,
        )])
    }

    /// Records that the payment gateway settled this order's payment.
    ///
    /// A second confirmation for the same order is rejected with
    /// `AlreadyConfirmed` so callers can treat the duplicate signal as
    /// a no-op instead of double-dispatching side effects.
    pub fn confirm_payment(
        &self,
        transaction_reference: impl Into<String>,
        payment_provider: Option<String>,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        let order_id = self.id.ok_or(OrderError::NotPlaced)?;

        if self.payment_status.is_completed() {
            return Err(OrderError::AlreadyConfirmed { order_id });
        }

        if self.status.is_terminal() {
            return Err(OrderError::AlreadyTerminal {
                status: self.status,
            });
        }

        Ok(vec![OrderEvent::payment_confirmed(
            transaction_reference,
            payment_provider,
        )])
    }

    /// Marks the order delivered.
    ///
    /// Driven by the delivery job reaching its own delivered state.
    pub fn mark_delivered(&self) -> Result<Vec<OrderEvent>, OrderError> {
        if self.id.is_none() {
            return Err(OrderError::NotPlaced);
        }

        if self.status.is_terminal() {
            return Err(OrderError::AlreadyTerminal {
                status: self.status,
            });
        }

        if !self.payment_status.is_completed() {
            return Err(OrderError::PaymentNotCompleted);
        }

        Ok(vec![OrderEvent::order_delivered()])
    }
}

// Apply event helpers
impl Order {
    fn apply_order_placed(&mut self, data: OrderPlacedData) {
        self.id = Some(data.order_id);
        self.buyer_id = Some(data.buyer_id);
        self.seller_id = Some(data.seller_id);
        self.product_id = Some(data.product_id);
        self.product_name = data.product_name;
        self.quantity = data.quantity;
        self.unit_price = data.unit_price;
        self.total = data.total;
        self.currency = data.currency;
        self.shipping_address = data.shipping_address;
        self.notes = data.notes;
        self.status = OrderStatus::Pending;
        self.payment_status = PaymentStatus::Pending;
        self.placed_at = Some(data.placed_at);
        self.updated_at = Some(data.placed_at);
    }

    fn apply_payment_confirmed(&mut self, data: OrderPaymentConfirmedData) {
        self.status = OrderStatus::Confirmed;
        self.payment_status = PaymentStatus::Completed;
        self.transaction_reference = Some(data.transaction_reference);
        self.payment_provider = data.payment_provider;
        self.confirmed_at = Some(data.confirmed_at);
        self.updated_at = Some(data.confirmed_at);
    }

    fn apply_order_delivered(&mut self, data: OrderDeliveredData) {
        self.status = OrderStatus::Delivered;
        self.delivered_at = Some(data.delivered_at);
        self.updated_at = Some(data.delivered_at);
    }
}
