//! Order domain events.

use chrono::{DateTime, Utc};
use common::{AggregateId, UserId};
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;

use super::{Address, Money, OrderItem, ProductId};

/// Events that can occur on an order aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum OrderEvent {
    /// Order was placed at checkout.
    OrderPlaced(OrderPlacedData),

    /// The payment gateway settled the order's payment.
    OrderPaymentConfirmed(OrderPaymentConfirmedData),

    /// The order reached the buyer.
    OrderDelivered(OrderDeliveredData),
}

impl DomainEvent for OrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::OrderPlaced(_) => "OrderPlaced",
            OrderEvent::OrderPaymentConfirmed(_) => "OrderPaymentConfirmed",
            OrderEvent::OrderDelivered(_) => "OrderDelivered",
        }
    }
}

/// Data for OrderPlaced event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderPlacedData {
    /// The unique order ID.
    pub order_id: AggregateId,

    /// The buyer who placed the order.
    pub buyer_id: UserId,

    /// The seller whose product was ordered.
    pub seller_id: UserId,

    /// The product ordered.
    pub product_id: ProductId,

    /// Product name as shown at checkout.
    pub product_name: String,

    /// Quantity ordered.
    pub quantity: u32,

    /// Price per unit at checkout time.
    pub unit_price: Money,

    /// Order total (quantity * unit_price).
    pub total: Money,

    /// Currency code, always "NGN" for now.
    pub currency: String,

    /// Where the order should be delivered.
    pub shipping_address: Address,

    /// Free-text note from the buyer.
    pub notes: Option<String>,

    /// When the order was placed.
    pub placed_at: DateTime<Utc>,
}

/// Data for OrderPaymentConfirmed event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderPaymentConfirmedData {
    /// Gateway reference for the settled transaction.
    pub transaction_reference: String,

    /// Gateway that settled the payment (e.g. "paystack").
    pub payment_provider: Option<String>,

    /// When the confirmation was recorded.
    pub confirmed_at: DateTime<Utc>,
}

/// Data for OrderDelivered event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDeliveredData {
    /// When the order reached the buyer.
    pub delivered_at: DateTime<Utc>,
}

// Convenience constructors for events
impl OrderEvent {
    /// Creates an OrderPlaced event from the checkout details.
    pub fn order_placed(
        order_id: AggregateId,
        buyer_id: UserId,
        seller_id: UserId,
        item: &OrderItem,
        shipping_address: Address,
        notes: Option<String>,
    ) -> Self {
        OrderEvent::OrderPlaced(OrderPlacedData {
            order_id,
            buyer_id,
            seller_id,
            product_id: item.product_id.clone(),
            product_name: item.product_name.clone(),
            quantity: item.quantity,
            unit_price: item.unit_price,
            total: item.total_price(),
            currency: "NGN".to_string(),
            shipping_address,
            notes,
            placed_at: Utc::now(),
        })
    }

    /// Creates an OrderPaymentConfirmed event.
    pub fn payment_confirmed(
        transaction_reference: impl Into<String>,
        payment_provider: Option<String>,
    ) -> Self {
        OrderEvent::OrderPaymentConfirmed(OrderPaymentConfirmedData {
            transaction_reference: transaction_reference.into(),
            payment_provider,
            confirmed_at: Utc::now(),
        })
    }

    /// Creates an OrderDelivered event.
    pub fn order_delivered() -> Self {
        OrderEvent::OrderDelivered(OrderDeliveredData {
            delivered_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_item() -> OrderItem {
        OrderItem::new("prod-yam-50kg", "Yam (50kg bag)", 2, Money::from_kobo(250_000))
    }

    fn make_address() -> Address {
        Address::new("Ada Obi", "14 Market Road", "Aba", "Abia", "+2348012345678")
    }

    #[test]
    fn test_event_type() {
        let event = OrderEvent::order_placed(
            AggregateId::new(),
            UserId::new(),
            UserId::new(),
            &make_item(),
            make_address(),
            None,
        );
        assert_eq!(event.event_type(), "OrderPlaced");

        let event = OrderEvent::payment_confirmed("PSK-REF-001", Some("paystack".to_string()));
        assert_eq!(event.event_type(), "OrderPaymentConfirmed");

        let event = OrderEvent::order_delivered();
        assert_eq!(event.event_type(), "OrderDelivered");
    }

    #[test]
    fn test_order_placed_captures_checkout_details() {
        let order_id = AggregateId::new();
        let buyer_id = UserId::new();
        let seller_id = UserId::new();

        let event = OrderEvent::order_placed(
            order_id,
            buyer_id,
            seller_id,
            &make_item(),
            make_address(),
            Some("Deliver before noon".to_string()),
        );

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("OrderPlaced"));

        let deserialized: OrderEvent = serde_json::from_str(&json).unwrap();
        if let OrderEvent::OrderPlaced(data) = deserialized {
            assert_eq!(data.order_id, order_id);
            assert_eq!(data.buyer_id, buyer_id);
            assert_eq!(data.seller_id, seller_id);
            assert_eq!(data.quantity, 2);
            assert_eq!(data.total.kobo(), 500_000);
            assert_eq!(data.currency, "NGN");
            assert_eq!(data.shipping_address.city, "Aba");
            assert_eq!(data.notes.as_deref(), Some("Deliver before noon"));
        } else {
            panic!("Expected OrderPlaced event");
        }
    }

    #[test]
    fn test_payment_confirmed_serialization() {
        let event = OrderEvent::payment_confirmed("PSK-REF-881", None);

        let json = serde_json::to_string(&event).unwrap();
        let deserialized: OrderEvent = serde_json::from_str(&json).unwrap();

        if let OrderEvent::OrderPaymentConfirmed(data) = deserialized {
            assert_eq!(data.transaction_reference, "PSK-REF-881");
            assert_eq!(data.payment_provider, None);
        } else {
            panic!("Expected OrderPaymentConfirmed event");
        }
    }

    #[test]
    fn test_order_delivered_serialization() {
        let event = OrderEvent::order_delivered();

        let json = serde_json::to_string(&event).unwrap();
        let deserialized: OrderEvent = serde_json::from_str(&json).unwrap();

        assert!(matches!(deserialized, OrderEvent::OrderDelivered(_)));
    }
}
