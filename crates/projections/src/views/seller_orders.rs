//! Seller orders read model — incoming orders per seller.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{AggregateId, UserId};
use domain::{Money, OrderEvent, OrderStatus, PaymentStatus, ProductId};
use event_store::EventEnvelope;
use tokio::sync::RwLock;

use crate::Result;
use crate::projection::{Projection, ProjectionPosition};
use crate::read_model::ReadModel;

/// Summary of an order as its seller sees it.
#[derive(Debug, Clone)]
pub struct SellerOrderSummary {
    pub order_id: AggregateId,
    pub seller_id: UserId,
    pub buyer_id: UserId,
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub total: Money,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub placed_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Read model view of orders grouped by seller.
#[derive(Clone)]
pub struct SellerOrdersView {
    orders: Arc<RwLock<HashMap<AggregateId, SellerOrderSummary>>>,
    position: Arc<RwLock<ProjectionPosition>>,
}

impl SellerOrdersView {
    /// Creates a new empty seller orders view.
    pub fn new() -> Self {
        Self {
            orders: Arc::new(RwLock::new(HashMap::new())),
            position: Arc::new(RwLock::new(ProjectionPosition::zero())),
        }
    }

    /// Gets a specific order.
    pub async fn get_order(&self, order_id: AggregateId) -> Option<SellerOrderSummary> {
        self.orders.read().await.get(&order_id).cloned()
    }

    /// Gets a seller's orders, newest first.
    pub async fn orders_for_seller(&self, seller_id: UserId) -> Vec<SellerOrderSummary> {
        let mut orders: Vec<_> = self
            .orders
            .read()
            .await
            .values()
            .filter(|o| o.seller_id == seller_id)
            .cloned()
            .collect();
        orders.sort_by_key(|o| std::cmp::Reverse(o.placed_at));
        orders
    }

    /// Gets a seller's orders awaiting fulfillment (paid, not yet delivered).
    pub async fn open_orders_for_seller(&self, seller_id: UserId) -> Vec<SellerOrderSummary> {
        let mut orders: Vec<_> = self
            .orders
            .read()
            .await
            .values()
            .filter(|o| {
                o.seller_id == seller_id
                    && o.payment_status == PaymentStatus::Completed
                    && !o.status.is_terminal()
            })
            .cloned()
            .collect();
        orders.sort_by_key(|o| std::cmp::Reverse(o.placed_at));
        orders
    }
}

impl Default for SellerOrdersView {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Projection for SellerOrdersView {
    fn name(&self) -> &'static str {
        "SellerOrdersView"
    }

    async fn handle(&self, event: &EventEnvelope) -> Result<()> {
        if event.aggregate_type != "Order" {
            let mut pos = self.position.write().await;
            *pos = pos.advance();
            return Ok(());
        }

        let order_event: OrderEvent = serde_json::from_value(event.payload.clone())?;
        let order_id = event.aggregate_id;

        let mut orders = self.orders.write().await;

        match order_event {
            OrderEvent::OrderPlaced(data) => {
                orders.insert(
                    order_id,
                    SellerOrderSummary {
                        order_id,
                        seller_id: data.seller_id,
                        buyer_id: data.buyer_id,
                        product_id: data.product_id,
                        product_name: data.product_name,
                        quantity: data.quantity,
                        total: data.total,
                        status: OrderStatus::Pending,
                        payment_status: PaymentStatus::Pending,
                        placed_at: data.placed_at,
                        updated_at: data.placed_at,
                    },
                );
            }
            OrderEvent::OrderPaymentConfirmed(data) => {
                if let Some(order) = orders.get_mut(&order_id) {
                    order.status = OrderStatus::Confirmed;
                    order.payment_status = PaymentStatus::Completed;
                    order.updated_at = data.confirmed_at;
                }
            }
            OrderEvent::OrderDelivered(data) => {
                if let Some(order) = orders.get_mut(&order_id) {
                    order.status = OrderStatus::Delivered;
                    order.updated_at = data.delivered_at;
                }
            }
        }

        drop(orders);
        let mut pos = self.position.write().await;
        *pos = pos.advance();
        Ok(())
    }

    async fn position(&self) -> ProjectionPosition {
        *self.position.read().await
    }

    async fn reset(&self) -> Result<()> {
        self.orders.write().await.clear();
        *self.position.write().await = ProjectionPosition::zero();
        Ok(())
    }
}

impl ReadModel for SellerOrdersView {
    fn name(&self) -> &'static str {
        "SellerOrdersView"
    }

    fn count(&self) -> usize {
        self.orders.try_read().map(|o| o.len()).unwrap_or(0)
    }
}
