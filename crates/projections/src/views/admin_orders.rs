//! Admin orders read model — every order with payment and delivery state.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{AggregateId, UserId};
use domain::{DeliveryJobEvent, JobStatus, Money, OrderEvent, OrderStatus, PaymentStatus};
use event_store::EventEnvelope;
use tokio::sync::RwLock;

use crate::Result;
use crate::projection::{Projection, ProjectionPosition};
use crate::read_model::ReadModel;

/// Summary of an order as the admin dashboard sees it.
#[derive(Debug, Clone)]
pub struct AdminOrderSummary {
    pub order_id: AggregateId,
    pub buyer_id: UserId,
    pub seller_id: UserId,
    pub product_name: String,
    pub quantity: u32,
    pub total: Money,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    /// Current state of the delivery job, once one exists for this order.
    pub delivery_status: Option<JobStatus>,
    pub placed_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Internal state for the admin orders view.
struct AdminOrdersState {
    orders: HashMap<AggregateId, AdminOrderSummary>,
    /// Maps job_id -> order_id; job transition events carry no order id.
    job_to_order: HashMap<AggregateId, AggregateId>,
    position: ProjectionPosition,
}

/// Read model view over every order in the system.
///
/// Folds both the order streams and the delivery job streams so one
/// row answers "where is this order and where is its delivery".
#[derive(Clone)]
pub struct AdminOrdersView {
    state: Arc<RwLock<AdminOrdersState>>,
}

impl AdminOrdersView {
    /// Creates a new empty admin orders view.
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(AdminOrdersState {
                orders: HashMap::new(),
                job_to_order: HashMap::new(),
                position: ProjectionPosition::zero(),
            })),
        }
    }

    /// Gets a specific order.
    pub async fn get_order(&self, order_id: AggregateId) -> Option<AdminOrderSummary> {
        self.state.read().await.orders.get(&order_id).cloned()
    }

    /// Gets all orders, newest first.
    pub async fn all_orders(&self) -> Vec<AdminOrderSummary> {
        let mut orders: Vec<_> = self.state.read().await.orders.values().cloned().collect();
        orders.sort_by_key(|o| std::cmp::Reverse(o.placed_at));
        orders
    }

    /// Gets orders in a given status, newest first.
    pub async fn orders_with_status(&self, status: OrderStatus) -> Vec<AdminOrderSummary> {
        let mut orders: Vec<_> = self
            .state
            .read()
            .await
            .orders
            .values()
            .filter(|o| o.status == status)
            .cloned()
            .collect();
        orders.sort_by_key(|o| std::cmp::Reverse(o.placed_at));
        orders
    }
}

impl Default for AdminOrdersView {
    fn default() -> Self {
        Self::new()
    }
}

impl AdminOrdersState {
    fn apply_order_event(&mut self, order_id: AggregateId, event: OrderEvent) {
        match event {
            OrderEvent::OrderPlaced(data) => {
                self.orders.insert(
                    order_id,
                    AdminOrderSummary {
                        order_id,
                        buyer_id: data.buyer_id,
                        seller_id: data.seller_id,
                        product_name: data.product_name,
                        quantity: data.quantity,
                        total: data.total,
                        status: OrderStatus::Pending,
                        payment_status: PaymentStatus::Pending,
                        delivery_status: None,
                        placed_at: data.placed_at,
                        updated_at: data.placed_at,
                    },
                );
            }
            OrderEvent::OrderPaymentConfirmed(data) => {
                if let Some(order) = self.orders.get_mut(&order_id) {
                    order.status = OrderStatus::Confirmed;
                    order.payment_status = PaymentStatus::Completed;
                    order.updated_at = data.confirmed_at;
                }
            }
            OrderEvent::OrderDelivered(data) => {
                if let Some(order) = self.orders.get_mut(&order_id) {
                    order.status = OrderStatus::Delivered;
                    order.updated_at = data.delivered_at;
                }
            }
        }
    }

    fn apply_job_event(&mut self, job_id: AggregateId, event: DeliveryJobEvent) {
        let (order_id, status, at) = match event {
            DeliveryJobEvent::DeliveryJobCreated(data) => {
                self.job_to_order.insert(job_id, data.order_id);
                (Some(data.order_id), JobStatus::Pending, data.created_at)
            }
            DeliveryJobEvent::DeliveryJobClaimed(data) => {
                let order_id = self.job_to_order.get(&job_id).copied();
                (order_id, JobStatus::Assigned, data.assigned_at)
            }
            DeliveryJobEvent::DeliveryJobPickedUp(data) => {
                let order_id = self.job_to_order.get(&job_id).copied();
                (order_id, JobStatus::PickedUp, data.picked_up_at)
            }
            DeliveryJobEvent::DeliveryJobInTransit(data) => {
                let order_id = self.job_to_order.get(&job_id).copied();
                (order_id, JobStatus::InTransit, data.departed_at)
            }
            DeliveryJobEvent::DeliveryJobDelivered(data) => {
                let order_id = self.job_to_order.get(&job_id).copied();
                (order_id, JobStatus::Delivered, data.delivered_at)
            }
        };

        if let Some(order) = order_id.and_then(|id| self.orders.get_mut(&id)) {
            order.delivery_status = Some(status);
            order.updated_at = at;
        }
    }
}

#[async_trait]
impl Projection for AdminOrdersView {
    fn name(&self) -> &'static str {
        "AdminOrdersView"
    }

    async fn handle(&self, event: &EventEnvelope) -> Result<()> {
        let mut state = self.state.write().await;

        match event.aggregate_type.as_str() {
            "Order" => {
                let order_event: OrderEvent = serde_json::from_value(event.payload.clone())?;
                state.apply_order_event(event.aggregate_id, order_event);
            }
            "DeliveryJob" => {
                let job_event: DeliveryJobEvent = serde_json::from_value(event.payload.clone())?;
                state.apply_job_event(event.aggregate_id, job_event);
            }
            _ => {}
        }

        state.position = state.position.advance();
        Ok(())
    }

    async fn position(&self) -> ProjectionPosition {
        self.state.read().await.position
    }

    async fn reset(&self) -> Result<()> {
        let mut state = self.state.write().await;
        state.orders.clear();
        state.job_to_order.clear();
        state.position = ProjectionPosition::zero();
        Ok(())
    }
}

impl ReadModel for AdminOrdersView {
    fn name(&self) -> &'static str {
        "AdminOrdersView"
    }

    fn count(&self) -> usize {
        self.state.try_read().map(|s| s.orders.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{Address, DomainEvent, OrderItem};

    fn make_envelope<E: DomainEvent>(
        aggregate_id: AggregateId,
        aggregate_type: &str,
        version: i64,
        event: &E,
    ) -> EventEnvelope {
        EventEnvelope::builder()
            .aggregate_id(aggregate_id)
            .aggregate_type(aggregate_type)
            .event_type(event.event_type())
            .version(event_store::Version::new(version))
            .payload(event)
            .unwrap()
            .build()
    }

    fn address() -> Address {
        Address::new("Ada Obi", "14 Market Road", "Aba", "Abia", "+2348012345678")
    }

    async fn place_order(view: &AdminOrdersView, order_id: AggregateId) -> (UserId, UserId) {
        let buyer_id = UserId::new();
        let seller_id = UserId::new();
        let item = OrderItem::new("prod-yam-50kg", "Yam (50kg bag)", 2, Money::from_kobo(250_000));
        let event =
            OrderEvent::order_placed(order_id, buyer_id, seller_id, &item, address(), None);
        view.handle(&make_envelope(order_id, "Order", 1, &event))
            .await
            .unwrap();
        (buyer_id, seller_id)
    }

    #[tokio::test]
    async fn test_placed_order_appears() {
        let view = AdminOrdersView::new();
        let order_id = AggregateId::new();

        let (buyer_id, seller_id) = place_order(&view, order_id).await;

        let order = view.get_order(order_id).await.unwrap();
        assert_eq!(order.buyer_id, buyer_id);
        assert_eq!(order.seller_id, seller_id);
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.payment_status, PaymentStatus::Pending);
        assert_eq!(order.total.kobo(), 500_000);
        assert!(order.delivery_status.is_none());
    }

    #[tokio::test]
    async fn test_payment_confirmation_updates_both_statuses() {
        let view = AdminOrdersView::new();
        let order_id = AggregateId::new();

        place_order(&view, order_id).await;

        let event = OrderEvent::payment_confirmed("PSK-REF-001", Some("paystack".into()));
        view.handle(&make_envelope(order_id, "Order", 2, &event))
            .await
            .unwrap();

        let order = view.get_order(order_id).await.unwrap();
        assert_eq!(order.status, OrderStatus::Confirmed);
        assert_eq!(order.payment_status, PaymentStatus::Completed);
    }

    #[tokio::test]
    async fn test_delivery_job_state_joined_onto_order() {
        let view = AdminOrdersView::new();
        let order_id = AggregateId::new();
        let job_id = AggregateId::new();

        let (buyer_id, _) = place_order(&view, order_id).await;

        let event = DeliveryJobEvent::created(job_id, order_id, buyer_id, address(), address(), None);
        view.handle(&make_envelope(job_id, "DeliveryJob", 1, &event))
            .await
            .unwrap();

        let order = view.get_order(order_id).await.unwrap();
        assert_eq!(order.delivery_status, Some(JobStatus::Pending));

        // Transition events carry no order id; the index resolves them
        let event = DeliveryJobEvent::claimed(UserId::new());
        view.handle(&make_envelope(job_id, "DeliveryJob", 2, &event))
            .await
            .unwrap();

        let order = view.get_order(order_id).await.unwrap();
        assert_eq!(order.delivery_status, Some(JobStatus::Assigned));
    }

    #[tokio::test]
    async fn test_orders_listed_newest_first() {
        let view = AdminOrdersView::new();
        let first = AggregateId::new();
        let second = AggregateId::new();

        place_order(&view, first).await;
        place_order(&view, second).await;

        let orders = view.all_orders().await;
        assert_eq!(orders.len(), 2);
        assert!(orders[0].placed_at >= orders[1].placed_at);
    }

    #[tokio::test]
    async fn test_filter_by_status() {
        let view = AdminOrdersView::new();
        let paid = AggregateId::new();
        let unpaid = AggregateId::new();

        place_order(&view, paid).await;
        place_order(&view, unpaid).await;

        let event = OrderEvent::payment_confirmed("PSK-REF-002", None);
        view.handle(&make_envelope(paid, "Order", 2, &event))
            .await
            .unwrap();

        let confirmed = view.orders_with_status(OrderStatus::Confirmed).await;
        assert_eq!(confirmed.len(), 1);
        assert_eq!(confirmed[0].order_id, paid);
        assert_eq!(view.orders_with_status(OrderStatus::Pending).await.len(), 1);
    }

    #[tokio::test]
    async fn test_reset() {
        let view = AdminOrdersView::new();
        let order_id = AggregateId::new();

        place_order(&view, order_id).await;
        assert_eq!(view.all_orders().await.len(), 1);

        view.reset().await.unwrap();

        assert!(view.get_order(order_id).await.is_none());
        assert_eq!(view.position().await.events_processed, 0);
    }
}
