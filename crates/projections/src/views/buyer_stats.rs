//! Buyer stats read model — per-buyer order counts and spending.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{AggregateId, UserId};
use domain::{Money, OrderEvent};
use event_store::EventEnvelope;
use tokio::sync::RwLock;

use crate::Result;
use crate::projection::{Projection, ProjectionPosition};
use crate::read_model::ReadModel;

/// Per-buyer profile statistics.
#[derive(Debug, Clone)]
pub struct BuyerStatsSummary {
    pub buyer_id: UserId,
    pub total_orders: u64,
    /// Orders not yet delivered or cancelled.
    pub pending_orders: u64,
    pub delivered_orders: u64,
    pub cancelled_orders: u64,
    /// Sum of order totals, counted only when an order is delivered.
    pub total_spent: Money,
    pub order_ids: Vec<AggregateId>,
}

/// Internal state for the buyer stats view.
struct BuyerStatsState {
    buyers: HashMap<UserId, BuyerStatsSummary>,
    /// Maps order_id -> (buyer_id, order total) for delivery-time accounting.
    orders: HashMap<AggregateId, (UserId, Money)>,
    position: ProjectionPosition,
}

/// Read model view for buyer profile statistics.
#[derive(Clone)]
pub struct BuyerStatsView {
    state: Arc<RwLock<BuyerStatsState>>,
}

impl BuyerStatsView {
    /// Creates a new empty buyer stats view.
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(BuyerStatsState {
                buyers: HashMap::new(),
                orders: HashMap::new(),
                position: ProjectionPosition::zero(),
            })),
        }
    }

    /// Gets statistics for a specific buyer.
    pub async fn get_buyer(&self, buyer_id: UserId) -> Option<BuyerStatsSummary> {
        self.state.read().await.buyers.get(&buyer_id).cloned()
    }

    /// Gets all buyer statistics.
    pub async fn all_buyers(&self) -> Vec<BuyerStatsSummary> {
        self.state.read().await.buyers.values().cloned().collect()
    }

    /// Gets the top buyers by delivered spend, limited to `limit` results.
    pub async fn top_buyers(&self, limit: usize) -> Vec<BuyerStatsSummary> {
        let state = self.state.read().await;
        let mut buyers: Vec<_> = state.buyers.values().cloned().collect();
        buyers.sort_by(|a, b| b.total_spent.kobo().cmp(&a.total_spent.kobo()));
        buyers.truncate(limit);
        buyers
    }
}

impl Default for BuyerStatsView {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Projection for BuyerStatsView {
    fn name(&self) -> &'static str {
        "BuyerStatsView"
    }

    async fn handle(&self, event: &EventEnvelope) -> Result<()> {
        if event.aggregate_type != "Order" {
            let mut state = self.state.write().await;
            state.position = state.position.advance();
            return Ok(());
        }

        let order_event: OrderEvent = serde_json::from_value(event.payload.clone())?;
        let order_id = event.aggregate_id;

        let mut state = self.state.write().await;

        match order_event {
            OrderEvent::OrderPlaced(data) => {
                let buyer_id = data.buyer_id;
                state.orders.insert(order_id, (buyer_id, data.total));

                let entry = state.buyers.entry(buyer_id).or_insert(BuyerStatsSummary {
                    buyer_id,
                    total_orders: 0,
                    pending_orders: 0,
                    delivered_orders: 0,
                    cancelled_orders: 0,
                    total_spent: Money::zero(),
                    order_ids: Vec::new(),
                });
                entry.total_orders += 1;
                entry.pending_orders += 1;
                entry.order_ids.push(order_id);
            }
            OrderEvent::OrderDelivered(_) => {
                if let Some(&(buyer_id, total)) = state.orders.get(&order_id)
                    && let Some(buyer) = state.buyers.get_mut(&buyer_id)
                {
                    buyer.pending_orders = buyer.pending_orders.saturating_sub(1);
                    buyer.delivered_orders += 1;
                    buyer.total_spent = buyer.total_spent.add(total);
                }
            }
            // Payment confirmation does not move the buyer-facing counters
            OrderEvent::OrderPaymentConfirmed(_) => {}
        }

        state.position = state.position.advance();
        Ok(())
    }

    async fn position(&self) -> ProjectionPosition {
        self.state.read().await.position
    }

    async fn reset(&self) -> Result<()> {
        let mut state = self.state.write().await;
        state.buyers.clear();
        state.orders.clear();
        state.position = ProjectionPosition::zero();
        Ok(())
    }
}

impl ReadModel for BuyerStatsView {
    fn name(&self) -> &'static str {
        "BuyerStatsView"
    }

    fn count(&self) -> usize {
        self.state.try_read().map(|s| s.buyers.len()).unwrap_or(0)
    }
}
