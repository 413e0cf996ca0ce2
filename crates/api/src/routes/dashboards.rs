//! Dashboard read-model endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use chrono::{DateTime, Utc};
use domain::{JobStatus, OrderStatus, PaymentStatus};
use event_store::EventStore;
use projections::{AdminOrderSummary, SellerOrderSummary};
use serde::Serialize;

use crate::error::ApiError;
use crate::state::AppState;

use super::parse_user_id;

// -- Response types --

#[derive(Serialize)]
pub struct AdminOrderResponse {
    pub order_id: String,
    pub buyer_id: String,
    pub seller_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub total_kobo: i64,
    pub total: String,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub delivery_status: Option<JobStatus>,
    pub placed_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<AdminOrderSummary> for AdminOrderResponse {
    fn from(summary: AdminOrderSummary) -> Self {
        Self {
            order_id: summary.order_id.to_string(),
            buyer_id: summary.buyer_id.to_string(),
            seller_id: summary.seller_id.to_string(),
            product_name: summary.product_name,
            quantity: summary.quantity,
            total_kobo: summary.total.kobo(),
            total: summary.total.to_string(),
            status: summary.status,
            payment_status: summary.payment_status,
            delivery_status: summary.delivery_status,
            placed_at: summary.placed_at,
            updated_at: summary.updated_at,
        }
    }
}

#[derive(Serialize)]
pub struct SellerOrderResponse {
    pub order_id: String,
    pub buyer_id: String,
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub total_kobo: i64,
    pub total: String,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub placed_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<SellerOrderSummary> for SellerOrderResponse {
    fn from(summary: SellerOrderSummary) -> Self {
        Self {
            order_id: summary.order_id.to_string(),
            buyer_id: summary.buyer_id.to_string(),
            product_id: summary.product_id.to_string(),
            product_name: summary.product_name,
            quantity: summary.quantity,
            total_kobo: summary.total.kobo(),
            total: summary.total.to_string(),
            status: summary.status,
            payment_status: summary.payment_status,
            placed_at: summary.placed_at,
            updated_at: summary.updated_at,
        }
    }
}

#[derive(Serialize)]
pub struct BuyerStatsResponse {
    pub buyer_id: String,
    pub total_orders: u64,
    pub pending_orders: u64,
    pub delivered_orders: u64,
    pub cancelled_orders: u64,
    pub total_spent_kobo: i64,
    pub total_spent: String,
    pub order_ids: Vec<String>,
}

// -- Handlers --

/// GET /dashboard/admin/orders — every order with its delivery state.
#[tracing::instrument(skip(state))]
pub async fn admin_orders<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<AdminOrderResponse>>, ApiError> {
    state
        .projection_processor
        .run_catch_up()
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let orders = state.admin_orders.all_orders().await;
    Ok(Json(orders.into_iter().map(Into::into).collect()))
}

/// GET /dashboard/sellers/:id/orders — a seller's incoming orders.
#[tracing::instrument(skip(state))]
pub async fn seller_orders<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<SellerOrderResponse>>, ApiError> {
    let seller_id = parse_user_id(&id)?;

    state
        .projection_processor
        .run_catch_up()
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let orders = state.seller_orders.orders_for_seller(seller_id).await;
    Ok(Json(orders.into_iter().map(Into::into).collect()))
}

/// GET /dashboard/buyers/:id/stats — a buyer's order profile.
///
/// A buyer with no orders gets a zeroed profile, not a 404.
#[tracing::instrument(skip(state))]
pub async fn buyer_stats<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<BuyerStatsResponse>, ApiError> {
    let buyer_id = parse_user_id(&id)?;

    state
        .projection_processor
        .run_catch_up()
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let response = match state.buyer_stats.get_buyer(buyer_id).await {
        Some(stats) => BuyerStatsResponse {
            buyer_id: stats.buyer_id.to_string(),
            total_orders: stats.total_orders,
            pending_orders: stats.pending_orders,
            delivered_orders: stats.delivered_orders,
            cancelled_orders: stats.cancelled_orders,
            total_spent_kobo: stats.total_spent.kobo(),
            total_spent: stats.total_spent.to_string(),
            order_ids: stats.order_ids.iter().map(|o| o.to_string()).collect(),
        },
        None => BuyerStatsResponse {
            buyer_id: buyer_id.to_string(),
            total_orders: 0,
            pending_orders: 0,
            delivered_orders: 0,
            cancelled_orders: 0,
            total_spent_kobo: 0,
            total_spent: domain::Money::from_kobo(0).to_string(),
            order_ids: Vec::new(),
        },
    };

    Ok(Json(response))
}
