//! Checkout and order lookup endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use domain::{Address, Money, OrderItem, OrderStatus, PaymentStatus, PlaceOrder};
use event_store::EventStore;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

use super::{parse_aggregate_id, parse_user_id};

// -- Request types --

#[derive(Deserialize)]
pub struct PlaceOrderRequest {
    pub buyer_id: String,
    pub seller_id: String,
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price_kobo: i64,
    pub shipping_address: Address,
    pub notes: Option<String>,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderPlacedResponse {
    pub order_id: String,
    pub status: OrderStatus,
    pub total_kobo: i64,
    pub total: String,
}

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub buyer_id: String,
    pub seller_id: String,
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price_kobo: i64,
    pub total_kobo: i64,
    pub total: String,
    pub currency: String,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_provider: Option<String>,
    pub transaction_reference: Option<String>,
    pub shipping_address: Address,
    pub notes: Option<String>,
    pub placed_at: Option<DateTime<Utc>>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
}

// -- Handlers --

/// POST /orders — place a new order at checkout.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<OrderPlacedResponse>), ApiError> {
    let buyer_id = parse_user_id(&req.buyer_id)?;
    let seller_id = parse_user_id(&req.seller_id)?;

    let item = OrderItem::new(
        req.product_id.as_str(),
        req.product_name.as_str(),
        req.quantity,
        Money::from_kobo(req.unit_price_kobo),
    );
    let mut cmd = PlaceOrder::at_checkout(buyer_id, seller_id, item, req.shipping_address);
    if let Some(notes) = req.notes {
        cmd = cmd.with_notes(notes);
    }
    let order_id = cmd.order_id;

    let result = state.order_service.place_order(cmd).await?;
    let order = result.aggregate;

    let response = OrderPlacedResponse {
        order_id: order_id.to_string(),
        status: order.status(),
        total_kobo: order.total().kobo(),
        total: order.total().to_string(),
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /orders/:id — load an order aggregate by ID.
#[tracing::instrument(skip(state))]
pub async fn get<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let aggregate_id = parse_aggregate_id(&id)?;
    let order = state
        .order_service
        .get_order(aggregate_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Order {id} not found")))?;

    Ok(Json(OrderResponse {
        id: aggregate_id.to_string(),
        buyer_id: order
            .buyer_id()
            .map(|b| b.to_string())
            .unwrap_or_default(),
        seller_id: order
            .seller_id()
            .map(|s| s.to_string())
            .unwrap_or_default(),
        product_id: order
            .product_id()
            .map(|p| p.to_string())
            .unwrap_or_default(),
        product_name: order.product_name().to_string(),
        quantity: order.quantity(),
        unit_price_kobo: order.unit_price().kobo(),
        total_kobo: order.total().kobo(),
        total: order.total().to_string(),
        currency: order.currency().to_string(),
        status: order.status(),
        payment_status: order.payment_status(),
        payment_provider: order.payment_provider().map(String::from),
        transaction_reference: order.transaction_reference().map(String::from),
        shipping_address: order.shipping_address().clone(),
        notes: order.notes().map(String::from),
        placed_at: order.placed_at(),
        confirmed_at: order.confirmed_at(),
        delivered_at: order.delivered_at(),
    }))
}
