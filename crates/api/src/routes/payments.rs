//! Payment gateway callback endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use dispatch::ConfirmationOutcome;
use event_store::EventStore;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

use super::parse_aggregate_id;

#[derive(Deserialize)]
pub struct PaymentConfirmedRequest {
    pub order_id: String,
    pub reference: String,
    pub provider: Option<String>,
}

#[derive(Serialize)]
pub struct PaymentConfirmedResponse {
    pub order_id: String,
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
}

/// POST /payments/confirmed — gateway signal that funds settled.
///
/// Idempotent: a retry or duplicate delivery answers 200 with the
/// `already_confirmed` outcome and no new side effects.
#[tracing::instrument(skip(state, req))]
pub async fn confirmed<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<PaymentConfirmedRequest>,
) -> Result<Json<PaymentConfirmedResponse>, ApiError> {
    let order_id = parse_aggregate_id(&req.order_id)?;

    let outcome = state
        .confirmation
        .on_payment_confirmed(order_id, &req.reference, req.provider.as_deref())
        .await?;

    let response = match outcome {
        ConfirmationOutcome::Confirmed { job_id } => PaymentConfirmedResponse {
            order_id: req.order_id,
            outcome: "confirmed",
            job_id: Some(job_id.to_string()),
        },
        ConfirmationOutcome::AlreadyConfirmed => PaymentConfirmedResponse {
            order_id: req.order_id,
            outcome: "already_confirmed",
            job_id: None,
        },
    };

    Ok(Json(response))
}
