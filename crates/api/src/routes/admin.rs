//! Operator endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use event_store::EventStore;
use serde::Serialize;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Serialize)]
pub struct ReconcileResponse {
    pub confirmed_orders: usize,
    pub orders_missing_jobs: usize,
    pub repaired_order_ids: Vec<String>,
    pub failed_order_ids: Vec<String>,
}

/// POST /admin/reconcile — repair confirmed orders without a job.
#[tracing::instrument(skip(state))]
pub async fn reconcile<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<ReconcileResponse>, ApiError> {
    let report = state.reconciler.run().await?;

    Ok(Json(ReconcileResponse {
        confirmed_orders: report.confirmed_orders,
        orders_missing_jobs: report.orders_missing_jobs,
        repaired_order_ids: report
            .repaired_order_ids
            .iter()
            .map(|id| id.to_string())
            .collect(),
        failed_order_ids: report
            .failed_order_ids
            .iter()
            .map(|id| id.to_string())
            .collect(),
    }))
}
