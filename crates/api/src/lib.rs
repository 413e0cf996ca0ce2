//! HTTP API server for the fulfillment and dispatch engine.
//!
//! Exposes checkout, the payment-confirmed callback, the delivery job
//! board, dashboards, notification feeds and the reconciliation trigger,
//! with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use event_store::EventStore;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use state::{AppState, create_default_state};

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: EventStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/users", post(routes::users::register::<S>))
        .route("/users/{id}", get(routes::users::get::<S>))
        .route("/orders", post(routes::orders::create::<S>))
        .route("/orders/{id}", get(routes::orders::get::<S>))
        .route("/payments/confirmed", post(routes::payments::confirmed::<S>))
        .route(
            "/delivery/jobs/available",
            get(routes::delivery::available::<S>),
        )
        .route("/delivery/jobs/{id}/claim", post(routes::delivery::claim::<S>))
        .route(
            "/delivery/jobs/{id}/advance",
            post(routes::delivery::advance::<S>),
        )
        .route(
            "/delivery/agents/{id}/jobs",
            get(routes::delivery::agent_jobs::<S>),
        )
        .route(
            "/dashboard/admin/orders",
            get(routes::dashboards::admin_orders::<S>),
        )
        .route(
            "/dashboard/sellers/{id}/orders",
            get(routes::dashboards::seller_orders::<S>),
        )
        .route(
            "/dashboard/buyers/{id}/stats",
            get(routes::dashboards::buyer_stats::<S>),
        )
        .route(
            "/notifications/read-all",
            post(routes::notifications::read_all::<S>),
        )
        .route("/notifications/{id}", get(routes::notifications::list::<S>))
        .route(
            "/notifications/{id}/unread-count",
            get(routes::notifications::unread_count::<S>),
        )
        .route(
            "/notifications/{id}/read",
            post(routes::notifications::mark_read::<S>),
        )
        .route(
            "/notifications/{id}/stream",
            get(routes::notifications::stream::<S>),
        )
        .route("/admin/reconcile", post(routes::admin::reconcile::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
