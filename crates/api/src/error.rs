//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use dispatch::DispatchError;
use domain::{DeliveryJobError, DomainError, OrderError};
use event_store::EventStoreError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Orchestration error from the dispatch layer.
    Dispatch(DispatchError),
    /// Domain logic error.
    Domain(DomainError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Dispatch(err) => dispatch_error_to_response(err),
            ApiError::Domain(err) => domain_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn dispatch_error_to_response(err: DispatchError) -> (StatusCode, String) {
    match err {
        DispatchError::Domain(inner) => domain_error_to_response(inner),
        err => {
            let status = match &err {
                DispatchError::OrderNotFound(_)
                | DispatchError::JobNotFound(_)
                | DispatchError::UnknownRecipient { .. } => StatusCode::NOT_FOUND,
                DispatchError::ClaimConflict { .. } => StatusCode::CONFLICT,
                DispatchError::PermissionDenied { .. } => StatusCode::FORBIDDEN,
                DispatchError::EventStore(EventStoreError::ConcurrencyConflict { .. }) => {
                    StatusCode::CONFLICT
                }
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (status, err.to_string())
        }
    }
}

fn domain_error_to_response(err: DomainError) -> (StatusCode, String) {
    match &err {
        DomainError::Order(order_err) => match order_err {
            OrderError::NotPlaced => (StatusCode::NOT_FOUND, err.to_string()),
            OrderError::AlreadyPlaced
            | OrderError::AlreadyConfirmed { .. }
            | OrderError::PaymentNotCompleted
            | OrderError::AlreadyTerminal { .. } => (StatusCode::CONFLICT, err.to_string()),
            OrderError::InvalidQuantity { .. } | OrderError::InvalidPrice { .. } => {
                (StatusCode::BAD_REQUEST, err.to_string())
            }
        },
        DomainError::Delivery(job_err) => match job_err {
            DeliveryJobError::NotCreated => (StatusCode::NOT_FOUND, err.to_string()),
            // The assignee check is a capability question, not a state one
            DeliveryJobError::NotAssignee { .. } => (StatusCode::FORBIDDEN, err.to_string()),
            DeliveryJobError::AlreadyCreated
            | DeliveryJobError::AlreadyClaimed { .. }
            | DeliveryJobError::InvalidTransition { .. }
            | DeliveryJobError::TerminalState { .. } => (StatusCode::CONFLICT, err.to_string()),
        },
        DomainError::AggregateNotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),
        DomainError::EventStore(EventStoreError::ConcurrencyConflict { .. }) => {
            (StatusCode::CONFLICT, err.to_string())
        }
        _ => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}

impl From<DispatchError> for ApiError {
    fn from(err: DispatchError) -> Self {
        ApiError::Dispatch(err)
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}
