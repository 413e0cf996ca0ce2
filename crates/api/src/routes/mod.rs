//! HTTP route handlers.

pub mod admin;
pub mod dashboards;
pub mod delivery;
pub mod health;
pub mod metrics;
pub mod notifications;
pub mod orders;
pub mod payments;
pub mod users;

use common::{AggregateId, UserId};

use crate::error::ApiError;

pub(crate) fn parse_aggregate_id(id: &str) -> Result<AggregateId, ApiError> {
    let uuid = uuid::Uuid::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid ID format: {e}")))?;
    Ok(AggregateId::from(uuid))
}

pub(crate) fn parse_user_id(id: &str) -> Result<UserId, ApiError> {
    let uuid = uuid::Uuid::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid user ID format: {e}")))?;
    Ok(UserId::from(uuid))
}
