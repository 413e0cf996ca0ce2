//! User directory endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::UserId;
use dispatch::{Role, UserRecord};
use domain::Address;
use event_store::EventStore;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

use super::parse_user_id;

#[derive(Deserialize)]
pub struct RegisterUserRequest {
    pub user_id: Option<String>,
    pub name: String,
    pub roles: Vec<Role>,
    pub pickup_address: Option<Address>,
}

#[derive(Serialize)]
pub struct UserResponse {
    pub user_id: String,
    pub name: String,
    pub roles: Vec<Role>,
    pub pickup_address: Option<Address>,
    pub registered_at: DateTime<Utc>,
}

impl From<UserRecord> for UserResponse {
    fn from(record: UserRecord) -> Self {
        Self {
            user_id: record.user_id.to_string(),
            name: record.name,
            roles: record.roles,
            pickup_address: record.pickup_address,
            registered_at: record.registered_at,
        }
    }
}

/// POST /users — register a user and greet them.
#[tracing::instrument(skip(state, req))]
pub async fn register<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<RegisterUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let user_id = match &req.user_id {
        Some(id) => parse_user_id(id)?,
        None => UserId::new(),
    };
    if req.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Name must not be empty".to_string()));
    }

    let mut record = UserRecord::new(user_id, req.name, req.roles);
    if let Some(address) = req.pickup_address {
        record = record.with_pickup_address(address);
    }
    state.directory.register(record.clone());

    state.notifier.send_welcome(user_id).await?;
    tracing::info!(%user_id, "user registered");

    Ok((StatusCode::CREATED, Json(record.into())))
}

/// GET /users/:id — look up a registered user.
#[tracing::instrument(skip(state))]
pub async fn get<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    let user_id = parse_user_id(&id)?;

    let record = state
        .directory
        .user(user_id)
        .ok_or_else(|| ApiError::NotFound(format!("User {id} not found")))?;

    Ok(Json(record.into()))
}
