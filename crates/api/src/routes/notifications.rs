//! Notification feed endpoints, including the live SSE stream.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use chrono::{DateTime, Utc};
use dispatch::{Notification, NotificationKind, NotificationStore};
use event_store::EventStore;
use futures_util::Stream;
use futures_util::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::error::ApiError;
use crate::state::AppState;

use super::parse_user_id;

// -- Request types --

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    /// Only notifications with a sequence number above this are returned.
    pub after: Option<u64>,
}

#[derive(Deserialize)]
pub struct RecipientRequest {
    pub user_id: String,
}

// -- Response types --

#[derive(Serialize)]
pub struct NotificationResponse {
    pub id: String,
    pub seq: u64,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub payload: serde_json::Value,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Notification> for NotificationResponse {
    fn from(notification: Notification) -> Self {
        Self {
            id: notification.id.to_string(),
            seq: notification.seq,
            kind: notification.kind,
            title: notification.title,
            message: notification.message,
            payload: notification.payload,
            read: notification.read,
            created_at: notification.created_at,
        }
    }
}

#[derive(Serialize)]
pub struct UnreadCountResponse {
    pub unread: usize,
}

#[derive(Serialize)]
pub struct MarkReadResponse {
    pub read: bool,
}

#[derive(Serialize)]
pub struct MarkAllReadResponse {
    pub marked: usize,
}

// -- Handlers --

/// GET /notifications/:user_id — a user's notifications, oldest first.
#[tracing::instrument(skip(state))]
pub async fn list<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Query(query): Query<FeedQuery>,
) -> Result<Json<Vec<NotificationResponse>>, ApiError> {
    let user_id = parse_user_id(&id)?;

    let notifications = state
        .notifications
        .for_recipient(user_id, query.after.unwrap_or(0))
        .await?;

    Ok(Json(notifications.into_iter().map(Into::into).collect()))
}

/// GET /notifications/:user_id/unread-count
#[tracing::instrument(skip(state))]
pub async fn unread_count<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<UnreadCountResponse>, ApiError> {
    let user_id = parse_user_id(&id)?;

    let unread = state.notifications.unread_count(user_id).await?;
    Ok(Json(UnreadCountResponse { unread }))
}

/// POST /notifications/:id/read — mark one notification read.
///
/// Only the recipient may flip the flag; anyone else sees a 404.
#[tracing::instrument(skip(state, req))]
pub async fn mark_read<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<RecipientRequest>,
) -> Result<Json<MarkReadResponse>, ApiError> {
    let notification_id = uuid::Uuid::parse_str(&id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid notification ID: {e}")))?;
    let user_id = parse_user_id(&req.user_id)?;

    let marked = state.notifications.mark_read(notification_id, user_id).await?;
    if !marked {
        return Err(ApiError::NotFound(format!("Notification {id} not found")));
    }

    Ok(Json(MarkReadResponse { read: true }))
}

/// POST /notifications/read-all — mark all of a user's notifications read.
#[tracing::instrument(skip(state, req))]
pub async fn read_all<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<RecipientRequest>,
) -> Result<Json<MarkAllReadResponse>, ApiError> {
    let user_id = parse_user_id(&req.user_id)?;

    let marked = state.notifications.mark_all_read(user_id).await?;
    Ok(Json(MarkAllReadResponse { marked }))
}

/// GET /notifications/:user_id/stream — live notification feed (SSE).
///
/// Replays the backlog above `after` first, then switches to live
/// delivery. Clients resume after a disconnect by passing the last
/// event id they saw as `after`.
#[tracing::instrument(skip(state))]
pub async fn stream<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Query(query): Query<FeedQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, ApiError> {
    let user_id = parse_user_id(&id)?;

    let (backlog, receiver) = state
        .notifications
        .subscribe(user_id, query.after.unwrap_or(0))
        .await?;

    let backlog = stream::iter(backlog).map(|n| sse_event(&n));
    let live = stream::unfold(receiver, |mut receiver| async move {
        loop {
            match receiver.recv().await {
                Ok(notification) => return Some((sse_event(&notification), receiver)),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "notification feed lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    });

    Ok(Sse::new(backlog.chain(live)).keep_alive(KeepAlive::default()))
}

fn sse_event(notification: &Notification) -> Result<Event, axum::Error> {
    Event::default()
        .id(notification.seq.to_string())
        .event("notification")
        .json_data(notification)
}
