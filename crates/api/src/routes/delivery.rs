//! Delivery job board, claim and lifecycle endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use chrono::{DateTime, Utc};
use domain::{Address, DeliveryJob, JobStatus};
use event_store::EventStore;
use projections::JobSummary;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

use super::{parse_aggregate_id, parse_user_id};

// -- Request types --

#[derive(Deserialize)]
pub struct ClaimRequest {
    pub agent_id: String,
}

#[derive(Deserialize)]
pub struct AdvanceRequest {
    pub agent_id: String,
    pub target: JobStatus,
}

// -- Response types --

#[derive(Serialize)]
pub struct JobResponse {
    pub job_id: String,
    pub order_id: String,
    pub buyer_id: String,
    pub status: JobStatus,
    pub assigned_agent_id: Option<String>,
    pub pickup_address: Address,
    pub delivery_address: Address,
    pub notes: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl JobResponse {
    fn from_aggregate(job_id: String, job: &DeliveryJob) -> Self {
        Self {
            job_id,
            order_id: job
                .order_id()
                .map(|o| o.to_string())
                .unwrap_or_default(),
            buyer_id: job
                .buyer_id()
                .map(|b| b.to_string())
                .unwrap_or_default(),
            status: job.status(),
            assigned_agent_id: job.assigned_agent_id().map(|a| a.to_string()),
            pickup_address: job.pickup_address().clone(),
            delivery_address: job.delivery_address().clone(),
            notes: job.notes().map(String::from),
            created_at: job.created_at(),
            assigned_at: job.assigned_at(),
            completed_at: job.completed_at(),
        }
    }
}

#[derive(Serialize)]
pub struct JobSummaryResponse {
    pub job_id: String,
    pub order_id: String,
    pub buyer_id: String,
    pub status: JobStatus,
    pub assigned_agent_id: Option<String>,
    pub pickup_address: Address,
    pub delivery_address: Address,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<JobSummary> for JobSummaryResponse {
    fn from(summary: JobSummary) -> Self {
        Self {
            job_id: summary.job_id.to_string(),
            order_id: summary.order_id.to_string(),
            buyer_id: summary.buyer_id.to_string(),
            status: summary.status,
            assigned_agent_id: summary.assigned_agent_id.map(|a| a.to_string()),
            pickup_address: summary.pickup_address,
            delivery_address: summary.delivery_address,
            notes: summary.notes,
            created_at: summary.created_at,
            assigned_at: summary.assigned_at,
            completed_at: summary.completed_at,
        }
    }
}

// -- Handlers --

/// GET /delivery/jobs/available — unclaimed jobs, oldest first.
#[tracing::instrument(skip(state))]
pub async fn available<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<JobSummaryResponse>>, ApiError> {
    state
        .projection_processor
        .run_catch_up()
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let jobs = state.registry.list_available().await;
    Ok(Json(jobs.into_iter().map(Into::into).collect()))
}

/// POST /delivery/jobs/:id/claim — claim a pending job for an agent.
#[tracing::instrument(skip(state, req))]
pub async fn claim<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<ClaimRequest>,
) -> Result<Json<JobResponse>, ApiError> {
    let job_id = parse_aggregate_id(&id)?;
    let agent_id = parse_user_id(&req.agent_id)?;

    let job = state.registry.claim(job_id, agent_id).await?;
    Ok(Json(JobResponse::from_aggregate(id, &job)))
}

/// POST /delivery/jobs/:id/advance — move a claimed job one step.
#[tracing::instrument(skip(state, req))]
pub async fn advance<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<AdvanceRequest>,
) -> Result<Json<JobResponse>, ApiError> {
    let job_id = parse_aggregate_id(&id)?;
    let agent_id = parse_user_id(&req.agent_id)?;

    let job = state.lifecycle.advance(job_id, agent_id, req.target).await?;
    Ok(Json(JobResponse::from_aggregate(id, &job)))
}

/// GET /delivery/agents/:id/jobs — an agent's jobs, newest first.
#[tracing::instrument(skip(state))]
pub async fn agent_jobs<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<JobSummaryResponse>>, ApiError> {
    let agent_id = parse_user_id(&id)?;

    state
        .projection_processor
        .run_catch_up()
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let jobs = state.registry.list_for_agent(agent_id).await;
    Ok(Json(jobs.into_iter().map(Into::into).collect()))
}
