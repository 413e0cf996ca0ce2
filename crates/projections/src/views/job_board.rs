//! Job board read model — delivery jobs by availability and assignee.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{AggregateId, UserId};
use domain::{Address, DeliveryJobEvent, JobStatus};
use event_store::EventEnvelope;
use tokio::sync::RwLock;

use crate::Result;
use crate::projection::{Projection, ProjectionPosition};
use crate::read_model::ReadModel;

/// Summary of a delivery job on the board.
#[derive(Debug, Clone)]
pub struct JobSummary {
    pub job_id: AggregateId,
    pub order_id: AggregateId,
    pub buyer_id: UserId,
    pub status: JobStatus,
    pub assigned_agent_id: Option<UserId>,
    pub pickup_address: Address,
    pub delivery_address: Address,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

/// Internal state for the job board view.
struct JobBoardState {
    jobs: HashMap<AggregateId, JobSummary>,
    /// Maps order_id -> job_id so order views can find the job.
    order_index: HashMap<AggregateId, AggregateId>,
    position: ProjectionPosition,
}

/// Read model view for the delivery job board.
///
/// Unclaimed jobs are listed oldest first so agents drain the backlog
/// in arrival order; an agent's own jobs are listed newest first.
#[derive(Clone)]
pub struct JobBoardView {
    state: Arc<RwLock<JobBoardState>>,
}

impl JobBoardView {
    /// Creates a new empty job board view.
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(JobBoardState {
                jobs: HashMap::new(),
                order_index: HashMap::new(),
                position: ProjectionPosition::zero(),
            })),
        }
    }

    /// Gets a specific job.
    pub async fn get_job(&self, job_id: AggregateId) -> Option<JobSummary> {
        self.state.read().await.jobs.get(&job_id).cloned()
    }

    /// Gets the job created for a specific order, if one exists.
    pub async fn job_for_order(&self, order_id: AggregateId) -> Option<JobSummary> {
        let state = self.state.read().await;
        let job_id = state.order_index.get(&order_id)?;
        state.jobs.get(job_id).cloned()
    }

    /// Gets all unclaimed jobs, oldest first.
    pub async fn available_jobs(&self) -> Vec<JobSummary> {
        let mut jobs: Vec<_> = self
            .state
            .read()
            .await
            .jobs
            .values()
            .filter(|j| j.status == JobStatus::Pending)
            .cloned()
            .collect();
        jobs.sort_by_key(|j| j.created_at);
        jobs
    }

    /// Gets the jobs assigned to a specific agent, newest first.
    pub async fn jobs_for_agent(&self, agent_id: UserId) -> Vec<JobSummary> {
        let mut jobs: Vec<_> = self
            .state
            .read()
            .await
            .jobs
            .values()
            .filter(|j| j.assigned_agent_id == Some(agent_id))
            .cloned()
            .collect();
        jobs.sort_by_key(|j| std::cmp::Reverse(j.created_at));
        jobs
    }

    /// Gets all jobs on the board.
    pub async fn all_jobs(&self) -> Vec<JobSummary> {
        self.state.read().await.jobs.values().cloned().collect()
    }
}

impl Default for JobBoardView {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Projection for JobBoardView {
    fn name(&self) -> &'static str {
        "JobBoardView"
    }

    async fn handle(&self, event: &EventEnvelope) -> Result<()> {
        if event.aggregate_type != "DeliveryJob" {
            let mut state = self.state.write().await;
            state.position = state.position.advance();
            return Ok(());
        }

        let job_event: DeliveryJobEvent = serde_json::from_value(event.payload.clone())?;
        let job_id = event.aggregate_id;

        let mut state = self.state.write().await;

        match job_event {
            DeliveryJobEvent::DeliveryJobCreated(data) => {
                state.order_index.insert(data.order_id, job_id);
                state.jobs.insert(
                    job_id,
                    JobSummary {
                        job_id,
                        order_id: data.order_id,
                        buyer_id: data.buyer_id,
                        status: JobStatus::Pending,
                        assigned_agent_id: None,
                        pickup_address: data.pickup_address,
                        delivery_address: data.delivery_address,
                        notes: data.notes,
                        created_at: data.created_at,
                        assigned_at: None,
                        completed_at: None,
                        updated_at: data.created_at,
                    },
                );
            }
            DeliveryJobEvent::DeliveryJobClaimed(data) => {
                if let Some(job) = state.jobs.get_mut(&job_id) {
                    job.status = JobStatus::Assigned;
                    job.assigned_agent_id = Some(data.agent_id);
                    job.assigned_at = Some(data.assigned_at);
                    job.updated_at = data.assigned_at;
                }
            }
            DeliveryJobEvent::DeliveryJobPickedUp(data) => {
                if let Some(job) = state.jobs.get_mut(&job_id) {
                    job.status = JobStatus::PickedUp;
                    job.updated_at = data.picked_up_at;
                }
            }
            DeliveryJobEvent::DeliveryJobInTransit(data) => {
                if let Some(job) = state.jobs.get_mut(&job_id) {
                    job.status = JobStatus::InTransit;
                    job.updated_at = data.departed_at;
                }
            }
            DeliveryJobEvent::DeliveryJobDelivered(data) => {
                if let Some(job) = state.jobs.get_mut(&job_id) {
                    job.status = JobStatus::Delivered;
                    job.completed_at = Some(data.delivered_at);
                    job.updated_at = data.delivered_at;
                }
            }
        }

        state.position = state.position.advance();
        Ok(())
    }

    async fn position(&self) -> ProjectionPosition {
        self.state.read().await.position
    }

    async fn reset(&self) -> Result<()> {
        let mut state = self.state.write().await;
        state.jobs.clear();
        state.order_index.clear();
        state.position = ProjectionPosition::zero();
        Ok(())
    }
}

impl ReadModel for JobBoardView {
    fn name(&self) -> &'static str {
        "JobBoardView"
    }

    fn count(&self) -> usize {
        self.state.try_read().map(|s| s.jobs.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use domain::{DeliveryJobCreatedData, DomainEvent};

    fn make_envelope(
        aggregate_id: AggregateId,
        version: i64,
        event: &DeliveryJobEvent,
    ) -> EventEnvelope {
        EventEnvelope::builder()
            .aggregate_id(aggregate_id)
            .aggregate_type("DeliveryJob")
            .event_type(event.event_type())
            .version(event_store::Version::new(version))
            .payload(event)
            .unwrap()
            .build()
    }

    fn pickup() -> Address {
        Address::new("Musa Bello", "7 Farm Lane", "Kano", "Kano", "+2348098765432")
    }

    fn dropoff() -> Address {
        Address::new("Ada Obi", "14 Market Road", "Aba", "Abia", "+2348012345678")
    }

    fn created_event(
        job_id: AggregateId,
        order_id: AggregateId,
        created_at: DateTime<Utc>,
    ) -> DeliveryJobEvent {
        DeliveryJobEvent::DeliveryJobCreated(DeliveryJobCreatedData {
            job_id,
            order_id,
            buyer_id: UserId::new(),
            pickup_address: pickup(),
            delivery_address: dropoff(),
            notes: None,
            created_at,
        })
    }

    async fn create_job(view: &JobBoardView, job_id: AggregateId, order_id: AggregateId) {
        let event = created_event(job_id, order_id, Utc::now());
        view.handle(&make_envelope(job_id, 1, &event)).await.unwrap();
    }

    #[tokio::test]
    async fn test_created_job_is_available() {
        let view = JobBoardView::new();
        let job_id = AggregateId::new();
        let order_id = AggregateId::new();

        create_job(&view, job_id, order_id).await;

        let available = view.available_jobs().await;
        assert_eq!(available.len(), 1);
        assert_eq!(available[0].job_id, job_id);
        assert_eq!(available[0].status, JobStatus::Pending);
        assert!(available[0].assigned_agent_id.is_none());
    }

    #[tokio::test]
    async fn test_claimed_job_leaves_the_available_list() {
        let view = JobBoardView::new();
        let job_id = AggregateId::new();

        create_job(&view, job_id, AggregateId::new()).await;

        let agent_id = UserId::new();
        let event = DeliveryJobEvent::claimed(agent_id);
        view.handle(&make_envelope(job_id, 2, &event)).await.unwrap();

        assert!(view.available_jobs().await.is_empty());

        let mine = view.jobs_for_agent(agent_id).await;
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].status, JobStatus::Assigned);
        assert!(mine[0].assigned_at.is_some());
    }

    #[tokio::test]
    async fn test_available_jobs_sorted_oldest_first() {
        let view = JobBoardView::new();
        let older = AggregateId::new();
        let newer = AggregateId::new();
        let now = Utc::now();

        let event = created_event(newer, AggregateId::new(), now);
        view.handle(&make_envelope(newer, 1, &event)).await.unwrap();

        let event = created_event(older, AggregateId::new(), now - Duration::minutes(10));
        view.handle(&make_envelope(older, 1, &event)).await.unwrap();

        let available = view.available_jobs().await;
        assert_eq!(available.len(), 2);
        assert_eq!(available[0].job_id, older);
        assert_eq!(available[1].job_id, newer);
    }

    #[tokio::test]
    async fn test_agent_jobs_sorted_newest_first() {
        let view = JobBoardView::new();
        let agent_id = UserId::new();
        let older = AggregateId::new();
        let newer = AggregateId::new();
        let now = Utc::now();

        let event = created_event(older, AggregateId::new(), now - Duration::minutes(10));
        view.handle(&make_envelope(older, 1, &event)).await.unwrap();
        let event = created_event(newer, AggregateId::new(), now);
        view.handle(&make_envelope(newer, 1, &event)).await.unwrap();

        for job_id in [older, newer] {
            let event = DeliveryJobEvent::claimed(agent_id);
            view.handle(&make_envelope(job_id, 2, &event)).await.unwrap();
        }

        let mine = view.jobs_for_agent(agent_id).await;
        assert_eq!(mine.len(), 2);
        assert_eq!(mine[0].job_id, newer);
        assert_eq!(mine[1].job_id, older);
    }

    #[tokio::test]
    async fn test_job_found_by_order() {
        let view = JobBoardView::new();
        let job_id = AggregateId::new();
        let order_id = AggregateId::new();

        create_job(&view, job_id, order_id).await;

        let job = view.job_for_order(order_id).await.unwrap();
        assert_eq!(job.job_id, job_id);
        assert!(view.job_for_order(AggregateId::new()).await.is_none());
    }

    #[tokio::test]
    async fn test_full_chain_reflected_on_board() {
        let view = JobBoardView::new();
        let job_id = AggregateId::new();

        create_job(&view, job_id, AggregateId::new()).await;

        let agent_id = UserId::new();
        let chain = [
            DeliveryJobEvent::claimed(agent_id),
            DeliveryJobEvent::picked_up(),
            DeliveryJobEvent::in_transit(),
            DeliveryJobEvent::delivered(),
        ];
        for (i, event) in chain.iter().enumerate() {
            view.handle(&make_envelope(job_id, (i + 2) as i64, event))
                .await
                .unwrap();
        }

        let job = view.get_job(job_id).await.unwrap();
        assert_eq!(job.status, JobStatus::Delivered);
        assert!(job.completed_at.is_some());

        // Delivered jobs stay on the agent's list but not the available one
        assert!(view.available_jobs().await.is_empty());
        assert_eq!(view.jobs_for_agent(agent_id).await.len(), 1);
    }

    #[tokio::test]
    async fn test_other_aggregate_events_only_advance_position() {
        let view = JobBoardView::new();

        let envelope = EventEnvelope::builder()
            .aggregate_id(AggregateId::new())
            .aggregate_type("Order")
            .event_type("OrderPlaced")
            .version(event_store::Version::new(1))
            .payload_raw(serde_json::json!({"ignored": true}))
            .build();
        view.handle(&envelope).await.unwrap();

        assert_eq!(view.position().await.events_processed, 1);
        assert!(view.all_jobs().await.is_empty());
    }

    #[tokio::test]
    async fn test_reset() {
        let view = JobBoardView::new();
        let job_id = AggregateId::new();
        let order_id = AggregateId::new();

        create_job(&view, job_id, order_id).await;
        assert_eq!(view.available_jobs().await.len(), 1);

        view.reset().await.unwrap();

        assert!(view.get_job(job_id).await.is_none());
        assert!(view.job_for_order(order_id).await.is_none());
        assert_eq!(view.position().await.events_processed, 0);
    }
}
