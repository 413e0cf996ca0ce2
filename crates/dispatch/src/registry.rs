//! Delivery job registry: the pool agents claim from.

use common::{AggregateId, UserId};
use domain::{
    ClaimDeliveryJob, DeliveryJob, DeliveryJobError, DeliveryJobService, DomainError,
};
use event_store::{EventStore, EventStoreError};
use projections::{JobBoardView, JobSummary};

use crate::error::{DispatchError, Result};
use crate::notify::{NotificationDispatcher, NotificationKind};
use crate::services::directory::{Role, UserDirectory};
use crate::services::notifications::NotificationStore;

/// Lists and claims delivery jobs.
///
/// Listings are served from the job-board projection and never touch
/// the event streams. The claim itself is a conditional append on the
/// job's stream: with any number of concurrent claimers exactly one
/// append lands, and every other caller gets
/// [`DispatchError::ClaimConflict`] whether it lost the version race
/// or loaded a job an earlier winner had already taken.
pub struct DeliveryJobRegistry<S, D, N>
where
    S: EventStore,
    D: UserDirectory,
    N: NotificationStore,
{
    jobs: DeliveryJobService<S>,
    board: JobBoardView,
    directory: D,
    notifier: NotificationDispatcher<D, N>,
}

impl<S, D, N> DeliveryJobRegistry<S, D, N>
where
    S: EventStore + Clone,
    D: UserDirectory + Clone,
    N: NotificationStore,
{
    /// Creates a new registry over the given store, job board and services.
    pub fn new(store: S, board: JobBoardView, directory: D, notifications: N) -> Self {
        let jobs = DeliveryJobService::new(store);
        let notifier = NotificationDispatcher::new(directory.clone(), notifications);
        Self {
            jobs,
            board,
            directory,
            notifier,
        }
    }

    /// Returns every unclaimed job, oldest first.
    ///
    /// First-come dispatch: agents drain the pool in arrival order.
    pub async fn list_available(&self) -> Vec<JobSummary> {
        self.board.available_jobs().await
    }

    /// Returns the jobs ever assigned to an agent, newest first.
    pub async fn list_for_agent(&self, agent_id: UserId) -> Vec<JobSummary> {
        self.board.jobs_for_agent(agent_id).await
    }

    /// Claims a pending job for an agent.
    ///
    /// The caller must hold the delivery-agent role. The winner gets
    /// the updated job and a notification with the pickup and delivery
    /// details; every loser gets [`DispatchError::ClaimConflict`].
    #[tracing::instrument(skip(self), fields(%job_id, %agent_id))]
    pub async fn claim(&self, job_id: AggregateId, agent_id: UserId) -> Result<DeliveryJob> {
        if !self.directory.has_role(agent_id, Role::DeliveryAgent).await {
            return Err(DispatchError::PermissionDenied {
                user_id: agent_id,
                required: Role::DeliveryAgent,
            });
        }

        metrics::counter!("job_claims_total").increment(1);

        let result = self
            .jobs
            .claim_job(ClaimDeliveryJob::new(job_id, agent_id))
            .await;

        let job = match result {
            Ok(result) => result.aggregate,
            Err(DomainError::Delivery(DeliveryJobError::NotCreated)) => {
                return Err(DispatchError::JobNotFound(job_id));
            }
            Err(
                DomainError::Delivery(DeliveryJobError::AlreadyClaimed { .. })
                | DomainError::EventStore(EventStoreError::ConcurrencyConflict { .. }),
            ) => {
                tracing::info!(%job_id, %agent_id, "claim lost to another agent");
                metrics::counter!("job_claim_conflicts_total").increment(1);
                return Err(DispatchError::ClaimConflict { job_id });
            }
            Err(e) => return Err(e.into()),
        };

        tracing::info!(%job_id, %agent_id, "job claimed");

        self.notifier
            .notify_or_log(
                agent_id,
                NotificationKind::DeliveryJob,
                "Delivery job assigned to you",
                format!(
                    "Pick up from {}. Deliver to {}.",
                    job.pickup_address(),
                    job.delivery_address()
                ),
                serde_json::json!({
                    "job_id": job_id,
                    "order_id": job.order_id(),
                }),
            )
            .await;

        Ok(job)
    }
}
