//! Delivery job service providing a simplified API for job operations.

use common::AggregateId;
use event_store::EventStore;

use crate::command::{CommandHandler, CommandResult};
use crate::error::DomainError;

use super::{AdvanceDeliveryJob, ClaimDeliveryJob, CreateDeliveryJob, DeliveryJob};

impl From<super::DeliveryJobError> for DomainError {
    fn from(e: super::DeliveryJobError) -> Self {
        DomainError::Delivery(e)
    }
}

/// Service for managing delivery jobs.
///
/// Wraps the command handler for the `DeliveryJob` aggregate. Claim
/// races surface here as `EventStoreError::ConcurrencyConflict` (lost
/// the append) or `DeliveryJobError::AlreadyClaimed` (loaded a job an
/// earlier winner had taken); the dispatch layer folds both into one
/// claim-conflict answer.
pub struct DeliveryJobService<S: EventStore> {
    handler: CommandHandler<S, DeliveryJob>,
}

impl<S: EventStore> DeliveryJobService<S> {
    /// Creates a new delivery job service with the given event store.
    pub fn new(store: S) -> Self {
        Self {
            handler: CommandHandler::new(store),
        }
    }

    /// Returns a reference to the underlying command handler.
    pub fn handler(&self) -> &CommandHandler<S, DeliveryJob> {
        &self.handler
    }

    /// Creates a delivery job for a confirmed order.
    #[tracing::instrument(skip(self, cmd), fields(job_id = %cmd.job_id, order_id = %cmd.order_id))]
    pub async fn create_job(
        &self,
        cmd: CreateDeliveryJob,
    ) -> Result<CommandResult<DeliveryJob>, DomainError> {
        let job_id = cmd.job_id;
        let order_id = cmd.order_id;
        let buyer_id = cmd.buyer_id;
        let pickup_address = cmd.pickup_address.clone();
        let delivery_address = cmd.delivery_address.clone();
        let notes = cmd.notes.clone();

        self.handler
            .execute(job_id, |job| {
                job.create(
                    job_id,
                    order_id,
                    buyer_id,
                    pickup_address,
                    delivery_address,
                    notes,
                )
            })
            .await
    }

    /// Claims a pending job for an agent.
    #[tracing::instrument(skip(self))]
    pub async fn claim_job(
        &self,
        cmd: ClaimDeliveryJob,
    ) -> Result<CommandResult<DeliveryJob>, DomainError> {
        let agent_id = cmd.agent_id;

        self.handler
            .execute(cmd.job_id, |job| job.claim(agent_id))
            .await
    }

    /// Advances a claimed job one step along the delivery chain.
    #[tracing::instrument(skip(self))]
    pub async fn advance_job(
        &self,
        cmd: AdvanceDeliveryJob,
    ) -> Result<CommandResult<DeliveryJob>, DomainError> {
        let agent_id = cmd.agent_id;
        let target = cmd.target;

        self.handler
            .execute(cmd.job_id, |job| job.advance(agent_id, target))
            .await
    }

    /// Loads a delivery job by ID.
    ///
    /// Returns None if the job doesn't exist.
    #[tracing::instrument(skip(self))]
    pub async fn get_job(&self, job_id: AggregateId) -> Result<Option<DeliveryJob>, DomainError> {
        self.handler.load_existing(job_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::Aggregate;
    use crate::delivery::{DeliveryJobError, JobStatus};
    use crate::order::Address;
    use common::UserId;
    use event_store::InMemoryEventStore;

    fn make_create(order_id: AggregateId, buyer_id: UserId) -> CreateDeliveryJob {
        CreateDeliveryJob::for_order(
            order_id,
            buyer_id,
            Address::new("Musa Bello", "7 Farm Lane", "Kano", "Kano", "+2348098765432"),
            Address::new("Ada Obi", "14 Market Road", "Aba", "Abia", "+2348012345678"),
        )
    }

    #[tokio::test]
    async fn test_create_job() {
        let store = InMemoryEventStore::new();
        let service = DeliveryJobService::new(store);

        let order_id = AggregateId::new();
        let buyer_id = UserId::new();
        let cmd = make_create(order_id, buyer_id);
        let job_id = cmd.job_id;

        let result = service.create_job(cmd).await.unwrap();

        assert_eq!(result.aggregate.id(), Some(job_id));
        assert_eq!(result.aggregate.order_id(), Some(order_id));
        assert_eq!(result.aggregate.status(), JobStatus::Pending);
        assert!(result.aggregate.is_available());
    }

    #[tokio::test]
    async fn test_claim_job() {
        let store = InMemoryEventStore::new();
        let service = DeliveryJobService::new(store);

        let cmd = make_create(AggregateId::new(), UserId::new());
        let job_id = cmd.job_id;
        service.create_job(cmd).await.unwrap();

        let agent_id = UserId::new();
        let result = service
            .claim_job(ClaimDeliveryJob::new(job_id, agent_id))
            .await
            .unwrap();

        assert_eq!(result.aggregate.status(), JobStatus::Assigned);
        assert_eq!(result.aggregate.assigned_agent_id(), Some(agent_id));
    }

    #[tokio::test]
    async fn test_second_claim_fails() {
        let store = InMemoryEventStore::new();
        let service = DeliveryJobService::new(store);

        let cmd = make_create(AggregateId::new(), UserId::new());
        let job_id = cmd.job_id;
        service.create_job(cmd).await.unwrap();

        service
            .claim_job(ClaimDeliveryJob::new(job_id, UserId::new()))
            .await
            .unwrap();

        let result = service
            .claim_job(ClaimDeliveryJob::new(job_id, UserId::new()))
            .await;

        assert!(matches!(
            result,
            Err(DomainError::Delivery(DeliveryJobError::AlreadyClaimed { .. }))
        ));
    }

    #[tokio::test]
    async fn test_advance_full_chain() {
        let store = InMemoryEventStore::new();
        let service = DeliveryJobService::new(store);

        let cmd = make_create(AggregateId::new(), UserId::new());
        let job_id = cmd.job_id;
        service.create_job(cmd).await.unwrap();

        let agent_id = UserId::new();
        service
            .claim_job(ClaimDeliveryJob::new(job_id, agent_id))
            .await
            .unwrap();

        for target in [JobStatus::PickedUp, JobStatus::InTransit, JobStatus::Delivered] {
            service
                .advance_job(AdvanceDeliveryJob::new(job_id, agent_id, target))
                .await
                .unwrap();
        }

        let job = service.get_job(job_id).await.unwrap().unwrap();
        assert_eq!(job.status(), JobStatus::Delivered);
        assert!(job.completed_at().is_some());
    }

    #[tokio::test]
    async fn test_advance_skipping_a_step_fails() {
        let store = InMemoryEventStore::new();
        let service = DeliveryJobService::new(store);

        let cmd = make_create(AggregateId::new(), UserId::new());
        let job_id = cmd.job_id;
        service.create_job(cmd).await.unwrap();

        let agent_id = UserId::new();
        service
            .claim_job(ClaimDeliveryJob::new(job_id, agent_id))
            .await
            .unwrap();

        let result = service
            .advance_job(AdvanceDeliveryJob::new(
                job_id,
                agent_id,
                JobStatus::Delivered,
            ))
            .await;

        assert!(matches!(
            result,
            Err(DomainError::Delivery(
                DeliveryJobError::InvalidTransition { .. }
            ))
        ));
    }

    #[tokio::test]
    async fn test_get_job() {
        let store = InMemoryEventStore::new();
        let service = DeliveryJobService::new(store);

        let result = service.get_job(AggregateId::new()).await.unwrap();
        assert!(result.is_none());

        let cmd = make_create(AggregateId::new(), UserId::new());
        let job_id = cmd.job_id;
        service.create_job(cmd).await.unwrap();

        let result = service.get_job(job_id).await.unwrap();
        assert!(result.is_some());
    }
}
