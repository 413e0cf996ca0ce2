//! Integration tests for the DeliveryJob aggregate.
//!
//! These tests verify job creation, the claim race, and the step-by-step
//! delivery state machine against a real (in-memory) event store.

use common::{AggregateId, UserId};
use domain::{
    Address, AdvanceDeliveryJob, Aggregate, ClaimDeliveryJob, CreateDeliveryJob, DeliveryJobError,
    DeliveryJobService, DomainError, JobStatus,
};
use event_store::{EventStore, EventStoreError, InMemoryEventStore};

fn pickup() -> Address {
    Address::new("Musa Bello", "7 Farm Lane", "Kano", "Kano", "+2348098765432")
}

fn dropoff() -> Address {
    Address::new("Ada Obi", "14 Market Road", "Aba", "Abia", "+2348012345678")
}

fn make_create() -> CreateDeliveryJob {
    CreateDeliveryJob::for_order(AggregateId::new(), UserId::new(), pickup(), dropoff())
}

mod job_lifecycle {
    use super::*;

    #[tokio::test]
    async fn full_delivery_chain() {
        let service = DeliveryJobService::new(InMemoryEventStore::new());

        let cmd = make_create().with_notes("Fragile");
        let job_id = cmd.job_id;
        let order_id = cmd.order_id;

        let result = service.create_job(cmd).await.unwrap();
        assert_eq!(result.aggregate.status(), JobStatus::Pending);
        assert!(result.aggregate.is_available());

        let agent_id = UserId::new();
        let result = service
            .claim_job(ClaimDeliveryJob::new(job_id, agent_id))
            .await
            .unwrap();
        assert_eq!(result.aggregate.status(), JobStatus::Assigned);
        assert_eq!(result.aggregate.assigned_agent_id(), Some(agent_id));
        assert!(result.aggregate.assigned_at().is_some());

        for target in [JobStatus::PickedUp, JobStatus::InTransit, JobStatus::Delivered] {
            service
                .advance_job(AdvanceDeliveryJob::new(job_id, agent_id, target))
                .await
                .unwrap();
        }

        let job = service.get_job(job_id).await.unwrap().unwrap();
        assert_eq!(job.status(), JobStatus::Delivered);
        assert_eq!(job.order_id(), Some(order_id));
        assert_eq!(job.notes(), Some("Fragile"));
        assert!(job.completed_at().is_some());
        assert!(job.is_terminal());
    }

    #[tokio::test]
    async fn job_reconstruction_from_events() {
        let store = InMemoryEventStore::new();
        let service = DeliveryJobService::new(store.clone());

        let cmd = make_create();
        let job_id = cmd.job_id;
        let buyer_id = cmd.buyer_id;
        service.create_job(cmd).await.unwrap();

        let agent_id = UserId::new();
        service
            .claim_job(ClaimDeliveryJob::new(job_id, agent_id))
            .await
            .unwrap();
        service
            .advance_job(AdvanceDeliveryJob::new(job_id, agent_id, JobStatus::PickedUp))
            .await
            .unwrap();

        // A fresh service over the same store sees the same job
        let fresh = DeliveryJobService::new(store);
        let job = fresh.get_job(job_id).await.unwrap().unwrap();

        assert_eq!(job.id(), Some(job_id));
        assert_eq!(job.buyer_id(), Some(buyer_id));
        assert_eq!(job.status(), JobStatus::PickedUp);
        assert_eq!(job.assigned_agent_id(), Some(agent_id));
        assert_eq!(job.pickup_address().city, "Kano");
        assert_eq!(job.delivery_address().city, "Aba");
    }
}

mod claiming {
    use super::*;

    #[tokio::test]
    async fn second_claim_is_rejected() {
        let service = DeliveryJobService::new(InMemoryEventStore::new());

        let cmd = make_create();
        let job_id = cmd.job_id;
        service.create_job(cmd).await.unwrap();

        let first = UserId::new();
        service
            .claim_job(ClaimDeliveryJob::new(job_id, first))
            .await
            .unwrap();

        let result = service
            .claim_job(ClaimDeliveryJob::new(job_id, UserId::new()))
            .await;

        assert!(matches!(
            result,
            Err(DomainError::Delivery(DeliveryJobError::AlreadyClaimed { .. }))
        ));

        // The first agent still holds the job
        let job = service.get_job(job_id).await.unwrap().unwrap();
        assert_eq!(job.assigned_agent_id(), Some(first));
    }

    #[tokio::test]
    async fn concurrent_claims_have_single_winner() {
        let store = InMemoryEventStore::new();
        let service_a = DeliveryJobService::new(store.clone());
        let service_b = DeliveryJobService::new(store.clone());

        let cmd = make_create();
        let job_id = cmd.job_id;
        service_a.create_job(cmd).await.unwrap();

        let agent_a = UserId::new();
        let agent_b = UserId::new();

        let (a, b) = tokio::join!(
            service_a.claim_job(ClaimDeliveryJob::new(job_id, agent_a)),
            service_b.claim_job(ClaimDeliveryJob::new(job_id, agent_b)),
        );

        let ok_count = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
        assert_eq!(ok_count, 1, "exactly one claim must win");

        // The loser lost either the append race or loaded the job after
        // the winner's claim landed
        let winner = if a.is_ok() { agent_a } else { agent_b };
        for result in [a, b] {
            if let Err(err) = result {
                assert!(matches!(
                    err,
                    DomainError::Delivery(DeliveryJobError::AlreadyClaimed { .. })
                        | DomainError::EventStore(EventStoreError::ConcurrencyConflict { .. })
                ));
            }
        }

        let job = service_a.get_job(job_id).await.unwrap().unwrap();
        assert_eq!(job.status(), JobStatus::Assigned);
        assert_eq!(job.assigned_agent_id(), Some(winner));

        // Exactly one claim event on the stream
        let events = store.get_events_for_aggregate(job_id).await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].event_type, "DeliveryJobClaimed");
    }

    #[tokio::test]
    async fn claiming_unknown_job_fails() {
        let service = DeliveryJobService::new(InMemoryEventStore::new());

        let result = service
            .claim_job(ClaimDeliveryJob::new(AggregateId::new(), UserId::new()))
            .await;

        assert!(matches!(
            result,
            Err(DomainError::Delivery(DeliveryJobError::NotCreated))
        ));
    }
}

mod state_machine {
    use super::*;

    async fn claimed_job(
        service: &DeliveryJobService<InMemoryEventStore>,
    ) -> (AggregateId, UserId) {
        let cmd = make_create();
        let job_id = cmd.job_id;
        service.create_job(cmd).await.unwrap();

        let agent_id = UserId::new();
        service
            .claim_job(ClaimDeliveryJob::new(job_id, agent_id))
            .await
            .unwrap();
        (job_id, agent_id)
    }

    #[tokio::test]
    async fn skipping_a_step_is_rejected() {
        let service = DeliveryJobService::new(InMemoryEventStore::new());
        let (job_id, agent_id) = claimed_job(&service).await;

        // assigned → in_transit skips picked_up
        let result = service
            .advance_job(AdvanceDeliveryJob::new(job_id, agent_id, JobStatus::InTransit))
            .await;

        assert!(matches!(
            result,
            Err(DomainError::Delivery(DeliveryJobError::InvalidTransition {
                from: JobStatus::Assigned,
                to: JobStatus::InTransit,
            }))
        ));

        // Job unchanged
        let job = service.get_job(job_id).await.unwrap().unwrap();
        assert_eq!(job.status(), JobStatus::Assigned);
    }

    #[tokio::test]
    async fn delivered_job_rejects_all_transitions() {
        let service = DeliveryJobService::new(InMemoryEventStore::new());
        let (job_id, agent_id) = claimed_job(&service).await;

        for target in [JobStatus::PickedUp, JobStatus::InTransit, JobStatus::Delivered] {
            service
                .advance_job(AdvanceDeliveryJob::new(job_id, agent_id, target))
                .await
                .unwrap();
        }

        for target in [
            JobStatus::Assigned,
            JobStatus::PickedUp,
            JobStatus::InTransit,
            JobStatus::Delivered,
        ] {
            let result = service
                .advance_job(AdvanceDeliveryJob::new(job_id, agent_id, target))
                .await;
            assert!(matches!(
                result,
                Err(DomainError::Delivery(DeliveryJobError::TerminalState {
                    status: JobStatus::Delivered
                }))
            ));
        }

        let job = service.get_job(job_id).await.unwrap().unwrap();
        assert_eq!(job.status(), JobStatus::Delivered);
    }

    #[tokio::test]
    async fn only_the_assignee_may_advance() {
        let service = DeliveryJobService::new(InMemoryEventStore::new());
        let (job_id, _agent_id) = claimed_job(&service).await;

        let stranger = UserId::new();
        let result = service
            .advance_job(AdvanceDeliveryJob::new(job_id, stranger, JobStatus::PickedUp))
            .await;

        assert!(matches!(
            result,
            Err(DomainError::Delivery(DeliveryJobError::NotAssignee { .. }))
        ));
    }
}
