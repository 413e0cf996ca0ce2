//! Delivery lifecycle: advancing a claimed job to delivered.

use common::{AggregateId, UserId};
use domain::{
    AdvanceDeliveryJob, DeliveryJob, DeliveryJobError, DeliveryJobService, DomainError, JobStatus,
    MarkOrderDelivered, OrderService,
};
use event_store::EventStore;

use crate::error::{DispatchError, Result};
use crate::notify::{NotificationDispatcher, NotificationKind};
use crate::services::directory::{Role, UserDirectory};
use crate::services::notifications::NotificationStore;

/// Drives a claimed job along assigned → picked_up → in_transit →
/// delivered.
///
/// The job aggregate enforces the step order and the assignee check;
/// this layer adds the role gate, mirrors the final step onto the
/// order, and tells the buyer about each hand-over.
pub struct DeliveryLifecycle<S, D, N>
where
    S: EventStore,
    D: UserDirectory,
    N: NotificationStore,
{
    jobs: DeliveryJobService<S>,
    orders: OrderService<S>,
    directory: D,
    notifier: NotificationDispatcher<D, N>,
}

impl<S, D, N> DeliveryLifecycle<S, D, N>
where
    S: EventStore + Clone,
    D: UserDirectory + Clone,
    N: NotificationStore,
{
    /// Creates a new lifecycle over the given store and services.
    pub fn new(store: S, directory: D, notifications: N) -> Self {
        let jobs = DeliveryJobService::new(store.clone());
        let orders = OrderService::new(store);
        let notifier = NotificationDispatcher::new(directory.clone(), notifications);
        Self {
            jobs,
            orders,
            directory,
            notifier,
        }
    }

    /// Advances a job one step along the delivery chain.
    ///
    /// The caller must hold the delivery-agent role and be the job's
    /// assignee; the target must be the immediate successor of the
    /// current status. Reaching delivered also flips the parent order.
    #[tracing::instrument(skip(self), fields(%job_id, %agent_id, target = %target))]
    pub async fn advance(
        &self,
        job_id: AggregateId,
        agent_id: UserId,
        target: JobStatus,
    ) -> Result<DeliveryJob> {
        if !self.directory.has_role(agent_id, Role::DeliveryAgent).await {
            return Err(DispatchError::PermissionDenied {
                user_id: agent_id,
                required: Role::DeliveryAgent,
            });
        }

        let result = self
            .jobs
            .advance_job(AdvanceDeliveryJob::new(job_id, agent_id, target))
            .await;

        let job = match result {
            Ok(result) => result.aggregate,
            Err(DomainError::Delivery(DeliveryJobError::NotCreated)) => {
                return Err(DispatchError::JobNotFound(job_id));
            }
            Err(e) => return Err(e.into()),
        };

        metrics::counter!("job_transitions_total").increment(1);
        tracing::info!(%job_id, status = %job.status(), "job advanced");

        if job.status() == JobStatus::Delivered {
            metrics::counter!("jobs_delivered_total").increment(1);
            if let Some(order_id) = job.order_id() {
                // The job is the source of truth for the hand-over; a
                // failed order flip is logged, not unwound.
                if let Err(err) = self
                    .orders
                    .mark_delivered(MarkOrderDelivered::new(order_id))
                    .await
                {
                    tracing::warn!(
                        %job_id, %order_id, error = %err,
                        "job delivered but order status update failed"
                    );
                }
            }
        }

        if let Some(buyer_id) = job.buyer_id() {
            let (title, message) = buyer_update(job.status());
            self.notifier
                .notify_or_log(
                    buyer_id,
                    NotificationKind::OrderStatus,
                    title,
                    message,
                    serde_json::json!({
                        "order_id": job.order_id(),
                        "job_id": job_id,
                        "status": job.status(),
                    }),
                )
                .await;
        }

        Ok(job)
    }
}

/// Buyer-facing copy for each delivery step.
fn buyer_update(status: JobStatus) -> (&'static str, String) {
    match status {
        JobStatus::PickedUp => (
            "Order picked up",
            "Your order has been picked up from the seller.".to_string(),
        ),
        JobStatus::InTransit => (
            "Order in transit",
            "Your order is on its way to you.".to_string(),
        ),
        JobStatus::Delivered => (
            "Order delivered",
            "Your order has been delivered. Thank you for shopping on AgroCom!".to_string(),
        ),
        other => ("Order update", format!("Your order is now {other}.")),
    }
}
