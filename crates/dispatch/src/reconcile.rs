//! Repair pass for confirmed orders that never got a delivery job.
//!
//! The confirmation handler's side effects span two event streams; a
//! crash between the order flip and the job append leaves a paid order
//! invisible to every agent. This pass finds those orders by diffing
//! event types and re-runs the job creation, notifications included.

use std::collections::HashSet;

use common::AggregateId;
use domain::{DeliveryJobEvent, OrderService};
use event_store::EventStore;

use crate::confirmation::PaymentConfirmationHandler;
use crate::error::Result;
use crate::services::directory::UserDirectory;
use crate::services::notifications::NotificationStore;

/// What a reconciliation pass found and did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciliationReport {
    /// Orders with a confirmed payment.
    pub confirmed_orders: usize,

    /// Confirmed orders that had no delivery job when the pass ran.
    pub orders_missing_jobs: usize,

    /// Orders a job was created for.
    pub repaired_order_ids: Vec<AggregateId>,

    /// Orders whose repair failed; they stay candidates for the next pass.
    pub failed_order_ids: Vec<AggregateId>,
}

impl ReconciliationReport {
    /// Returns true if nothing needed repair.
    pub fn is_clean(&self) -> bool {
        self.orders_missing_jobs == 0
    }
}

/// Scans for and repairs confirmed orders without a delivery job.
///
/// Idempotent: a repaired order has a job, so the next pass skips it.
/// Runs are operator-triggered and expected to be serial; two passes
/// racing on the same gap would each open a job.
pub struct Reconciler<S, D, N>
where
    S: EventStore,
    D: UserDirectory,
    N: NotificationStore,
{
    store: S,
    orders: OrderService<S>,
    confirmation: PaymentConfirmationHandler<S, D, N>,
}

impl<S, D, N> Reconciler<S, D, N>
where
    S: EventStore + Clone,
    D: UserDirectory + Clone,
    N: NotificationStore,
{
    /// Creates a new reconciler over the given store and services.
    pub fn new(store: S, directory: D, notifications: N) -> Self {
        let orders = OrderService::new(store.clone());
        let confirmation = PaymentConfirmationHandler::new(store.clone(), directory, notifications);
        Self {
            store,
            orders,
            confirmation,
        }
    }

    /// Runs one reconciliation pass and reports what it repaired.
    #[tracing::instrument(skip(self))]
    pub async fn run(&self) -> Result<ReconciliationReport> {
        metrics::counter!("reconciliation_runs_total").increment(1);
        let started = std::time::Instant::now();

        // Confirmed orders, in confirmation order
        let mut confirmed_ids = Vec::new();
        let mut seen = HashSet::new();
        for envelope in self
            .store
            .get_events_by_type("OrderPaymentConfirmed")
            .await?
        {
            if seen.insert(envelope.aggregate_id) {
                confirmed_ids.push(envelope.aggregate_id);
            }
        }

        // Orders already covered by a job
        let mut covered = HashSet::new();
        for envelope in self.store.get_events_by_type("DeliveryJobCreated").await? {
            let event: DeliveryJobEvent = serde_json::from_value(envelope.payload.clone())?;
            if let DeliveryJobEvent::DeliveryJobCreated(data) = event {
                covered.insert(data.order_id);
            }
        }

        let mut report = ReconciliationReport {
            confirmed_orders: confirmed_ids.len(),
            ..Default::default()
        };

        for order_id in confirmed_ids {
            if covered.contains(&order_id) {
                continue;
            }
            report.orders_missing_jobs += 1;
            tracing::warn!(%order_id, "confirmed order has no delivery job, repairing");

            match self.orders.get_order(order_id).await {
                Ok(Some(order)) => {
                    match self.confirmation.open_delivery_job(order_id, &order).await {
                        Ok(job_id) => {
                            tracing::info!(%order_id, %job_id, "delivery job repaired");
                            report.repaired_order_ids.push(order_id);
                        }
                        Err(err) => {
                            tracing::warn!(%order_id, error = %err, "repair failed");
                            report.failed_order_ids.push(order_id);
                        }
                    }
                }
                Ok(None) => {
                    tracing::warn!(%order_id, "confirmed order no longer loads");
                    report.failed_order_ids.push(order_id);
                }
                Err(err) => {
                    tracing::warn!(%order_id, error = %err, "order load failed");
                    report.failed_order_ids.push(order_id);
                }
            }
        }

        metrics::counter!("reconciliation_repairs_total")
            .increment(report.repaired_order_ids.len() as u64);
        metrics::histogram!("reconciliation_duration_seconds")
            .record(started.elapsed().as_secs_f64());
        tracing::info!(
            confirmed = report.confirmed_orders,
            missing = report.orders_missing_jobs,
            repaired = report.repaired_order_ids.len(),
            "reconciliation pass complete"
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::NotificationKind;
    use crate::services::directory::{InMemoryUserDirectory, Role, UserRecord};
    use crate::services::notifications::InMemoryNotificationStore;
    use common::UserId;
    use domain::{Address, ConfirmPayment, Money, OrderItem, PlaceOrder};
    use event_store::InMemoryEventStore;

    type TestReconciler =
        Reconciler<InMemoryEventStore, InMemoryUserDirectory, InMemoryNotificationStore>;

    struct Setup {
        reconciler: TestReconciler,
        store: InMemoryEventStore,
        orders: OrderService<InMemoryEventStore>,
        notifications: InMemoryNotificationStore,
        buyer_id: UserId,
        seller_id: UserId,
        admin_id: UserId,
    }

    fn setup() -> Setup {
        let store = InMemoryEventStore::new();
        let directory = InMemoryUserDirectory::new();
        let notifications = InMemoryNotificationStore::new();

        let buyer_id = UserId::new();
        let seller_id = UserId::new();
        let admin_id = UserId::new();
        directory.register(UserRecord::new(buyer_id, "Ada Obi", vec![Role::Buyer]));
        directory.register(
            UserRecord::new(seller_id, "Musa Bello", vec![Role::Seller]).with_pickup_address(
                Address::new("Musa Bello", "7 Farm Lane", "Kano", "Kano", "+2348098765432"),
            ),
        );
        directory.register(UserRecord::new(admin_id, "Ngozi Eze", vec![Role::Admin]));

        Setup {
            reconciler: Reconciler::new(store.clone(), directory, notifications.clone()),
            store: store.clone(),
            orders: OrderService::new(store),
            notifications,
            buyer_id,
            seller_id,
            admin_id,
        }
    }

    /// Order flipped to confirmed with no job, as if the handler died
    /// between its two appends.
    async fn confirmed_order_without_job(s: &Setup) -> AggregateId {
        let cmd = PlaceOrder::at_checkout(
            s.buyer_id,
            s.seller_id,
            OrderItem::new("prod-yam-50kg", "Yam (50kg bag)", 2, Money::from_kobo(250_000)),
            Address::new("Ada Obi", "14 Market Road", "Aba", "Abia", "+2348012345678"),
        );
        let order_id = cmd.order_id;
        s.orders.place_order(cmd).await.unwrap();
        s.orders
            .confirm_payment(ConfirmPayment::new(order_id, "PSK-REF-001"))
            .await
            .unwrap();
        order_id
    }

    #[tokio::test]
    async fn test_empty_store_is_clean() {
        let s = setup();

        let report = s.reconciler.run().await.unwrap();

        assert!(report.is_clean());
        assert_eq!(report.confirmed_orders, 0);
        assert!(report.repaired_order_ids.is_empty());
    }

    #[tokio::test]
    async fn test_repairs_confirmed_order_without_job() {
        let s = setup();
        let order_id = confirmed_order_without_job(&s).await;

        let report = s.reconciler.run().await.unwrap();

        assert_eq!(report.confirmed_orders, 1);
        assert_eq!(report.orders_missing_jobs, 1);
        assert_eq!(report.repaired_order_ids, vec![order_id]);
        assert!(report.failed_order_ids.is_empty());

        // The job now exists and points at the order
        let created = s.store.get_events_by_type("DeliveryJobCreated").await.unwrap();
        assert_eq!(created.len(), 1);
        let event: DeliveryJobEvent = serde_json::from_value(created[0].payload.clone()).unwrap();
        let DeliveryJobEvent::DeliveryJobCreated(data) = event else {
            panic!("expected a created event");
        };
        assert_eq!(data.order_id, order_id);

        // Repair emitted the same notifications a live confirmation would
        let admin_inbox = s.notifications.for_recipient(s.admin_id, 0).await.unwrap();
        assert_eq!(admin_inbox.len(), 1);
        assert_eq!(admin_inbox[0].kind, NotificationKind::DeliveryJob);
        let buyer_inbox = s.notifications.for_recipient(s.buyer_id, 0).await.unwrap();
        assert_eq!(buyer_inbox.len(), 1);
        assert_eq!(buyer_inbox[0].kind, NotificationKind::OrderStatus);
    }

    #[tokio::test]
    async fn test_second_pass_is_idempotent() {
        let s = setup();
        confirmed_order_without_job(&s).await;

        let first = s.reconciler.run().await.unwrap();
        let second = s.reconciler.run().await.unwrap();

        assert_eq!(first.repaired_order_ids.len(), 1);
        assert!(second.is_clean());
        assert!(second.repaired_order_ids.is_empty());

        // Still exactly one job and one notification pair
        let created = s.store.get_events_by_type("DeliveryJobCreated").await.unwrap();
        assert_eq!(created.len(), 1);
        assert_eq!(s.notifications.total_count(), 2);
    }

    #[tokio::test]
    async fn test_covered_orders_are_left_alone() {
        let s = setup();
        let order_id = confirmed_order_without_job(&s).await;

        // First pass repairs, then a fresh unpaid order appears
        s.reconciler.run().await.unwrap();
        let cmd = PlaceOrder::at_checkout(
            s.buyer_id,
            s.seller_id,
            OrderItem::new("prod-rice-25kg", "Rice (25kg bag)", 1, Money::from_kobo(180_000)),
            Address::new("Ada Obi", "14 Market Road", "Aba", "Abia", "+2348012345678"),
        );
        s.orders.place_order(cmd).await.unwrap();

        let report = s.reconciler.run().await.unwrap();

        // The unpaid order is not confirmed, the repaired one is covered
        assert_eq!(report.confirmed_orders, 1);
        assert!(report.is_clean());
        assert!(!report.repaired_order_ids.contains(&order_id));
    }
}
