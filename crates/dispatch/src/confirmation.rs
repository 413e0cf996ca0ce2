//! Payment confirmation handler.
//!
//! Entry point for the payment gateway's "funds settled" signal. One
//! confirmation flips the order, opens the delivery job and fans out
//! the admin and buyer notifications.

use common::AggregateId;
use domain::{
    Address, ConfirmPayment, CreateDeliveryJob, DeliveryJobService, DomainError, Order, OrderError,
    OrderService, PaymentStatus,
};
use event_store::{EventStore, EventStoreError};

use crate::error::{DispatchError, Result};
use crate::notify::{NotificationDispatcher, NotificationKind};
use crate::services::directory::UserDirectory;
use crate::services::notifications::NotificationStore;

/// Outcome of handling a payment-confirmed signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationOutcome {
    /// The order was confirmed and a delivery job created.
    Confirmed { job_id: AggregateId },

    /// The order was already confirmed; nothing was changed.
    AlreadyConfirmed,
}

impl ConfirmationOutcome {
    /// Returns true if this call performed the confirmation.
    pub fn is_confirmed(&self) -> bool {
        matches!(self, ConfirmationOutcome::Confirmed { .. })
    }
}

/// Handles inbound payment confirmations.
///
/// The three side effects (order flip, job creation, notifications)
/// span two event streams plus the notification store. The order flip
/// commits first and carries the idempotency: a duplicate signal, or
/// the loser of two concurrent deliveries of the same signal, observes
/// an already-confirmed order and stops without a second job or a
/// second round of notifications. If job creation fails after the flip
/// committed, the reconciler finds and repairs the gap.
pub struct PaymentConfirmationHandler<S, D, N>
where
    S: EventStore,
    D: UserDirectory,
    N: NotificationStore,
{
    orders: OrderService<S>,
    jobs: DeliveryJobService<S>,
    directory: D,
    notifier: NotificationDispatcher<D, N>,
}

impl<S, D, N> PaymentConfirmationHandler<S, D, N>
where
    S: EventStore + Clone,
    D: UserDirectory + Clone,
    N: NotificationStore,
{
    /// Creates a new handler over the given store and services.
    pub fn new(store: S, directory: D, notifications: N) -> Self {
        let orders = OrderService::new(store.clone());
        let jobs = DeliveryJobService::new(store);
        let notifier = NotificationDispatcher::new(directory.clone(), notifications);
        Self {
            orders,
            jobs,
            directory,
            notifier,
        }
    }

    /// Handles a payment-confirmed signal for an order.
    ///
    /// Idempotent on the order id: at-least-once webhook delivery
    /// produces exactly one delivery job and one notification pair.
    #[tracing::instrument(skip(self, reference, provider), fields(%order_id))]
    pub async fn on_payment_confirmed(
        &self,
        order_id: AggregateId,
        reference: &str,
        provider: Option<&str>,
    ) -> Result<ConfirmationOutcome> {
        metrics::counter!("payment_confirmations_total").increment(1);
        let started = std::time::Instant::now();

        let order = self
            .orders
            .get_order(order_id)
            .await?
            .ok_or(DispatchError::OrderNotFound(order_id))?;

        if order.payment_status() == PaymentStatus::Completed {
            tracing::info!(%order_id, "order already confirmed, skipping");
            metrics::counter!("payment_confirmations_duplicate_total").increment(1);
            return Ok(ConfirmationOutcome::AlreadyConfirmed);
        }

        let mut cmd = ConfirmPayment::new(order_id, reference);
        if let Some(provider) = provider {
            cmd = cmd.with_provider(provider);
        }

        let confirmed = match self.orders.confirm_payment(cmd).await {
            Ok(result) => result.aggregate,
            // A concurrent duplicate delivery won the version slot; the
            // winner owns the job and the notifications.
            Err(DomainError::Order(OrderError::AlreadyConfirmed { .. }))
            | Err(DomainError::EventStore(EventStoreError::ConcurrencyConflict { .. })) => {
                tracing::info!(%order_id, "lost confirmation race, order already confirmed");
                metrics::counter!("payment_confirmations_duplicate_total").increment(1);
                return Ok(ConfirmationOutcome::AlreadyConfirmed);
            }
            Err(e) => return Err(e.into()),
        };

        let job_id = self.open_delivery_job(order_id, &confirmed).await?;

        metrics::histogram!("payment_confirmation_duration_seconds")
            .record(started.elapsed().as_secs_f64());
        tracing::info!(%order_id, %job_id, "payment confirmed, delivery job opened");

        Ok(ConfirmationOutcome::Confirmed { job_id })
    }

    /// Creates the delivery job for a confirmed order and fans out the
    /// admin and buyer notifications.
    ///
    /// Shared with the reconciler, which repairs confirmed orders whose
    /// job creation failed.
    pub(crate) async fn open_delivery_job(
        &self,
        order_id: AggregateId,
        order: &Order,
    ) -> Result<AggregateId> {
        let (Some(buyer_id), Some(seller_id)) = (order.buyer_id(), order.seller_id()) else {
            return Err(DomainError::Order(OrderError::NotPlaced).into());
        };

        let pickup_address = match self.directory.pickup_address_for(seller_id).await {
            Some(address) => address,
            None => {
                tracing::warn!(%order_id, %seller_id, "seller has no pickup address, using placeholder");
                Address::placeholder()
            }
        };

        let mut cmd = CreateDeliveryJob::for_order(
            order_id,
            buyer_id,
            pickup_address,
            order.shipping_address().clone(),
        );
        if let Some(notes) = order.notes() {
            cmd = cmd.with_notes(notes);
        }
        let job_id = cmd.job_id;

        self.jobs.create_job(cmd).await?;
        metrics::counter!("delivery_jobs_created_total").increment(1);

        let job_payload = serde_json::json!({
            "job_id": job_id,
            "order_id": order_id,
        });
        for admin_id in self.directory.admin_ids().await {
            self.notifier
                .notify_or_log(
                    admin_id,
                    NotificationKind::DeliveryJob,
                    "New delivery job available",
                    format!(
                        "Order {} ({}) is paid and waiting for a delivery agent.",
                        order_id,
                        order.product_name()
                    ),
                    job_payload.clone(),
                )
                .await;
        }

        self.notifier
            .notify_or_log(
                buyer_id,
                NotificationKind::OrderStatus,
                "Payment confirmed",
                format!(
                    "Your payment of {} for {} was received. Your order is being prepared for delivery.",
                    order.total(),
                    order.product_name()
                ),
                serde_json::json!({"order_id": order_id}),
            )
            .await;

        Ok(job_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::directory::{InMemoryUserDirectory, Role, UserRecord};
    use crate::services::notifications::InMemoryNotificationStore;
    use common::UserId;
    use domain::{Money, OrderItem, OrderStatus, PlaceOrder};
    use event_store::InMemoryEventStore;

    type TestHandler =
        PaymentConfirmationHandler<InMemoryEventStore, InMemoryUserDirectory, InMemoryNotificationStore>;

    struct Setup {
        handler: TestHandler,
        orders: OrderService<InMemoryEventStore>,
        jobs: DeliveryJobService<InMemoryEventStore>,
        notifications: InMemoryNotificationStore,
        buyer_id: UserId,
        seller_id: UserId,
        admin_id: UserId,
    }

    fn farm_address() -> Address {
        Address::new("Musa Bello", "7 Farm Lane", "Kano", "Kano", "+2348098765432")
    }

    fn shipping_address() -> Address {
        Address::new("Ada Obi", "14 Market Road", "Aba", "Abia", "+2348012345678")
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
            UserRecord::new(seller_id, "Musa Bello", vec![Role::Seller])
                .with_pickup_address(farm_address()),
        );
        directory.register(UserRecord::new(admin_id, "Ngozi Eze", vec![Role::Admin]));

        Setup {
            handler: PaymentConfirmationHandler::new(
                store.clone(),
                directory,
                notifications.clone(),
            ),
            orders: OrderService::new(store.clone()),
            jobs: DeliveryJobService::new(store),
            notifications,
            buyer_id,
            seller_id,
            admin_id,
        }
    }

    async fn place_order(s: &Setup) -> AggregateId {
        let cmd = PlaceOrder::at_checkout(
            s.buyer_id,
            s.seller_id,
            OrderItem::new("prod-yam-50kg", "Yam (50kg bag)", 2, Money::from_kobo(250_000)),
            shipping_address(),
        );
        let order_id = cmd.order_id;
        s.orders.place_order(cmd).await.unwrap();
        order_id
    }

    #[tokio::test]
    async fn test_confirmation_flips_order_and_opens_job() {
        let s = setup();
        let order_id = place_order(&s).await;

        let outcome = s
            .handler
            .on_payment_confirmed(order_id, "PSK-REF-001", Some("paystack"))
            .await
            .unwrap();

        let ConfirmationOutcome::Confirmed { job_id } = outcome else {
            panic!("expected a fresh confirmation");
        };

        let order = s.orders.get_order(order_id).await.unwrap().unwrap();
        assert_eq!(order.status(), OrderStatus::Confirmed);
        assert_eq!(order.payment_status(), PaymentStatus::Completed);
        assert_eq!(order.transaction_reference(), Some("PSK-REF-001"));
        assert_eq!(order.payment_provider(), Some("paystack"));

        let job = s.jobs.get_job(job_id).await.unwrap().unwrap();
        assert_eq!(job.order_id(), Some(order_id));
        assert_eq!(job.buyer_id(), Some(s.buyer_id));
        assert_eq!(job.pickup_address(), &farm_address());
        assert_eq!(job.delivery_address(), &shipping_address());
        assert!(job.is_available());
    }

    #[tokio::test]
    async fn test_confirmation_notifies_admin_and_buyer() {
        let s = setup();
        let order_id = place_order(&s).await;

        s.handler
            .on_payment_confirmed(order_id, "PSK-REF-001", None)
            .await
            .unwrap();

        let admin_inbox = s
            .notifications
            .for_recipient(s.admin_id, 0)
            .await
            .unwrap();
        assert_eq!(admin_inbox.len(), 1);
        assert_eq!(admin_inbox[0].kind, NotificationKind::DeliveryJob);
        assert_eq!(admin_inbox[0].title, "New delivery job available");

        let buyer_inbox = s
            .notifications
            .for_recipient(s.buyer_id, 0)
            .await
            .unwrap();
        assert_eq!(buyer_inbox.len(), 1);
        assert_eq!(buyer_inbox[0].kind, NotificationKind::OrderStatus);
        assert_eq!(buyer_inbox[0].title, "Payment confirmed");
        assert!(buyer_inbox[0].message.contains("₦5000.00"));
    }

    #[tokio::test]
    async fn test_unknown_order_fails() {
        let s = setup();

        let result = s
            .handler
            .on_payment_confirmed(AggregateId::new(), "PSK-REF-001", None)
            .await;

        assert!(matches!(result, Err(DispatchError::OrderNotFound(_))));
    }

    #[tokio::test]
    async fn test_duplicate_confirmation_is_a_no_op() {
        let s = setup();
        let order_id = place_order(&s).await;

        let first = s
            .handler
            .on_payment_confirmed(order_id, "PSK-REF-001", None)
            .await
            .unwrap();
        let second = s
            .handler
            .on_payment_confirmed(order_id, "PSK-REF-001-RETRY", None)
            .await
            .unwrap();

        assert!(first.is_confirmed());
        assert_eq!(second, ConfirmationOutcome::AlreadyConfirmed);

        // One job, one admin notification, one buyer notification
        assert_eq!(s.notifications.total_count(), 2);
        let order = s.orders.get_order(order_id).await.unwrap().unwrap();
        assert_eq!(order.transaction_reference(), Some("PSK-REF-001"));
    }

    #[tokio::test]
    async fn test_missing_pickup_address_falls_back_to_placeholder() {
        let s = setup();

        // A seller who never registered an address
        let bare_seller = UserId::new();
        let cmd = PlaceOrder::at_checkout(
            s.buyer_id,
            bare_seller,
            OrderItem::new("prod-rice-25kg", "Rice (25kg bag)", 1, Money::from_kobo(180_000)),
            shipping_address(),
        );
        let order_id = cmd.order_id;
        s.orders.place_order(cmd).await.unwrap();

        let outcome = s
            .handler
            .on_payment_confirmed(order_id, "PSK-REF-002", None)
            .await
            .unwrap();
        let ConfirmationOutcome::Confirmed { job_id } = outcome else {
            panic!("expected a fresh confirmation");
        };

        let job = s.jobs.get_job(job_id).await.unwrap().unwrap();
        assert_eq!(job.pickup_address(), &Address::placeholder());
    }

    #[tokio::test]
    async fn test_notes_are_carried_onto_the_job() {
        let s = setup();
        let cmd = PlaceOrder::at_checkout(
            s.buyer_id,
            s.seller_id,
            OrderItem::new("prod-yam-50kg", "Yam (50kg bag)", 1, Money::from_kobo(250_000)),
            shipping_address(),
        )
        .with_notes("Call on arrival");
        let order_id = cmd.order_id;
        s.orders.place_order(cmd).await.unwrap();

        let outcome = s
            .handler
            .on_payment_confirmed(order_id, "PSK-REF-003", None)
            .await
            .unwrap();
        let ConfirmationOutcome::Confirmed { job_id } = outcome else {
            panic!("expected a fresh confirmation");
        };

        let job = s.jobs.get_job(job_id).await.unwrap().unwrap();
        assert_eq!(job.notes(), Some("Call on arrival"));
    }
}
