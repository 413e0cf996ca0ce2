//! Order service providing a simplified API for order operations.

use common::AggregateId;
use event_store::EventStore;

use crate::command::{CommandHandler, CommandResult};
use crate::error::DomainError;

use super::{ConfirmPayment, MarkOrderDelivered, Order, PlaceOrder};

impl From<super::OrderError> for DomainError {
    fn from(e: super::OrderError) -> Self {
        DomainError::Order(e)
    }
}

/// Service for managing orders.
///
/// Provides a high-level API for order operations, wrapping the command handler
/// and providing convenient methods for common operations.
pub struct OrderService<S: EventStore> {
    handler: CommandHandler<S, Order>,
}

impl<S: EventStore> OrderService<S> {
    /// Creates a new order service with the given event store.
    pub fn new(store: S) -> Self {
        Self {
            handler: CommandHandler::new(store),
        }
    }

    /// Returns a reference to the underlying command handler.
    pub fn handler(&self) -> &CommandHandler<S, Order> {
        &self.handler
    }

    /// Places a new order at checkout.
    #[tracing::instrument(skip(self, cmd), fields(order_id = %cmd.order_id))]
    pub async fn place_order(&self, cmd: PlaceOrder) -> Result<CommandResult<Order>, DomainError> {
        let order_id = cmd.order_id;
        let buyer_id = cmd.buyer_id;
        let seller_id = cmd.seller_id;
        let item = cmd.item.clone();
        let shipping_address = cmd.shipping_address.clone();
        let notes = cmd.notes.clone();

        let result = self
            .handler
            .execute(order_id, |order| {
                order.place(order_id, buyer_id, seller_id, item, shipping_address, notes)
            })
            .await?;

        metrics::counter!("orders_placed_total").increment(1);
        Ok(result)
    }

    /// Records a settled payment against an order.
    #[tracing::instrument(skip(self, cmd), fields(order_id = %cmd.order_id))]
    pub async fn confirm_payment(
        &self,
        cmd: ConfirmPayment,
    ) -> Result<CommandResult<Order>, DomainError> {
        let reference = cmd.transaction_reference.clone();
        let provider = cmd.payment_provider.clone();

        self.handler
            .execute(cmd.order_id, |order| {
                order.confirm_payment(reference, provider)
            })
            .await
    }

    /// Marks an order delivered.
    #[tracing::instrument(skip(self))]
    pub async fn mark_delivered(
        &self,
        cmd: MarkOrderDelivered,
    ) -> Result<CommandResult<Order>, DomainError> {
        self.handler
            .execute(cmd.order_id, |order| order.mark_delivered())
            .await
    }

    /// Loads an order by ID.
    ///
    /// Returns None if the order doesn't exist.
    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, order_id: AggregateId) -> Result<Option<Order>, DomainError> {
        self.handler.load_existing(order_id).await
    }
}
