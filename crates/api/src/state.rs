//! Shared application state wiring the engine behind the HTTP surface.

use std::sync::Arc;

use dispatch::{
    DeliveryJobRegistry, DeliveryLifecycle, InMemoryNotificationStore, InMemoryUserDirectory,
    NotificationDispatcher, PaymentConfirmationHandler, Reconciler,
};
use domain::OrderService;
use event_store::EventStore;
use projections::{
    AdminOrdersView, BuyerStatsView, JobBoardView, Projection, ProjectionProcessor,
    SellerOrdersView,
};

/// Shared application state accessible from all handlers.
///
/// The directory and notification store are the in-memory boundary
/// services; everything else reads and writes the event store.
pub struct AppState<S: EventStore> {
    pub order_service: OrderService<S>,
    pub confirmation:
        PaymentConfirmationHandler<S, InMemoryUserDirectory, InMemoryNotificationStore>,
    pub registry: DeliveryJobRegistry<S, InMemoryUserDirectory, InMemoryNotificationStore>,
    pub lifecycle: DeliveryLifecycle<S, InMemoryUserDirectory, InMemoryNotificationStore>,
    pub reconciler: Reconciler<S, InMemoryUserDirectory, InMemoryNotificationStore>,
    pub directory: InMemoryUserDirectory,
    pub notifications: InMemoryNotificationStore,
    pub notifier: NotificationDispatcher<InMemoryUserDirectory, InMemoryNotificationStore>,
    pub admin_orders: Arc<AdminOrdersView>,
    pub seller_orders: Arc<SellerOrdersView>,
    pub buyer_stats: Arc<BuyerStatsView>,
    pub job_board: Arc<JobBoardView>,
    pub projection_processor: Arc<ProjectionProcessor<S>>,
}

/// Creates the default application state over the given event store.
pub fn create_default_state<S: EventStore + Clone + 'static>(
    event_store: S,
) -> (Arc<AppState<S>>, Arc<ProjectionProcessor<S>>) {
    let directory = InMemoryUserDirectory::new();
    let notifications = InMemoryNotificationStore::new();

    let admin_orders = Arc::new(AdminOrdersView::new());
    let seller_orders = Arc::new(SellerOrdersView::new());
    let buyer_stats = Arc::new(BuyerStatsView::new());
    let job_board = Arc::new(JobBoardView::new());

    let mut processor = ProjectionProcessor::new(event_store.clone());
    processor.register(Box::new(admin_orders.as_ref().clone()) as Box<dyn Projection>);
    processor.register(Box::new(seller_orders.as_ref().clone()) as Box<dyn Projection>);
    processor.register(Box::new(buyer_stats.as_ref().clone()) as Box<dyn Projection>);
    processor.register(Box::new(job_board.as_ref().clone()) as Box<dyn Projection>);
    let processor = Arc::new(processor);

    let state = Arc::new(AppState {
        order_service: OrderService::new(event_store.clone()),
        confirmation: PaymentConfirmationHandler::new(
            event_store.clone(),
            directory.clone(),
            notifications.clone(),
        ),
        registry: DeliveryJobRegistry::new(
            event_store.clone(),
            job_board.as_ref().clone(),
            directory.clone(),
            notifications.clone(),
        ),
        lifecycle: DeliveryLifecycle::new(
            event_store.clone(),
            directory.clone(),
            notifications.clone(),
        ),
        reconciler: Reconciler::new(event_store, directory.clone(), notifications.clone()),
        notifier: NotificationDispatcher::new(directory.clone(), notifications.clone()),
        directory,
        notifications,
        admin_orders,
        seller_orders,
        buyer_stats,
        job_board,
        projection_processor: processor.clone(),
    });

    (state, processor)
}
