//! Append-only event storage for the fulfillment engine.
//!
//! Orders and delivery jobs are persisted as ordered event streams. The
//! [`EventStore`] trait is implemented in memory (default wiring, tests)
//! and on PostgreSQL (durable deployment); both enforce optimistic
//! concurrency on append, which is the engine's only locking primitive.

pub mod error;
pub mod event;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod snapshot;
pub mod store;

pub use common::AggregateId;
pub use error::{EventStoreError, Result};
pub use event::{EventEnvelope, EventEnvelopeBuilder, EventId, Version};
pub use memory::InMemoryEventStore;
pub use postgres::PostgresEventStore;
pub use query::EventQuery;
pub use snapshot::Snapshot;
pub use store::{AppendOptions, EventStore, EventStoreExt, EventStream};
