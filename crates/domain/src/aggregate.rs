//! Core aggregate and domain event traits.

use common::AggregateId;
use event_store::Version;
use serde::{Serialize, de::DeserializeOwned};

/// Trait for domain events.
///
/// Domain events represent facts that have happened in the domain.
/// They are immutable and should be named in past tense
/// (`OrderPlaced`, `DeliveryJobClaimed`).
pub trait DomainEvent: Serialize + DeserializeOwned + Send + Sync + Clone {
    /// Returns the event type name.
    ///
    /// This is used for serialization and event store filtering.
    fn event_type(&self) -> &'static str;
}

/// Trait for event-sourced aggregates.
///
/// An aggregate is the consistency boundary for a stream of events; the
/// roots here are `Order` and `DeliveryJob`. State is never stored
/// directly. It is rebuilt by replaying the stream, and commands
/// produce new events rather than mutating in place.
pub trait Aggregate: Default + Send + Sync + Sized {
    /// The type of events this aggregate produces and consumes.
    type Event: DomainEvent;

    /// The type of errors this aggregate can produce.
    type Error: std::error::Error + Send + Sync;

    /// Returns the aggregate type name.
    ///
    /// Used for event store organization and routing.
    fn aggregate_type() -> &'static str;

    /// Returns the aggregate's unique identifier.
    ///
    /// Returns None for a new, uninitialized aggregate.
    fn id(&self) -> Option<AggregateId>;

    /// Returns the current version of the aggregate.
    ///
    /// Version starts at 0 for a new aggregate and increments with each event.
    fn version(&self) -> Version;

    /// Sets the aggregate version.
    ///
    /// Called by the command handler after loading events.
    fn set_version(&mut self, version: Version);

    /// Applies an event to the aggregate, updating its state.
    ///
    /// Must be deterministic and must not fail: events are facts that
    /// already happened, so replay cannot be allowed to diverge.
    fn apply(&mut self, event: Self::Event);

    /// Applies multiple events in sequence.
    fn apply_events(&mut self, events: impl IntoIterator<Item = Self::Event>) {
        for event in events {
            self.apply(event);
        }
    }
}

/// Trait for aggregates that support snapshotting.
///
/// Snapshotting is an optimization to avoid replaying all events when loading
/// an aggregate. The aggregate state is periodically serialized and stored.
pub trait SnapshotCapable: Aggregate + Serialize + DeserializeOwned {
    /// Returns the snapshot interval (number of events between snapshots).
    ///
    /// A value of 100 means a snapshot is taken every 100 events.
    fn snapshot_interval() -> usize {
        100
    }

    /// Returns whether a snapshot should be taken given the current version.
    fn should_snapshot(&self) -> bool {
        self.version().as_i64() > 0
            && (self.version().as_i64() as usize).is_multiple_of(Self::snapshot_interval())
    }
}
