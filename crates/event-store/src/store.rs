use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;

use crate::{AggregateId, EventEnvelope, EventQuery, Result, Snapshot, Version};

/// Controls how an append is checked against the current stream head.
#[derive(Debug, Clone, Default)]
pub struct AppendOptions {
    /// Version the writer believes the aggregate is at. None skips the
    /// optimistic concurrency check entirely.
    pub expected_version: Option<Version>,
}

impl AppendOptions {
    /// No version check; last writer wins.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append only if the aggregate is currently at `version`.
    pub fn expect_version(version: Version) -> Self {
        Self {
            expected_version: Some(version),
        }
    }

    /// Append only if the stream has no events yet.
    pub fn expect_new() -> Self {
        Self {
            expected_version: Some(Version::initial()),
        }
    }
}

/// A stream of events.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<EventEnvelope>> + Send>>;

/// Persistence contract shared by the in-memory and PostgreSQL stores.
///
/// Implementations must be `Send + Sync`; every command handler and
/// projection runs against this trait, never a concrete store.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Appends a batch of events to one aggregate stream, all or nothing.
    ///
    /// When `options.expected_version` is set, the append fails with
    /// `ConcurrencyConflict` unless the stream head matches. This
    /// conditional append is the store's only mutual-exclusion primitive:
    /// of any set of writers racing on the same aggregate version, exactly
    /// one append succeeds.
    ///
    /// Returns the stream version after the append.
    async fn append(&self, events: Vec<EventEnvelope>, options: AppendOptions) -> Result<Version>;

    /// Reads an aggregate's full stream in version order.
    async fn get_events_for_aggregate(
        &self,
        aggregate_id: AggregateId,
    ) -> Result<Vec<EventEnvelope>>;

    /// Reads an aggregate's stream starting at `from_version`.
    ///
    /// This is the resume path after loading a snapshot.
    async fn get_events_for_aggregate_from_version(
        &self,
        aggregate_id: AggregateId,
        from_version: Version,
    ) -> Result<Vec<EventEnvelope>>;

    /// Reads events matching an [`EventQuery`].
    async fn query_events(&self, query: EventQuery) -> Result<Vec<EventEnvelope>>;

    /// Reads every event of one type across all streams.
    async fn get_events_by_type(&self, event_type: &str) -> Result<Vec<EventEnvelope>>;

    /// Streams the whole log in insertion order. Projections catch up from this.
    async fn stream_all_events(&self) -> Result<EventStream>;

    /// Current head version of an aggregate, or None for an empty stream.
    async fn get_aggregate_version(&self, aggregate_id: AggregateId) -> Result<Option<Version>>;

    /// Stores a snapshot, replacing any earlier one for the same aggregate.
    async fn save_snapshot(&self, snapshot: Snapshot) -> Result<()>;

    /// Latest snapshot for an aggregate, if one has been taken.
    async fn get_snapshot(&self, aggregate_id: AggregateId) -> Result<Option<Snapshot>>;
}

/// Convenience methods layered on any [`EventStore`].
#[async_trait]
pub trait EventStoreExt: EventStore {
    /// Appends a single event.
    async fn append_event(&self, event: EventEnvelope, options: AppendOptions) -> Result<Version> {
        self.append(vec![event], options).await
    }

    /// True if the aggregate has at least one event.
    async fn aggregate_exists(&self, aggregate_id: AggregateId) -> Result<bool> {
        Ok(self.get_aggregate_version(aggregate_id).await?.is_some())
    }

    /// Loads the snapshot (when one exists) plus the events recorded after it,
    /// or the full stream when the aggregate has never been snapshotted.
    async fn load_aggregate(
        &self,
        aggregate_id: AggregateId,
    ) -> Result<(Option<Snapshot>, Vec<EventEnvelope>)> {
        if let Some(snapshot) = self.get_snapshot(aggregate_id).await? {
            let events = self
                .get_events_for_aggregate_from_version(aggregate_id, snapshot.version.next())
                .await?;
            Ok((Some(snapshot), events))
        } else {
            let events = self.get_events_for_aggregate(aggregate_id).await?;
            Ok((None, events))
        }
    }
}

impl<T: EventStore + ?Sized> EventStoreExt for T {}

/// Error returned when a batch handed to `append` is malformed.
#[derive(Debug, Clone)]
pub struct AppendValidationError {
    pub message: String,
}

impl std::fmt::Display for AppendValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Append validation error: {}", self.message)
    }
}

impl std::error::Error for AppendValidationError {}

/// Checks a batch before it touches storage: non-empty, one aggregate,
/// contiguous versions.
pub fn validate_events_for_append(
    events: &[EventEnvelope],
) -> std::result::Result<(), AppendValidationError> {
    if events.is_empty() {
        return Err(AppendValidationError {
            message: "Cannot append empty event list".to_string(),
        });
    }

    let first = &events[0];
    for event in events.iter().skip(1) {
        if event.aggregate_id != first.aggregate_id {
            return Err(AppendValidationError {
                message: "All events must be for the same aggregate".to_string(),
            });
        }
        if event.aggregate_type != first.aggregate_type {
            return Err(AppendValidationError {
                message: "All events must have the same aggregate type".to_string(),
            });
        }
    }

    let mut expected_version = first.version;
    for event in events.iter().skip(1) {
        expected_version = expected_version.next();
        if event.version != expected_version {
            return Err(AppendValidationError {
                message: format!(
                    "Event versions must be sequential. Expected {}, got {}",
                    expected_version, event.version
                ),
            });
        }
    }

    Ok(())
}
