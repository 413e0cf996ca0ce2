use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    AggregateId, EventEnvelope, EventQuery, EventStoreError, Result, Snapshot, Version,
    store::{AppendOptions, EventStore, EventStream, validate_events_for_append},
};

/// In-memory event store.
///
/// Backs the default wiring and the test suites. Behaves like the
/// PostgreSQL store, including the optimistic concurrency check on
/// append, so orchestration code sees the same conflicts either way.
#[derive(Clone, Default)]
pub struct InMemoryEventStore {
    events: Arc<RwLock<Vec<EventEnvelope>>>,
    snapshots: Arc<RwLock<HashMap<AggregateId, Snapshot>>>,
}

impl InMemoryEventStore {
    /// Creates a new empty in-memory event store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of events stored.
    pub async fn event_count(&self) -> usize {
        self.events.read().await.len()
    }

    /// Clears all events and snapshots.
    pub async fn clear(&self) {
        self.events.write().await.clear();
        self.snapshots.write().await.clear();
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn append(&self, events: Vec<EventEnvelope>, options: AppendOptions) -> Result<Version> {
        validate_events_for_append(&events).map_err(|e| {
            EventStoreError::Serialization(serde_json::Error::io(std::io::Error::other(e.message)))
        })?;

        let aggregate_id = events[0].aggregate_id;
        let incoming_version = events[0].version;

        let mut log = self.events.write().await;

        let current_version = log
            .iter()
            .filter(|e| e.aggregate_id == aggregate_id)
            .map(|e| e.version)
            .max()
            .unwrap_or(Version::initial());

        if let Some(expected) = options.expected_version
            && current_version != expected
        {
            metrics::counter!("event_store_concurrency_conflicts_total").increment(1);
            tracing::debug!(
                %aggregate_id,
                expected = expected.as_i64(),
                actual = current_version.as_i64(),
                "append rejected: version mismatch"
            );
            return Err(EventStoreError::ConcurrencyConflict {
                aggregate_id,
                expected,
                actual: current_version,
            });
        }

        // Mirrors the unique (aggregate_id, version) constraint in Postgres
        if incoming_version <= current_version && current_version != Version::initial() {
            return Err(EventStoreError::ConcurrencyConflict {
                aggregate_id,
                expected: options.expected_version.unwrap_or(current_version),
                actual: current_version,
            });
        }

        let last_version = events
            .last()
            .map(|e| e.version)
            .unwrap_or(Version::initial());
        log.extend(events);

        Ok(last_version)
    }

    async fn get_events_for_aggregate(
        &self,
        aggregate_id: AggregateId,
    ) -> Result<Vec<EventEnvelope>> {
        let log = self.events.read().await;
        let mut events: Vec<_> = log
            .iter()
            .filter(|e| e.aggregate_id == aggregate_id)
            .cloned()
            .collect();
        events.sort_by_key(|e| e.version);
        Ok(events)
    }

    async fn get_events_for_aggregate_from_version(
        &self,
        aggregate_id: AggregateId,
        from_version: Version,
    ) -> Result<Vec<EventEnvelope>> {
        let log = self.events.read().await;
        let mut events: Vec<_> = log
            .iter()
            .filter(|e| e.aggregate_id == aggregate_id && e.version >= from_version)
            .cloned()
            .collect();
        events.sort_by_key(|e| e.version);
        Ok(events)
    }

    async fn query_events(&self, query: EventQuery) -> Result<Vec<EventEnvelope>> {
        let log = self.events.read().await;
        let mut events: Vec<_> = log
            .iter()
            .filter(|e| {
                if let Some(id) = query.aggregate_id
                    && e.aggregate_id != id
                {
                    return false;
                }
                if let Some(ref agg_type) = query.aggregate_type
                    && &e.aggregate_type != agg_type
                {
                    return false;
                }
                if let Some(ref types) = query.event_types
                    && !types.contains(&e.event_type)
                {
                    return false;
                }
                if let Some(from) = query.from_version
                    && e.version < from
                {
                    return false;
                }
                if let Some(to) = query.to_version
                    && e.version > to
                {
                    return false;
                }
                if let Some(from) = query.from_timestamp
                    && e.timestamp < from
                {
                    return false;
                }
                if let Some(to) = query.to_timestamp
                    && e.timestamp > to
                {
                    return false;
                }
                true
            })
            .cloned()
            .collect();

        events.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then(a.version.cmp(&b.version))
        });

        let offset = query.offset.unwrap_or(0);
        let events: Vec<_> = events.into_iter().skip(offset).collect();

        let events = if let Some(limit) = query.limit {
            events.into_iter().take(limit).collect()
        } else {
            events
        };

        Ok(events)
    }

    async fn get_events_by_type(&self, event_type: &str) -> Result<Vec<EventEnvelope>> {
        let log = self.events.read().await;
        let mut events: Vec<_> = log
            .iter()
            .filter(|e| e.event_type == event_type)
            .cloned()
            .collect();
        events.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        Ok(events)
    }

    async fn stream_all_events(&self) -> Result<EventStream> {
        use futures_util::stream;

        let log = self.events.read().await;
        let mut events = log.clone();
        // Event id breaks timestamp ties so replay order is stable
        events.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then(a.event_id.as_uuid().cmp(&b.event_id.as_uuid()))
        });

        let stream = stream::iter(events.into_iter().map(Ok));
        Ok(Box::pin(stream))
    }

    async fn get_aggregate_version(&self, aggregate_id: AggregateId) -> Result<Option<Version>> {
        let log = self.events.read().await;
        let version = log
            .iter()
            .filter(|e| e.aggregate_id == aggregate_id)
            .map(|e| e.version)
            .max();
        Ok(version)
    }

    async fn save_snapshot(&self, snapshot: Snapshot) -> Result<()> {
        let mut snapshots = self.snapshots.write().await;
        snapshots.insert(snapshot.aggregate_id, snapshot);
        Ok(())
    }

    async fn get_snapshot(&self, aggregate_id: AggregateId) -> Result<Option<Snapshot>> {
        let snapshots = self.snapshots.read().await;
        Ok(snapshots.get(&aggregate_id).cloned())
    }
}
