//! Command handling infrastructure.
//!
//! A [`CommandHandler`] turns a command closure into a load, decide,
//! append cycle against one aggregate stream. The append carries the
//! version the aggregate was loaded at, so every state change rides the
//! store's optimistic concurrency check.

use std::marker::PhantomData;

use common::AggregateId;
use event_store::{AppendOptions, EventEnvelope, EventStore, EventStoreExt, Snapshot, Version};
use serde::Serialize;

use crate::aggregate::{Aggregate, DomainEvent, SnapshotCapable};
use crate::error::DomainError;

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult<A: Aggregate> {
    /// The aggregate after applying the new events.
    pub aggregate: A,

    /// The events that were generated and persisted.
    pub events: Vec<A::Event>,

    /// The new version of the aggregate after the command.
    pub new_version: Version,
}

/// Trait for commands that can be executed against an aggregate.
///
/// A command states an intention; the aggregate's current state decides
/// whether it is allowed.
pub trait Command: Send + Sync {
    /// The type of aggregate this command targets.
    type Aggregate: Aggregate;

    /// Returns the ID of the aggregate this command targets.
    fn aggregate_id(&self) -> AggregateId;
}

/// Executes commands against one aggregate type.
///
/// Loading goes through the snapshot when one exists, then replays the
/// remaining events. Persisting appends at the loaded version.
pub struct CommandHandler<S, A>
where
    S: EventStore,
    A: Aggregate,
{
    store: S,
    _phantom: PhantomData<A>,
}

impl<S, A> CommandHandler<S, A>
where
    S: EventStore,
    A: Aggregate,
{
    /// Creates a new command handler over the given event store.
    pub fn new(store: S) -> Self {
        Self {
            store,
            _phantom: PhantomData,
        }
    }

    /// Returns a reference to the underlying event store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Loads an aggregate from the event store.
    ///
    /// An aggregate with no events comes back as the default instance;
    /// callers distinguish "new" from "existing" via [`Aggregate::id`].
    pub async fn load(&self, aggregate_id: AggregateId) -> Result<A, DomainError>
    where
        A: for<'de> serde::Deserialize<'de>,
        A::Event: for<'de> serde::Deserialize<'de>,
    {
        let (snapshot, events) = self.store.load_aggregate(aggregate_id).await?;

        let mut aggregate = if let Some(snapshot) = snapshot {
            self.restore_from_snapshot(snapshot)?
        } else {
            A::default()
        };

        for envelope in events {
            let event: A::Event = serde_json::from_value(envelope.payload)?;
            aggregate.apply(event);
            aggregate.set_version(envelope.version);
        }

        Ok(aggregate)
    }

    /// Loads an aggregate, returning None if it doesn't exist.
    pub async fn load_existing(&self, aggregate_id: AggregateId) -> Result<Option<A>, DomainError>
    where
        A: for<'de> serde::Deserialize<'de>,
        A::Event: for<'de> serde::Deserialize<'de>,
    {
        let aggregate = self.load(aggregate_id).await?;
        if aggregate.id().is_some() {
            Ok(Some(aggregate))
        } else {
            Ok(None)
        }
    }

    /// Executes a command and persists the resulting events.
    ///
    /// The command function sees the current aggregate state and returns
    /// the events to record, or a domain error.
    ///
    /// Events are appended expecting the version the aggregate was loaded
    /// at, so two writers racing on one stream produce exactly one winner;
    /// the loser gets a concurrency conflict and must reload. Claiming a
    /// delivery job leans on exactly this property.
    pub async fn execute<F>(
        &self,
        aggregate_id: AggregateId,
        command_fn: F,
    ) -> Result<CommandResult<A>, DomainError>
    where
        A: for<'de> serde::Deserialize<'de>,
        A::Event: for<'de> serde::Deserialize<'de> + Serialize,
        F: FnOnce(&A) -> Result<Vec<A::Event>, A::Error>,
        DomainError: From<A::Error>,
    {
        let mut aggregate = self.load(aggregate_id).await?;
        let loaded_version = aggregate.version();

        let events = command_fn(&aggregate)?;

        // Nothing to record, nothing to persist
        if events.is_empty() {
            return Ok(CommandResult {
                aggregate,
                events: vec![],
                new_version: loaded_version,
            });
        }

        let envelopes = self.build_envelopes(aggregate_id, loaded_version, &events)?;

        let options = if loaded_version == Version::initial() {
            AppendOptions::expect_new()
        } else {
            AppendOptions::expect_version(loaded_version)
        };

        let new_version = self.store.append(envelopes, options).await?;

        for event in &events {
            aggregate.apply(event.clone());
        }
        aggregate.set_version(new_version);

        Ok(CommandResult {
            aggregate,
            events,
            new_version,
        })
    }

    /// Wraps domain events in envelopes with sequential versions.
    fn build_envelopes(
        &self,
        aggregate_id: AggregateId,
        loaded_version: Version,
        events: &[A::Event],
    ) -> Result<Vec<EventEnvelope>, DomainError>
    where
        A::Event: Serialize,
    {
        let mut envelopes = Vec::with_capacity(events.len());
        let mut version = loaded_version;

        for event in events {
            version = version.next();
            let envelope = EventEnvelope::builder()
                .aggregate_id(aggregate_id)
                .aggregate_type(A::aggregate_type())
                .event_type(event.event_type())
                .version(version)
                .payload(event)?
                .build();
            envelopes.push(envelope);
        }

        Ok(envelopes)
    }

    fn restore_from_snapshot(&self, snapshot: Snapshot) -> Result<A, DomainError>
    where
        A: for<'de> serde::Deserialize<'de>,
    {
        let aggregate: A = serde_json::from_value(snapshot.state)?;
        Ok(aggregate)
    }
}

impl<S, A> CommandHandler<S, A>
where
    S: EventStore,
    A: SnapshotCapable,
{
    /// Executes a command, then saves a snapshot when the aggregate has
    /// crossed its snapshot interval.
    pub async fn execute_with_snapshot<F>(
        &self,
        aggregate_id: AggregateId,
        command_fn: F,
    ) -> Result<CommandResult<A>, DomainError>
    where
        A: for<'de> serde::Deserialize<'de>,
        A::Event: for<'de> serde::Deserialize<'de> + Serialize,
        F: FnOnce(&A) -> Result<Vec<A::Event>, A::Error>,
        DomainError: From<A::Error>,
    {
        let result = self.execute(aggregate_id, command_fn).await?;

        if result.aggregate.should_snapshot() {
            let snapshot = Snapshot::from_state(
                aggregate_id,
                A::aggregate_type(),
                result.new_version,
                &result.aggregate,
            )?;
            self.store.save_snapshot(snapshot).await?;
        }

        Ok(result)
    }
}
