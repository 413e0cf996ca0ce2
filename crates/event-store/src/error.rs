use thiserror::Error;

use crate::{AggregateId, Version};

/// Errors surfaced by event store operations.
#[derive(Debug, Error)]
pub enum EventStoreError {
    /// Another writer appended to the stream between this writer's read
    /// and its conditional append. Reload and retry, or give up.
    #[error(
        "Concurrency conflict for aggregate {aggregate_id}: expected version {expected}, found {actual}"
    )]
    ConcurrencyConflict {
        aggregate_id: AggregateId,
        expected: Version,
        actual: Version,
    },

    /// The stream has no events.
    #[error("Aggregate not found: {0}")]
    AggregateNotFound(AggregateId),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for event store operations.
pub type Result<T> = std::result::Result<T, EventStoreError>;
