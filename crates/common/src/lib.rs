//! Shared identifier types for the AgroCom fulfillment engine.

pub mod types;

pub use types::{AggregateId, UserId};
