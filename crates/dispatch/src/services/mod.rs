//! Boundary service traits and in-memory implementations.

pub mod directory;
pub mod notifications;

pub use directory::{InMemoryUserDirectory, Role, UserDirectory, UserRecord};
pub use notifications::{InMemoryNotificationStore, NotificationStore};
