//! Notification store trait and in-memory implementation.
//!
//! The store is append-only with a global monotonic `seq`. Live
//! delivery rides a per-recipient broadcast channel; a subscriber gets
//! the backlog after its cursor plus the feed, so delivery to the UI
//! is at-least-once and a lagged client recovers by re-subscribing
//! from its last-seen `seq`.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::Utc;
use common::UserId;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::error::Result;
use crate::notify::{Notification, NotificationKind};

const FEED_CAPACITY: usize = 256;

/// Trait for notification persistence and delivery.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Appends one notification, assigning its id and sequence number.
    async fn append(
        &self,
        recipient: UserId,
        kind: NotificationKind,
        title: &str,
        message: &str,
        payload: serde_json::Value,
    ) -> Result<Notification>;

    /// Returns the recipient's notifications with `seq` greater than
    /// `after_seq`, oldest first.
    async fn for_recipient(&self, recipient: UserId, after_seq: u64) -> Result<Vec<Notification>>;

    /// Returns how many of the recipient's notifications are unread.
    async fn unread_count(&self, recipient: UserId) -> Result<usize>;

    /// Marks one notification read.
    ///
    /// Returns true if the record exists and belongs to the recipient;
    /// only the recipient may flip their own read flag.
    async fn mark_read(&self, notification_id: Uuid, recipient: UserId) -> Result<bool>;

    /// Marks all of the recipient's notifications read, returning how
    /// many were newly marked.
    async fn mark_all_read(&self, recipient: UserId) -> Result<usize>;

    /// Opens a standing watch on the recipient's notifications.
    ///
    /// Returns the backlog after `after_seq` together with a live
    /// receiver. Backlog and receiver are taken under one lock, so no
    /// record falls between them.
    async fn subscribe(
        &self,
        recipient: UserId,
        after_seq: u64,
    ) -> Result<(Vec<Notification>, broadcast::Receiver<Notification>)>;
}

#[derive(Debug, Default)]
struct InMemoryNotificationState {
    records: Vec<Notification>,
    next_seq: u64,
    feeds: HashMap<UserId, broadcast::Sender<Notification>>,
}

/// In-memory notification store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNotificationStore {
    state: Arc<RwLock<InMemoryNotificationState>>,
}

impl InMemoryNotificationStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of stored notifications.
    pub fn total_count(&self) -> usize {
        self.state.read().unwrap().records.len()
    }
}

#[async_trait]
impl NotificationStore for InMemoryNotificationStore {
    async fn append(
        &self,
        recipient: UserId,
        kind: NotificationKind,
        title: &str,
        message: &str,
        payload: serde_json::Value,
    ) -> Result<Notification> {
        let mut state = self.state.write().unwrap();

        state.next_seq += 1;
        let record = Notification {
            id: Uuid::new_v4(),
            seq: state.next_seq,
            recipient,
            kind,
            title: title.to_string(),
            message: message.to_string(),
            payload,
            read: false,
            created_at: Utc::now(),
        };
        state.records.push(record.clone());

        if let Some(feed) = state.feeds.get(&recipient) {
            // No receivers is fine; the record is already stored.
            let _ = feed.send(record.clone());
        }

        Ok(record)
    }

    async fn for_recipient(&self, recipient: UserId, after_seq: u64) -> Result<Vec<Notification>> {
        let state = self.state.read().unwrap();
        Ok(state
            .records
            .iter()
            .filter(|n| n.recipient == recipient && n.seq > after_seq)
            .cloned()
            .collect())
    }

    async fn unread_count(&self, recipient: UserId) -> Result<usize> {
        let state = self.state.read().unwrap();
        Ok(state
            .records
            .iter()
            .filter(|n| n.recipient == recipient && !n.read)
            .count())
    }

    async fn mark_read(&self, notification_id: Uuid, recipient: UserId) -> Result<bool> {
        let mut state = self.state.write().unwrap();
        match state
            .records
            .iter_mut()
            .find(|n| n.id == notification_id && n.recipient == recipient)
        {
            Some(record) => {
                record.read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_all_read(&self, recipient: UserId) -> Result<usize> {
        let mut state = self.state.write().unwrap();
        let mut marked = 0;
        for record in state
            .records
            .iter_mut()
            .filter(|n| n.recipient == recipient && !n.read)
        {
            record.read = true;
            marked += 1;
        }
        Ok(marked)
    }

    async fn subscribe(
        &self,
        recipient: UserId,
        after_seq: u64,
    ) -> Result<(Vec<Notification>, broadcast::Receiver<Notification>)> {
        let mut state = self.state.write().unwrap();

        let receiver = state
            .feeds
            .entry(recipient)
            .or_insert_with(|| broadcast::channel(FEED_CAPACITY).0)
            .subscribe();

        let backlog = state
            .records
            .iter()
            .filter(|n| n.recipient == recipient && n.seq > after_seq)
            .cloned()
            .collect();

        Ok((backlog, receiver))
    }
}
