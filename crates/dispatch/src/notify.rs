//! Notification records and the dispatcher that fans them out.
//!
//! Notifications are plain append-only records, not event-sourced. The
//! engine emits them as side effects of state transitions; a failed
//! notification never rolls the transition back.

use chrono::{DateTime, Utc};
use common::UserId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DispatchError, Result};
use crate::services::directory::UserDirectory;
use crate::services::notifications::NotificationStore;

/// The category of a notification, used by the UI to pick an icon and
/// a landing page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// A delivery job was created, claimed or handed over.
    DeliveryJob,

    /// An order changed status (payment, delivery steps).
    OrderStatus,

    /// Greeting sent once at registration.
    Welcome,
}

impl NotificationKind {
    /// Returns the kind name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::DeliveryJob => "delivery_job",
            NotificationKind::OrderStatus => "order_status",
            NotificationKind::Welcome => "welcome",
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A user-facing notification record.
///
/// `seq` is assigned by the store and increases monotonically across
/// all recipients; clients use their last-seen `seq` as a resume
/// cursor when re-subscribing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// Unique notification id.
    pub id: Uuid,

    /// Store-global monotonic sequence number.
    pub seq: u64,

    /// The user this notification is for.
    pub recipient: UserId,

    /// Category of the notification.
    pub kind: NotificationKind,

    /// Short headline.
    pub title: String,

    /// Human-readable body.
    pub message: String,

    /// Structured payload (job ids, order ids) for the UI to link with.
    pub payload: serde_json::Value,

    /// Whether the recipient has marked it read.
    pub read: bool,

    /// When the notification was created.
    pub created_at: DateTime<Utc>,
}

/// Fans notifications out to recipients.
///
/// Checks every recipient against the user directory before appending,
/// so a bad id surfaces as [`DispatchError::UnknownRecipient`] instead
/// of an orphaned record.
#[derive(Debug, Clone)]
pub struct NotificationDispatcher<D: UserDirectory, N: NotificationStore> {
    directory: D,
    store: N,
}

impl<D: UserDirectory, N: NotificationStore> NotificationDispatcher<D, N> {
    /// Creates a new dispatcher over the given directory and store.
    pub fn new(directory: D, store: N) -> Self {
        Self { directory, store }
    }

    /// Sends one notification to a recipient.
    #[tracing::instrument(skip(self, title, message, payload), fields(%recipient, kind = %kind))]
    pub async fn notify(
        &self,
        recipient: UserId,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
        payload: serde_json::Value,
    ) -> Result<Notification> {
        if !self.directory.exists(recipient).await {
            return Err(DispatchError::UnknownRecipient { user_id: recipient });
        }

        let record = self
            .store
            .append(recipient, kind, &title.into(), &message.into(), payload)
            .await?;

        metrics::counter!("notifications_sent_total").increment(1);
        tracing::debug!(seq = record.seq, "notification appended");

        Ok(record)
    }

    /// Sends a notification, logging and swallowing any failure.
    ///
    /// Engine call sites use this variant: the state transition that
    /// triggered the notification has already committed.
    pub async fn notify_or_log(
        &self,
        recipient: UserId,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
        payload: serde_json::Value,
    ) -> Option<Notification> {
        match self.notify(recipient, kind, title, message, payload).await {
            Ok(record) => Some(record),
            Err(err) => {
                tracing::warn!(%recipient, error = %err, "notification dropped");
                None
            }
        }
    }

    /// Sends the registration greeting to a new user.
    pub async fn send_welcome(&self, user_id: UserId) -> Result<Notification> {
        self.notify(
            user_id,
            NotificationKind::Welcome,
            "Welcome to AgroCom!",
            "Your account was created successfully. Start exploring the marketplace.",
            serde_json::Value::Null,
        )
        .await
    }
}
