//! Persistence port for notification queries and delivery-state updates.
//!
//! Notification rows are created inside ticket transactions through
//! [`crate::ticket::ports::StoreTx::insert_notification`]; this port
//! covers the read side and the single-row updates performed outside of
//! any ticket transaction.

use crate::notification::domain::Notification;
use crate::ticket::domain::{NotificationId, TicketId, UserId};
use crate::ticket::ports::StoreResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Terminal outcome of one email delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The transport accepted the message.
    Sent,
    /// Delivery failed; no automatic retry.
    Failed,
}

/// Notification persistence contract.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Finds a notification by identifier.
    async fn find_notification(&self, id: NotificationId)
    -> StoreResult<Option<Notification>>;

    /// Returns the recipient's notifications on every channel, newest
    /// first. Email rows expose their delivery state, so a stuck
    /// `pending` or terminal `error` delivery is visible to its
    /// recipient.
    async fn inbox_for(&self, recipient: UserId) -> StoreResult<Vec<Notification>>;

    /// Returns the recipient's most recent notifications, newest first,
    /// at most `limit` rows.
    async fn inbox_recent(&self, recipient: UserId, limit: u32) -> StoreResult<Vec<Notification>>;

    /// Counts the recipient's unread internal notifications.
    async fn inbox_unread_count(&self, recipient: UserId) -> StoreResult<u64>;

    /// Stamps the read timestamp if it is not already set. Returns
    /// `true` when this call performed the stamping.
    async fn mark_notification_read(
        &self,
        id: NotificationId,
        read_at: DateTime<Utc>,
    ) -> StoreResult<bool>;

    /// Returns a ticket's email notifications still awaiting delivery,
    /// oldest first.
    async fn pending_email_for_ticket(&self, ticket_id: TicketId)
    -> StoreResult<Vec<Notification>>;

    /// Records the terminal outcome of one delivery attempt, stamping
    /// `sent_at`.
    async fn record_delivery_outcome(
        &self,
        id: NotificationId,
        outcome: DeliveryOutcome,
        sent_at: DateTime<Utc>,
    ) -> StoreResult<()>;
}
