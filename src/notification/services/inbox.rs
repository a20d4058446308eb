//! User-facing inbox service: list, mark-read and the unread summary.

use crate::notification::domain::{Channel, Notification};
use crate::notification::ports::NotificationStore;
use crate::ticket::domain::{Actor, NotificationId};
use crate::ticket::ports::StoreError;
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;

/// Errors returned by inbox operations.
#[derive(Debug, Clone, Error)]
pub enum InboxError {
    /// The notification does not exist.
    #[error("notification not found: {0}")]
    NotFound(NotificationId),

    /// The caller is not the notification's destination user.
    #[error("notification {0} belongs to another user")]
    NotRecipient(NotificationId),

    /// Read tracking applies to the internal channel only.
    #[error("notification {id} on channel {channel} has no read tracking")]
    NotReadTracked {
        /// Notification whose read was rejected.
        id: NotificationId,
        /// Channel the notification was created on.
        channel: Channel,
    },

    /// Store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Unread count plus the most recent notifications for one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboxSummary {
    /// Number of unread internal notifications.
    pub unread: u64,
    /// Most recent notifications on any channel, newest first.
    pub recent: Vec<Notification>,
}

/// Inbox access scoped to the calling user's own notifications.
#[derive(Clone)]
pub struct NotificationInboxService<S, C>
where
    S: NotificationStore,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    clock: Arc<C>,
}

impl<S, C> NotificationInboxService<S, C>
where
    S: NotificationStore,
    C: Clock + Send + Sync,
{
    /// Creates a new inbox service.
    #[must_use]
    pub const fn new(store: Arc<S>, clock: Arc<C>) -> Self {
        Self { store, clock }
    }

    /// Returns the caller's notifications on every channel, newest
    /// first. Email rows carry their delivery state, which is the only
    /// caller-visible trace of a failed delivery.
    ///
    /// # Errors
    ///
    /// Returns [`InboxError::Store`] when the lookup fails.
    pub async fn list_for(&self, actor: &Actor) -> Result<Vec<Notification>, InboxError> {
        Ok(self.store.inbox_for(actor.user_id()).await?)
    }

    /// Marks one of the caller's notifications as read.
    ///
    /// Repeat calls are idempotent: an already-read notification is
    /// returned unchanged with its original read timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`InboxError::NotFound`] for unknown identifiers,
    /// [`InboxError::NotRecipient`] when the notification belongs to
    /// another user, and [`InboxError::NotReadTracked`] for non-internal
    /// channels.
    pub async fn mark_read(
        &self,
        id: NotificationId,
        actor: &Actor,
    ) -> Result<Notification, InboxError> {
        let notification = self
            .store
            .find_notification(id)
            .await?
            .ok_or(InboxError::NotFound(id))?;
        if notification.recipient() != actor.user_id() {
            return Err(InboxError::NotRecipient(id));
        }
        if notification.channel() != Channel::Internal {
            return Err(InboxError::NotReadTracked {
                id,
                channel: notification.channel(),
            });
        }
        if notification.read_at().is_some() {
            return Ok(notification);
        }

        // The conditional stamp keeps read_at first-write-wins under
        // concurrent calls; re-reading returns the stored truth either
        // way.
        self.store
            .mark_notification_read(id, self.clock.utc())
            .await?;
        self.store
            .find_notification(id)
            .await?
            .ok_or(InboxError::NotFound(id))
    }

    /// Returns the caller's unread count and `limit` most recent
    /// notifications.
    ///
    /// # Errors
    ///
    /// Returns [`InboxError::Store`] when a lookup fails.
    pub async fn summary(&self, actor: &Actor, limit: u32) -> Result<InboxSummary, InboxError> {
        let unread = self.store.inbox_unread_count(actor.user_id()).await?;
        let recent = self.store.inbox_recent(actor.user_id(), limit).await?;
        Ok(InboxSummary { unread, recent })
    }
}
