//! Notification aggregate and its delivery/read state machines.

use super::{NotificationDomainError, ParseChannelError, ParseDeliveryStateError};
use crate::ticket::domain::{NotificationId, TicketId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Delivery channel of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// In-application inbox entry; delivered at creation, read-tracked.
    Internal,
    /// Outbound email; delivered later by the delivery worker.
    Email,
    /// Reserved for future channels.
    Other,
}

impl Channel {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Internal => "internal",
            Self::Email => "email",
            Self::Other => "other",
        }
    }

    /// Returns the human-readable label used in message copy.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Internal => "inbox",
            Self::Email => "email",
            Self::Other => "other",
        }
    }
}

impl TryFrom<&str> for Channel {
    type Error = ParseChannelError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "internal" => Ok(Self::Internal),
            "email" => Ok(Self::Email),
            "other" => Ok(Self::Other),
            _ => Err(ParseChannelError(value.to_owned())),
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Delivery state of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryState {
    /// Awaiting delivery.
    Pending,
    /// Delivered.
    Sent,
    /// Delivery failed terminally; no automatic retry.
    Error,
}

impl DeliveryState {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Sent => "sent",
            Self::Error => "error",
        }
    }
}

impl TryFrom<&str> for DeliveryState {
    type Error = ParseDeliveryStateError;

    fn try_from(value: &str) -> Result<Self, ParseDeliveryStateError> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "pending" => Ok(Self::Pending),
            "sent" => Ok(Self::Sent),
            "error" => Ok(Self::Error),
            _ => Err(ParseDeliveryStateError(value.to_owned())),
        }
    }
}

impl std::fmt::Display for DeliveryState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input for creating a notification row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationDraft {
    /// Ticket the notification is about, if any.
    pub ticket_id: Option<TicketId>,
    /// User whose action triggered the notification, if any.
    pub origin: Option<UserId>,
    /// Destination user.
    pub recipient: UserId,
    /// Rendered subject line.
    pub subject: String,
    /// Rendered body.
    pub body: String,
}

/// Parameter object for reconstructing a persisted notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedNotificationData {
    /// Persisted identifier.
    pub id: NotificationId,
    /// Persisted ticket reference, if any.
    pub ticket_id: Option<TicketId>,
    /// Persisted origin user, if any.
    pub origin: Option<UserId>,
    /// Persisted destination user.
    pub recipient: UserId,
    /// Persisted channel.
    pub channel: Channel,
    /// Persisted subject.
    pub subject: String,
    /// Persisted body.
    pub body: String,
    /// Persisted delivery state.
    pub delivery: DeliveryState,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted delivery-outcome timestamp, if any.
    pub sent_at: Option<DateTime<Utc>>,
    /// Persisted read timestamp, if any (internal channel only).
    pub read_at: Option<DateTime<Utc>>,
}

/// One delivery obligation to one user.
///
/// For the email channel the delivery state moves only `pending → sent`
/// or `pending → error`, each stamping `sent_at`. Internal notifications
/// are `sent` from creation and track `read_at` at most once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    id: NotificationId,
    ticket_id: Option<TicketId>,
    origin: Option<UserId>,
    recipient: UserId,
    channel: Channel,
    subject: String,
    body: String,
    delivery: DeliveryState,
    created_at: DateTime<Utc>,
    sent_at: Option<DateTime<Utc>>,
    read_at: Option<DateTime<Utc>>,
}

impl Notification {
    /// Creates an internal notification, delivered at creation.
    #[must_use]
    pub fn internal(draft: NotificationDraft, now: DateTime<Utc>) -> Self {
        Self::new(draft, Channel::Internal, DeliveryState::Sent, Some(now), now)
    }

    /// Creates an email notification awaiting delivery.
    #[must_use]
    pub fn email(draft: NotificationDraft, now: DateTime<Utc>) -> Self {
        Self::new(draft, Channel::Email, DeliveryState::Pending, None, now)
    }

    fn new(
        draft: NotificationDraft,
        channel: Channel,
        delivery: DeliveryState,
        sent_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: NotificationId::new(),
            ticket_id: draft.ticket_id,
            origin: draft.origin,
            recipient: draft.recipient,
            channel,
            subject: draft.subject,
            body: draft.body,
            delivery,
            created_at: now,
            sent_at,
            read_at: None,
        }
    }

    /// Reconstructs a notification from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedNotificationData) -> Self {
        Self {
            id: data.id,
            ticket_id: data.ticket_id,
            origin: data.origin,
            recipient: data.recipient,
            channel: data.channel,
            subject: data.subject,
            body: data.body,
            delivery: data.delivery,
            created_at: data.created_at,
            sent_at: data.sent_at,
            read_at: data.read_at,
        }
    }

    /// Returns the notification identifier.
    #[must_use]
    pub const fn id(&self) -> NotificationId {
        self.id
    }

    /// Returns the referenced ticket, if any.
    #[must_use]
    pub const fn ticket_id(&self) -> Option<TicketId> {
        self.ticket_id
    }

    /// Returns the origin user, if any.
    #[must_use]
    pub const fn origin(&self) -> Option<UserId> {
        self.origin
    }

    /// Returns the destination user.
    #[must_use]
    pub const fn recipient(&self) -> UserId {
        self.recipient
    }

    /// Returns the channel.
    #[must_use]
    pub const fn channel(&self) -> Channel {
        self.channel
    }

    /// Returns the subject line.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Returns the body.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Returns the delivery state.
    #[must_use]
    pub const fn delivery(&self) -> DeliveryState {
        self.delivery
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the delivery-outcome timestamp, if any.
    #[must_use]
    pub const fn sent_at(&self) -> Option<DateTime<Utc>> {
        self.sent_at
    }

    /// Returns the read timestamp, if any.
    #[must_use]
    pub const fn read_at(&self) -> Option<DateTime<Utc>> {
        self.read_at
    }

    /// Returns `true` for internal notifications not yet read.
    #[must_use]
    pub const fn is_unread(&self) -> bool {
        matches!(self.channel, Channel::Internal) && self.read_at.is_none()
    }

    /// Records a successful delivery.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationDomainError::NotPending`] unless the
    /// notification is pending.
    pub fn mark_sent(&mut self, now: DateTime<Utc>) -> Result<(), NotificationDomainError> {
        self.record_outcome(DeliveryState::Sent, now)
    }

    /// Records a terminal delivery failure.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationDomainError::NotPending`] unless the
    /// notification is pending.
    pub fn mark_failed(&mut self, now: DateTime<Utc>) -> Result<(), NotificationDomainError> {
        self.record_outcome(DeliveryState::Error, now)
    }

    fn record_outcome(
        &mut self,
        outcome: DeliveryState,
        now: DateTime<Utc>,
    ) -> Result<(), NotificationDomainError> {
        if self.delivery != DeliveryState::Pending {
            return Err(NotificationDomainError::NotPending {
                id: self.id,
                state: self.delivery,
            });
        }
        self.delivery = outcome;
        self.sent_at = Some(now);
        Ok(())
    }

    /// Stamps the read timestamp. Returns `false` when the notification
    /// was already read (the original timestamp is kept).
    ///
    /// # Errors
    ///
    /// Returns [`NotificationDomainError::NotReadTracked`] for channels
    /// other than [`Channel::Internal`].
    pub fn mark_read(&mut self, now: DateTime<Utc>) -> Result<bool, NotificationDomainError> {
        if self.channel != Channel::Internal {
            return Err(NotificationDomainError::NotReadTracked {
                id: self.id,
                channel: self.channel,
            });
        }
        if self.read_at.is_some() {
            return Ok(false);
        }
        self.read_at = Some(now);
        Ok(true)
    }
}
