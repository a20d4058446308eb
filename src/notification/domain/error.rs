//! Error types for notification domain transitions and parsing.

use super::{Channel, DeliveryState};
use crate::ticket::domain::NotificationId;
use thiserror::Error;

/// Errors raised by notification state transitions.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NotificationDomainError {
    /// A delivery outcome was recorded for a notification that is not
    /// pending.
    #[error("notification {id} is {state}, not pending")]
    NotPending {
        /// Notification whose transition was rejected.
        id: NotificationId,
        /// Delivery state the notification was found in.
        state: DeliveryState,
    },

    /// Read tracking applies to the internal channel only.
    #[error("notification {id} on channel {channel} has no read tracking")]
    NotReadTracked {
        /// Notification whose read was rejected.
        id: NotificationId,
        /// Channel the notification was created on.
        channel: Channel,
    },
}

/// Error returned while parsing channels from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown notification channel: {0}")]
pub struct ParseChannelError(pub String);

/// Error returned while parsing delivery states from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown delivery state: {0}")]
pub struct ParseDeliveryStateError(pub String);
