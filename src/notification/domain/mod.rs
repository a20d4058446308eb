//! Domain model for notifications.

mod error;
mod notification;

pub use error::{NotificationDomainError, ParseChannelError, ParseDeliveryStateError};
pub use notification::{
    Channel, DeliveryState, Notification, NotificationDraft, PersistedNotificationData,
};
