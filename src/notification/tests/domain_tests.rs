//! Unit tests for the notification delivery and read state machines.

use crate::notification::domain::{
    Channel, DeliveryState, Notification, NotificationDomainError, NotificationDraft,
};
use crate::ticket::domain::{TicketId, UserId};
use chrono::{Duration, Utc};
use eyre::{Result, ensure};
use rstest::rstest;

fn draft() -> NotificationDraft {
    NotificationDraft {
        ticket_id: Some(TicketId::new()),
        origin: Some(UserId::new()),
        recipient: UserId::new(),
        subject: "Ticket 123: broken till".to_owned(),
        body: "details".to_owned(),
    }
}

#[rstest]
fn internal_notifications_are_sent_at_creation() {
    let now = Utc::now();
    let notification = Notification::internal(draft(), now);

    assert_eq!(notification.channel(), Channel::Internal);
    assert_eq!(notification.delivery(), DeliveryState::Sent);
    assert_eq!(notification.sent_at(), Some(now));
    assert!(notification.is_unread());
}

#[rstest]
fn email_notifications_start_pending() {
    let notification = Notification::email(draft(), Utc::now());

    assert_eq!(notification.channel(), Channel::Email);
    assert_eq!(notification.delivery(), DeliveryState::Pending);
    assert!(notification.sent_at().is_none());
    assert!(!notification.is_unread());
}

#[rstest]
fn mark_sent_transitions_pending_to_sent() -> Result<()> {
    let mut notification = Notification::email(draft(), Utc::now());
    let delivered = Utc::now();

    notification.mark_sent(delivered)?;

    ensure!(notification.delivery() == DeliveryState::Sent, "state");
    ensure!(notification.sent_at() == Some(delivered), "sent_at stamped");
    Ok(())
}

#[rstest]
fn mark_failed_transitions_pending_to_error() -> Result<()> {
    let mut notification = Notification::email(draft(), Utc::now());
    let attempted = Utc::now();

    notification.mark_failed(attempted)?;

    ensure!(notification.delivery() == DeliveryState::Error, "state");
    ensure!(notification.sent_at() == Some(attempted), "sent_at stamped");
    Ok(())
}

#[rstest]
fn delivery_outcome_is_terminal() -> Result<()> {
    let mut notification = Notification::email(draft(), Utc::now());
    notification.mark_failed(Utc::now())?;

    let result = notification.mark_sent(Utc::now());

    ensure!(
        matches!(result, Err(NotificationDomainError::NotPending { .. })),
        "expected NotPending, got {result:?}"
    );
    Ok(())
}

#[rstest]
fn mark_read_stamps_once_and_keeps_the_first_timestamp() -> Result<()> {
    let mut notification = Notification::internal(draft(), Utc::now());
    let first = Utc::now();
    let later = first + Duration::minutes(5);

    ensure!(notification.mark_read(first)?, "first call stamps");
    ensure!(!notification.mark_read(later)?, "second call is a no-op");
    ensure!(notification.read_at() == Some(first), "first timestamp wins");
    ensure!(!notification.is_unread(), "read notifications are not unread");
    Ok(())
}

#[rstest]
fn mark_read_rejects_email_notifications() {
    let mut notification = Notification::email(draft(), Utc::now());

    let result = notification.mark_read(Utc::now());

    assert!(matches!(
        result,
        Err(NotificationDomainError::NotReadTracked { .. })
    ));
}
