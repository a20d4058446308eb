//! Unit tests for the notification inbox service.

use crate::notification::domain::{Channel, DeliveryState, Notification, NotificationDraft};
use crate::notification::ports::{DeliveryOutcome, NotificationStore};
use crate::notification::services::{InboxError, NotificationInboxService};
use crate::ticket::adapters::memory::InMemoryTicketStore;
use crate::ticket::domain::{Actor, Role, TicketId, UserId};
use crate::ticket::ports::{StoreError, TicketStore};
use chrono::Utc;
use eyre::{OptionExt, Result, ensure};
use mockable::DefaultClock;
use rstest::rstest;
use std::sync::Arc;

type TestInbox = NotificationInboxService<InMemoryTicketStore, DefaultClock>;

fn inbox_service(store: &Arc<InMemoryTicketStore>) -> TestInbox {
    NotificationInboxService::new(Arc::clone(store), Arc::new(DefaultClock))
}

fn draft_for(recipient: UserId, subject: &str) -> NotificationDraft {
    NotificationDraft {
        ticket_id: Some(TicketId::new()),
        origin: None,
        recipient,
        subject: subject.to_owned(),
        body: "body".to_owned(),
    }
}

async fn seed_internal(
    store: &InMemoryTicketStore,
    recipient: UserId,
    subject: &str,
) -> Result<Notification> {
    let notification = Notification::internal(draft_for(recipient, subject), Utc::now());
    let row = notification.clone();
    store
        .transaction(move |tx| {
            tx.insert_notification(&row)?;
            Ok::<_, StoreError>(())
        })
        .await
        .map_err(|err| eyre::eyre!(err))?;
    Ok(notification)
}

async fn seed_email(store: &InMemoryTicketStore, recipient: UserId) -> Result<Notification> {
    let notification = Notification::email(draft_for(recipient, "email row"), Utc::now());
    let row = notification.clone();
    store
        .transaction(move |tx| {
            tx.insert_notification(&row)?;
            Ok::<_, StoreError>(())
        })
        .await
        .map_err(|err| eyre::eyre!(err))?;
    Ok(notification)
}

fn actor(user_id: UserId) -> Actor {
    Actor::new(user_id, Role::Supervisor, None)
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn list_scopes_to_the_caller_across_channels() -> Result<()> {
    let store = Arc::new(InMemoryTicketStore::new());
    let service = inbox_service(&store);
    let me = UserId::new();
    let someone_else = UserId::new();
    seed_internal(&store, me, "mine").await?;
    seed_internal(&store, someone_else, "theirs").await?;
    seed_email(&store, me).await?;

    let inbox = service.list_for(&actor(me)).await?;

    ensure!(inbox.len() == 2, "expected both of my rows, got {}", inbox.len());
    ensure!(
        inbox.iter().all(|row| row.recipient() == me),
        "foreign rows must never be listed"
    );
    ensure!(
        inbox.iter().any(|row| row.channel() == Channel::Email),
        "email rows belong to the list"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failed_email_deliveries_stay_visible_in_the_list() -> Result<()> {
    let store = Arc::new(InMemoryTicketStore::new());
    let service = inbox_service(&store);
    let me = UserId::new();
    let stuck = seed_email(&store, me).await?;
    let failed = seed_email(&store, me).await?;
    store
        .record_delivery_outcome(failed.id(), DeliveryOutcome::Failed, Utc::now())
        .await?;

    let inbox = service.list_for(&actor(me)).await?;

    let delivery_of = |id| {
        inbox
            .iter()
            .find(|row| row.id() == id)
            .map(Notification::delivery)
    };
    ensure!(
        delivery_of(stuck.id()) == Some(DeliveryState::Pending),
        "a stuck delivery must surface as pending"
    );
    ensure!(
        delivery_of(failed.id()) == Some(DeliveryState::Error),
        "a failed delivery must surface as error"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn mark_read_stamps_and_is_idempotent() -> Result<()> {
    let store = Arc::new(InMemoryTicketStore::new());
    let service = inbox_service(&store);
    let me = UserId::new();
    let seeded = seed_internal(&store, me, "mine").await?;

    let first = service.mark_read(seeded.id(), &actor(me)).await?;
    let first_read_at = first.read_at().ok_or_eyre("read_at stamped")?;

    let second = service.mark_read(seeded.id(), &actor(me)).await?;

    ensure!(
        second.read_at() == Some(first_read_at),
        "repeat call must keep the original timestamp"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn mark_read_rejects_foreign_notifications() -> Result<()> {
    let store = Arc::new(InMemoryTicketStore::new());
    let service = inbox_service(&store);
    let owner = UserId::new();
    let seeded = seed_internal(&store, owner, "theirs").await?;

    let result = service.mark_read(seeded.id(), &actor(UserId::new())).await;

    ensure!(
        matches!(result, Err(InboxError::NotRecipient(_))),
        "expected NotRecipient, got {result:?}"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn mark_read_rejects_email_rows() -> Result<()> {
    let store = Arc::new(InMemoryTicketStore::new());
    let service = inbox_service(&store);
    let me = UserId::new();
    let seeded = seed_email(&store, me).await?;

    let result = service.mark_read(seeded.id(), &actor(me)).await;

    ensure!(
        matches!(result, Err(InboxError::NotReadTracked { .. })),
        "expected NotReadTracked, got {result:?}"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn mark_read_reports_unknown_ids() -> Result<()> {
    let store = Arc::new(InMemoryTicketStore::new());
    let service = inbox_service(&store);
    let me = UserId::new();
    let ghost = Notification::internal(draft_for(me, "never stored"), Utc::now());

    let result = service.mark_read(ghost.id(), &actor(me)).await;

    ensure!(
        matches!(result, Err(InboxError::NotFound(_))),
        "expected NotFound, got {result:?}"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn summary_counts_unread_and_limits_recent() -> Result<()> {
    let store = Arc::new(InMemoryTicketStore::new());
    let service = inbox_service(&store);
    let me = UserId::new();
    let first = seed_internal(&store, me, "one").await?;
    seed_internal(&store, me, "two").await?;
    seed_internal(&store, me, "three").await?;
    seed_email(&store, me).await?;

    let before = service.summary(&actor(me), 2).await?;
    ensure!(before.unread == 3, "only internal rows count as unread");
    ensure!(before.recent.len() == 2, "recent respects the limit");

    service.mark_read(first.id(), &actor(me)).await?;

    let after = service.summary(&actor(me), 2).await?;
    ensure!(after.unread == 2, "unread decrements after mark_read");
    Ok(())
}
