//! Unit tests for the detached email delivery worker.

use crate::notification::domain::{DeliveryState, Notification, NotificationDraft};
use crate::notification::ports::NotificationStore;
use crate::notification::services::EmailDeliveryWorker;
use crate::ticket::adapters::memory::InMemoryTicketStore;
use crate::ticket::domain::{
    Branch, BranchId, Role, Subject, Ticket, TicketDraft, TicketState, User, UserId,
};
use crate::ticket::ports::mail::MockMailTransport;
use crate::ticket::ports::{MailTransportError, StoreError, TicketStore};
use chrono::Utc;
use eyre::{OptionExt, Result, ensure};
use mockable::DefaultClock;
use rstest::rstest;
use std::sync::Arc;

fn user(name: &str, email: Option<&str>) -> User {
    User {
        id: UserId::new(),
        display_name: name.to_owned(),
        email: email.map(str::to_owned),
        role: Role::Supervisor,
        branch_id: None,
        active: true,
    }
}

fn branch() -> Branch {
    Branch {
        id: BranchId::new(),
        name: "Centro".to_owned(),
        city: "Montevideo".to_owned(),
        requires_attachments: false,
    }
}

async fn seed_ticket(
    store: &InMemoryTicketStore,
    branch: &Branch,
    operator: &User,
) -> Result<Ticket> {
    let draft = TicketDraft {
        occurred_on: Utc::now().date_naive(),
        occurred_at: None,
        branch_id: branch.id,
        created_by: operator.id,
        subject: Subject::new("Freezer temperature alarm")?,
        description: None,
    };
    let ticket = Ticket::open(draft, TicketState::Pending, Utc::now());
    let row = ticket.clone();
    store
        .transaction(move |tx| {
            tx.insert_ticket(&row)?;
            Ok::<_, StoreError>(())
        })
        .await
        .map_err(|err| eyre::eyre!(err))?;
    Ok(ticket)
}

async fn seed_pending_email(
    store: &InMemoryTicketStore,
    ticket: &Ticket,
    recipient: UserId,
) -> Result<Notification> {
    let notification = Notification::email(
        NotificationDraft {
            ticket_id: Some(ticket.id()),
            origin: Some(ticket.created_by()),
            recipient,
            subject: "Ticket: freezer alarm".to_owned(),
            body: "body".to_owned(),
        },
        Utc::now(),
    );
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

fn worker(
    store: &Arc<InMemoryTicketStore>,
    mail: MockMailTransport,
) -> EmailDeliveryWorker<InMemoryTicketStore, DefaultClock> {
    EmailDeliveryWorker::new(Arc::clone(store), Arc::new(mail), Arc::new(DefaultClock))
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn one_failed_recipient_does_not_block_the_others() -> Result<()> {
    let store = Arc::new(InMemoryTicketStore::new());
    let home = branch();
    store.seed_branch(home.clone());
    let operator = user("Olga", Some("olga@x.test"));
    let alice = user("Alice", Some("alice@x.test"));
    let bob = user("Bob", Some("bob@x.test"));
    let carol = user("Carol", Some("carol@x.test"));
    for seeded in [&operator, &alice, &bob, &carol] {
        store.seed_user(seeded.clone());
    }
    let ticket = seed_ticket(&store, &home, &operator).await?;
    let for_alice = seed_pending_email(&store, &ticket, alice.id).await?;
    let for_bob = seed_pending_email(&store, &ticket, bob.id).await?;
    let for_carol = seed_pending_email(&store, &ticket, carol.id).await?;

    let mut mail = MockMailTransport::new();
    mail.expect_send().returning(|email| {
        if email.to == "bob@x.test" {
            Err(MailTransportError::transport(std::io::Error::other(
                "relay refused",
            )))
        } else {
            Ok(())
        }
    });

    let report = worker(&store, mail)
        .deliver_pending_for_ticket(ticket.id())
        .await?;

    ensure!(report.sent == 2, "sent count mismatch: {report:?}");
    ensure!(report.failed == 1, "failed count mismatch: {report:?}");

    for (id, expected) in [
        (for_alice.id(), DeliveryState::Sent),
        (for_bob.id(), DeliveryState::Error),
        (for_carol.id(), DeliveryState::Sent),
    ] {
        let row = store
            .find_notification(id)
            .await?
            .ok_or_eyre("notification row")?;
        ensure!(
            row.delivery() == expected,
            "row {id} delivery mismatch: {:?}",
            row.delivery()
        );
        ensure!(row.sent_at().is_some(), "outcome must stamp sent_at");
    }
    ensure!(
        store.pending_email_for_ticket(ticket.id()).await?.is_empty(),
        "no rows stay pending after the run"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn recipient_without_email_is_marked_failed_without_a_send() -> Result<()> {
    let store = Arc::new(InMemoryTicketStore::new());
    let home = branch();
    store.seed_branch(home.clone());
    let operator = user("Olga", Some("olga@x.test"));
    let silent = user("Sam", None);
    store.seed_user(operator.clone());
    store.seed_user(silent.clone());
    let ticket = seed_ticket(&store, &home, &operator).await?;
    let row = seed_pending_email(&store, &ticket, silent.id).await?;

    // No expectation set: any transport call fails the test.
    let mail = MockMailTransport::new();

    let report = worker(&store, mail)
        .deliver_pending_for_ticket(ticket.id())
        .await?;

    ensure!(report.failed == 1 && report.sent == 0, "report mismatch: {report:?}");
    let stored = store
        .find_notification(row.id())
        .await?
        .ok_or_eyre("notification row")?;
    ensure!(stored.delivery() == DeliveryState::Error, "row must be failed");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn missing_ticket_yields_an_empty_report() -> Result<()> {
    let store = Arc::new(InMemoryTicketStore::new());
    let mail = MockMailTransport::new();

    let report = worker(&store, mail)
        .deliver_pending_for_ticket(crate::ticket::domain::TicketId::new())
        .await?;

    ensure!(report.sent == 0 && report.failed == 0, "report mismatch: {report:?}");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn already_delivered_rows_are_not_retried() -> Result<()> {
    let store = Arc::new(InMemoryTicketStore::new());
    let home = branch();
    store.seed_branch(home.clone());
    let operator = user("Olga", Some("olga@x.test"));
    let alice = user("Alice", Some("alice@x.test"));
    store.seed_user(operator.clone());
    store.seed_user(alice.clone());
    let ticket = seed_ticket(&store, &home, &operator).await?;
    seed_pending_email(&store, &ticket, alice.id).await?;

    let mut mail = MockMailTransport::new();
    mail.expect_send().times(1).returning(|_| Ok(()));
    let runner = worker(&store, mail);

    runner.deliver_pending_for_ticket(ticket.id()).await?;
    let second = runner.deliver_pending_for_ticket(ticket.id()).await?;

    ensure!(
        second.sent == 0 && second.failed == 0,
        "second run must find nothing pending: {second:?}"
    );
    Ok(())
}
