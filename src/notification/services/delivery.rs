//! Detached email delivery worker.
//!
//! Delivery runs after the owning ticket transaction has committed and is
//! decoupled from the triggering request: the request responds to its
//! caller while delivery proceeds (or fails) in the background. Each
//! notification's delivery state is updated independently, so one
//! recipient's failure never blocks the others.

use crate::notification::domain::Notification;
use crate::notification::ports::{DeliveryOutcome, NotificationStore};
use crate::notification::services::templates::{
    TicketMessageContext, render_email_html, render_email_text,
};
use crate::ticket::domain::{Branch, Ticket, TicketId, User};
use crate::ticket::ports::{
    DeliveryScheduler, MailTransport, OutboundEmail, StoreError, TicketStore,
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;

/// Errors aborting a whole delivery run (per-notification failures are
/// recorded on the rows instead).
#[derive(Debug, Clone, Error)]
pub enum DeliveryError {
    /// Store failure while loading context or pending rows.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Outcome counts of one delivery run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Notifications marked `sent`.
    pub sent: usize,
    /// Notifications marked `error`.
    pub failed: usize,
}

/// Background worker sending a ticket's pending email notifications.
pub struct EmailDeliveryWorker<S, C>
where
    S: TicketStore + NotificationStore,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    mail: Arc<dyn MailTransport>,
    clock: Arc<C>,
}

// Derived Clone would demand `S: Clone` and `C: Clone`; only the handles
// are cloned.
impl<S, C> Clone for EmailDeliveryWorker<S, C>
where
    S: TicketStore + NotificationStore,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            mail: Arc::clone(&self.mail),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<S, C> EmailDeliveryWorker<S, C>
where
    S: TicketStore + NotificationStore,
    C: Clock + Send + Sync,
{
    /// Creates a new delivery worker.
    #[must_use]
    pub const fn new(store: Arc<S>, mail: Arc<dyn MailTransport>, clock: Arc<C>) -> Self {
        Self { store, mail, clock }
    }

    /// Delivers all pending email notifications of one ticket.
    ///
    /// Per notification: a recipient without a usable email address is
    /// marked `error` (terminal, never retried); otherwise the email is
    /// rendered and sent, marking `sent` on success and `error` on any
    /// transport failure before moving on to the next notification.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::Store`] when loading the delivery
    /// context or updating a row fails; rows not yet processed stay
    /// `pending`.
    pub async fn deliver_pending_for_ticket(
        &self,
        ticket_id: TicketId,
    ) -> Result<DeliveryReport, DeliveryError> {
        let Some(ticket) = self.store.find_ticket(ticket_id).await? else {
            tracing::debug!(%ticket_id, "ticket gone before delivery; nothing to do");
            return Ok(DeliveryReport::default());
        };
        let Some(operator) = self.store.find_user(ticket.created_by()).await? else {
            tracing::warn!(%ticket_id, "ticket creator missing; leaving notifications pending");
            return Ok(DeliveryReport::default());
        };
        let Some(branch) = self.store.find_branch(ticket.branch_id()).await? else {
            tracing::warn!(%ticket_id, "ticket branch missing; leaving notifications pending");
            return Ok(DeliveryReport::default());
        };

        let pending = self.store.pending_email_for_ticket(ticket_id).await?;
        let mut report = DeliveryReport::default();
        for notification in pending {
            let now = self.clock.utc();
            match self
                .deliver_one(&notification, &ticket, &operator, &branch, now)
                .await?
            {
                DeliveryOutcome::Sent => report.sent += 1,
                DeliveryOutcome::Failed => report.failed += 1,
            }
        }
        Ok(report)
    }

    async fn deliver_one(
        &self,
        notification: &Notification,
        ticket: &Ticket,
        operator: &User,
        branch: &Branch,
        now: DateTime<Utc>,
    ) -> Result<DeliveryOutcome, DeliveryError> {
        let recipient = self.store.find_user(notification.recipient()).await?;
        let Some(address) = recipient.as_ref().and_then(User::usable_email) else {
            tracing::warn!(
                notification = %notification.id(),
                recipient = %notification.recipient(),
                "recipient has no usable email; marking notification failed"
            );
            return self
                .finish(notification, DeliveryOutcome::Failed, now)
                .await;
        };

        let email = match render_outbound(notification, ticket, operator, branch, address) {
            Ok(email) => email,
            Err(error) => {
                tracing::warn!(
                    notification = %notification.id(),
                    %error,
                    "email rendering failed; marking notification failed"
                );
                return self
                    .finish(notification, DeliveryOutcome::Failed, now)
                    .await;
            }
        };

        match self.mail.send(&email).await {
            Ok(()) => self.finish(notification, DeliveryOutcome::Sent, now).await,
            Err(error) => {
                tracing::warn!(
                    notification = %notification.id(),
                    to = %email.to,
                    %error,
                    "email delivery failed; continuing with remaining notifications"
                );
                self.finish(notification, DeliveryOutcome::Failed, now)
                    .await
            }
        }
    }

    async fn finish(
        &self,
        notification: &Notification,
        outcome: DeliveryOutcome,
        now: DateTime<Utc>,
    ) -> Result<DeliveryOutcome, DeliveryError> {
        self.store
            .record_delivery_outcome(notification.id(), outcome, now)
            .await?;
        Ok(outcome)
    }
}

fn render_outbound(
    notification: &Notification,
    ticket: &Ticket,
    operator: &User,
    branch: &Branch,
    address: &str,
) -> Result<OutboundEmail, crate::notification::services::templates::TemplateError> {
    let context = TicketMessageContext::for_ticket(
        ticket,
        &operator.display_name,
        branch,
        notification.channel(),
    );
    Ok(OutboundEmail {
        to: address.to_owned(),
        subject: notification.subject().to_owned(),
        html_body: render_email_html(&context)?,
        text_body: render_email_text(&context)?,
    })
}

/// Fire-and-forget scheduler spawning the delivery worker on the tokio
/// runtime.
pub struct TokioDeliveryScheduler<S, C>
where
    S: TicketStore + NotificationStore + 'static,
    C: Clock + Send + Sync + 'static,
{
    worker: Arc<EmailDeliveryWorker<S, C>>,
}

impl<S, C> Clone for TokioDeliveryScheduler<S, C>
where
    S: TicketStore + NotificationStore + 'static,
    C: Clock + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            worker: Arc::clone(&self.worker),
        }
    }
}

impl<S, C> TokioDeliveryScheduler<S, C>
where
    S: TicketStore + NotificationStore + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Creates a scheduler around a delivery worker.
    #[must_use]
    pub const fn new(worker: Arc<EmailDeliveryWorker<S, C>>) -> Self {
        Self { worker }
    }
}

impl<S, C> DeliveryScheduler for TokioDeliveryScheduler<S, C>
where
    S: TicketStore + NotificationStore + 'static,
    C: Clock + Send + Sync + 'static,
{
    fn schedule_email_delivery(&self, ticket_id: TicketId) {
        let worker = Arc::clone(&self.worker);
        let _task = tokio::spawn(async move {
            match worker.deliver_pending_for_ticket(ticket_id).await {
                Ok(report) => tracing::debug!(
                    %ticket_id,
                    sent = report.sent,
                    failed = report.failed,
                    "email delivery run finished"
                ),
                Err(error) => {
                    tracing::warn!(%ticket_id, %error, "email delivery run aborted");
                }
            }
        });
    }
}
