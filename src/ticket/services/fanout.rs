//! Notification fan-out for newly visible tickets.
//!
//! Fan-out runs inside the same store transaction as the ticket mutation
//! that made the ticket visible (creation in `pending`, or the
//! attachment gate firing), so notification rows commit or roll back
//! with the ticket itself.

use super::recipients::resolve_supervision_recipients;
use crate::notification::domain::{Channel, Notification, NotificationDraft};
use crate::notification::services::{
    TemplateError, TicketMessageContext, render_created_body, render_created_subject,
};
use crate::ticket::domain::{Branch, Ticket, User, UserId};
use crate::ticket::ports::{StoreError, StoreTx};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use thiserror::Error;

/// Errors aborting a fan-out run.
///
/// Callers swallow this at the fan-out boundary: losing notifications is
/// preferred over losing the ticket mutation.
#[derive(Debug, Clone, Error)]
pub enum FanOutError {
    /// Store failure while resolving recipients or inserting rows.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Message rendering failure.
    #[error(transparent)]
    Template(#[from] TemplateError),
}

/// Creates the notification rows for a newly visible ticket.
///
/// Resolves the creating operator and the supervision recipients of the
/// ticket's branch, de-duplicates by user identity, and inserts one
/// internal (`sent`) and one email (`pending`) notification per unique
/// recipient with a usable email address. Recipients without a usable
/// email are skipped on both channels.
///
/// Returns the number of notification rows created.
///
/// # Errors
///
/// Returns [`FanOutError`] when recipient resolution, rendering or an
/// insert fails; the caller's transaction decides whether already
/// inserted rows survive.
pub fn fan_out_ticket_created(
    tx: &mut dyn StoreTx,
    ticket: &Ticket,
    branch: &Branch,
    now: DateTime<Utc>,
) -> Result<usize, FanOutError> {
    let operator = tx.find_user(ticket.created_by())?;
    let operator_name = operator
        .as_ref()
        .map(|user| user.display_name.clone())
        .unwrap_or_default();

    let mut seen: HashSet<UserId> = HashSet::new();
    let mut recipients: Vec<User> = Vec::new();
    if let Some(user) = operator {
        seen.insert(user.id);
        recipients.push(user);
    }
    for user in resolve_supervision_recipients(tx, branch.id)? {
        if seen.insert(user.id) {
            recipients.push(user);
        }
    }

    let mut created = 0;
    for recipient in &recipients {
        if recipient.usable_email().is_none() {
            // Known policy quirk: filtering by email here drops the
            // internal notification for email-less users as well.
            continue;
        }

        let internal_context =
            TicketMessageContext::for_ticket(ticket, &operator_name, branch, Channel::Internal);
        let internal = Notification::internal(
            draft_for(ticket, recipient.id, &internal_context)?,
            now,
        );
        tx.insert_notification(&internal)?;

        let email_context =
            TicketMessageContext::for_ticket(ticket, &operator_name, branch, Channel::Email);
        let email = Notification::email(draft_for(ticket, recipient.id, &email_context)?, now);
        tx.insert_notification(&email)?;

        created += 2;
    }
    Ok(created)
}

fn draft_for(
    ticket: &Ticket,
    recipient: UserId,
    context: &TicketMessageContext,
) -> Result<NotificationDraft, TemplateError> {
    Ok(NotificationDraft {
        ticket_id: Some(ticket.id()),
        origin: Some(ticket.created_by()),
        recipient,
        subject: render_created_subject(context)?,
        body: render_created_body(context)?,
    })
}
