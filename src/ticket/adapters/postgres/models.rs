//! Diesel row models and domain conversions for ticket persistence.

use super::schema::{
    audit_log, branches, notifications, ticket_attachments, ticket_transitions, tickets, users,
};
use crate::notification::domain::{
    Channel, DeliveryState, Notification, PersistedNotificationData,
};
use crate::ticket::domain::{
    Attachment, AttachmentId, AttachmentKind, Branch, BranchId, NotificationId,
    PersistedTicketData, Role, StateTransition, Subject, Ticket, TicketId, TicketState,
    TransitionId, User, UserId,
};
use crate::ticket::ports::{StoreError, StoreResult};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

/// Query result row for user records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserRow {
    /// Internal user identifier.
    pub id: uuid::Uuid,
    /// Display name.
    pub display_name: String,
    /// Optional email address.
    pub email: Option<String>,
    /// Role as stored.
    pub role: String,
    /// Optional branch binding.
    pub branch_id: Option<uuid::Uuid>,
    /// Whether the account is active.
    pub active: bool,
}

/// Query result row for branch records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = branches)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct BranchRow {
    /// Internal branch identifier.
    pub id: uuid::Uuid,
    /// Branch name.
    pub name: String,
    /// City the branch operates in.
    pub city: String,
    /// Whether attachment gating applies.
    pub requires_attachments: bool,
}

/// Query result row for ticket records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = tickets)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TicketRow {
    /// Internal ticket identifier.
    pub id: uuid::Uuid,
    /// Business date of the reported event.
    pub occurred_on: NaiveDate,
    /// Optional business time.
    pub occurred_at: Option<NaiveTime>,
    /// Owning branch.
    pub branch_id: uuid::Uuid,
    /// Creating operator.
    pub created_by: uuid::Uuid,
    /// Lifecycle state as stored.
    pub state: String,
    /// Subject line.
    pub subject: String,
    /// Optional description.
    pub description: Option<String>,
    /// Optional remarks log.
    pub remarks: Option<String>,
    /// Closure timestamp, if closed.
    pub closed_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert model for ticket records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = tickets)]
pub struct NewTicketRow {
    /// Internal ticket identifier.
    pub id: uuid::Uuid,
    /// Business date of the reported event.
    pub occurred_on: NaiveDate,
    /// Optional business time.
    pub occurred_at: Option<NaiveTime>,
    /// Owning branch.
    pub branch_id: uuid::Uuid,
    /// Creating operator.
    pub created_by: uuid::Uuid,
    /// Lifecycle state as stored.
    pub state: String,
    /// Subject line.
    pub subject: String,
    /// Optional description.
    pub description: Option<String>,
    /// Optional remarks log.
    pub remarks: Option<String>,
    /// Closure timestamp, if closed.
    pub closed_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Query result row for state-transition history entries.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = ticket_transitions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TransitionRow {
    /// Internal entry identifier.
    pub id: uuid::Uuid,
    /// Owning ticket.
    pub ticket_id: uuid::Uuid,
    /// State before the change, if any.
    pub previous_state: Option<String>,
    /// State after the change.
    pub next_state: String,
    /// User who caused the change.
    pub actor: uuid::Uuid,
    /// Optional comment.
    pub comment: Option<String>,
    /// Commit-time timestamp.
    pub recorded_at: DateTime<Utc>,
}

/// Insert model for state-transition history entries.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = ticket_transitions)]
pub struct NewTransitionRow {
    /// Internal entry identifier.
    pub id: uuid::Uuid,
    /// Owning ticket.
    pub ticket_id: uuid::Uuid,
    /// State before the change, if any.
    pub previous_state: Option<String>,
    /// State after the change.
    pub next_state: String,
    /// User who caused the change.
    pub actor: uuid::Uuid,
    /// Optional comment.
    pub comment: Option<String>,
    /// Commit-time timestamp.
    pub recorded_at: DateTime<Utc>,
}

/// Query result row for attachment records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = ticket_attachments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AttachmentRow {
    /// Internal attachment identifier.
    pub id: uuid::Uuid,
    /// Owning ticket.
    pub ticket_id: uuid::Uuid,
    /// Classification as stored.
    pub kind: String,
    /// Filename as originally submitted.
    pub original_name: String,
    /// Stable blob locator.
    pub locator: String,
    /// MIME content type.
    pub content_type: String,
    /// Blob size in bytes.
    pub byte_size: i64,
    /// Whether this is the primary attachment.
    pub is_primary: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Insert model for attachment records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = ticket_attachments)]
pub struct NewAttachmentRow {
    /// Internal attachment identifier.
    pub id: uuid::Uuid,
    /// Owning ticket.
    pub ticket_id: uuid::Uuid,
    /// Classification as stored.
    pub kind: String,
    /// Filename as originally submitted.
    pub original_name: String,
    /// Stable blob locator.
    pub locator: String,
    /// MIME content type.
    pub content_type: String,
    /// Blob size in bytes.
    pub byte_size: i64,
    /// Whether this is the primary attachment.
    pub is_primary: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Query result row for notification records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = notifications)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NotificationRow {
    /// Internal notification identifier.
    pub id: uuid::Uuid,
    /// Optional ticket reference.
    pub ticket_id: Option<uuid::Uuid>,
    /// Optional origin user.
    pub origin: Option<uuid::Uuid>,
    /// Destination user.
    pub recipient: uuid::Uuid,
    /// Channel as stored.
    pub channel: String,
    /// Rendered subject.
    pub subject: String,
    /// Rendered body.
    pub body: String,
    /// Delivery state as stored.
    pub delivery: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Delivery-outcome timestamp, if any.
    pub sent_at: Option<DateTime<Utc>>,
    /// Read timestamp, if any.
    pub read_at: Option<DateTime<Utc>>,
}

/// Insert model for notification records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = notifications)]
pub struct NewNotificationRow {
    /// Internal notification identifier.
    pub id: uuid::Uuid,
    /// Optional ticket reference.
    pub ticket_id: Option<uuid::Uuid>,
    /// Optional origin user.
    pub origin: Option<uuid::Uuid>,
    /// Destination user.
    pub recipient: uuid::Uuid,
    /// Channel as stored.
    pub channel: String,
    /// Rendered subject.
    pub subject: String,
    /// Rendered body.
    pub body: String,
    /// Delivery state as stored.
    pub delivery: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Delivery-outcome timestamp, if any.
    pub sent_at: Option<DateTime<Utc>>,
    /// Read timestamp, if any.
    pub read_at: Option<DateTime<Utc>>,
}

/// Insert model for audit entries; the identifier is assigned by the
/// database.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = audit_log)]
pub struct NewAuditRow {
    /// Acting user.
    pub actor: uuid::Uuid,
    /// Recorded action.
    pub action: String,
    /// Ticket the action applied to.
    pub ticket_id: uuid::Uuid,
    /// Detail payload.
    pub detail: Value,
    /// Commit-time timestamp.
    pub recorded_at: DateTime<Utc>,
}

fn corrupt(err: impl std::fmt::Display) -> StoreError {
    StoreError::Corrupt(err.to_string())
}

/// Maps a user row into the domain.
pub fn row_to_user(row: UserRow) -> StoreResult<User> {
    Ok(User {
        id: UserId::from_uuid(row.id),
        display_name: row.display_name,
        email: row.email,
        role: Role::try_from(row.role.as_str()).map_err(corrupt)?,
        branch_id: row.branch_id.map(BranchId::from_uuid),
        active: row.active,
    })
}

/// Maps a branch row into the domain.
pub fn row_to_branch(row: BranchRow) -> Branch {
    Branch {
        id: BranchId::from_uuid(row.id),
        name: row.name,
        city: row.city,
        requires_attachments: row.requires_attachments,
    }
}

/// Maps a ticket row into the domain.
pub fn row_to_ticket(row: TicketRow) -> StoreResult<Ticket> {
    let state = TicketState::try_from(row.state.as_str()).map_err(corrupt)?;
    let subject = Subject::new(row.subject).map_err(corrupt)?;
    Ok(Ticket::from_persisted(PersistedTicketData {
        id: TicketId::from_uuid(row.id),
        occurred_on: row.occurred_on,
        occurred_at: row.occurred_at,
        branch_id: BranchId::from_uuid(row.branch_id),
        created_by: UserId::from_uuid(row.created_by),
        state,
        subject,
        description: row.description,
        remarks: row.remarks,
        closed_at: row.closed_at,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }))
}

/// Maps a ticket aggregate to its insert model.
pub fn ticket_to_new_row(ticket: &Ticket) -> NewTicketRow {
    NewTicketRow {
        id: ticket.id().into_inner(),
        occurred_on: ticket.occurred_on(),
        occurred_at: ticket.occurred_at(),
        branch_id: ticket.branch_id().into_inner(),
        created_by: ticket.created_by().into_inner(),
        state: ticket.state().as_str().to_owned(),
        subject: ticket.subject().as_str().to_owned(),
        description: ticket.description().map(str::to_owned),
        remarks: ticket.remarks().map(str::to_owned),
        closed_at: ticket.closed_at(),
        created_at: ticket.created_at(),
        updated_at: ticket.updated_at(),
    }
}

/// Maps a transition row into the domain.
pub fn row_to_transition(row: TransitionRow) -> StoreResult<StateTransition> {
    let previous = row
        .previous_state
        .as_deref()
        .map(TicketState::try_from)
        .transpose()
        .map_err(corrupt)?;
    let next = TicketState::try_from(row.next_state.as_str()).map_err(corrupt)?;
    Ok(StateTransition {
        id: TransitionId::from_uuid(row.id),
        ticket_id: TicketId::from_uuid(row.ticket_id),
        previous,
        next,
        actor: UserId::from_uuid(row.actor),
        comment: row.comment,
        recorded_at: row.recorded_at,
    })
}

/// Maps a history entry to its insert model.
pub fn transition_to_new_row(entry: &StateTransition) -> NewTransitionRow {
    NewTransitionRow {
        id: entry.id.into_inner(),
        ticket_id: entry.ticket_id.into_inner(),
        previous_state: entry.previous.map(|state| state.as_str().to_owned()),
        next_state: entry.next.as_str().to_owned(),
        actor: entry.actor.into_inner(),
        comment: entry.comment.clone(),
        recorded_at: entry.recorded_at,
    }
}

/// Maps an attachment row into the domain.
pub fn row_to_attachment(row: AttachmentRow) -> StoreResult<Attachment> {
    let kind = AttachmentKind::try_from(row.kind.as_str()).map_err(corrupt)?;
    let byte_size = u64::try_from(row.byte_size).map_err(corrupt)?;
    Ok(Attachment {
        id: AttachmentId::from_uuid(row.id),
        ticket_id: TicketId::from_uuid(row.ticket_id),
        kind,
        original_name: row.original_name,
        locator: row.locator,
        content_type: row.content_type,
        byte_size,
        is_primary: row.is_primary,
        created_at: row.created_at,
    })
}

/// Maps an attachment to its insert model.
pub fn attachment_to_new_row(attachment: &Attachment) -> StoreResult<NewAttachmentRow> {
    let byte_size = i64::try_from(attachment.byte_size).map_err(corrupt)?;
    Ok(NewAttachmentRow {
        id: attachment.id.into_inner(),
        ticket_id: attachment.ticket_id.into_inner(),
        kind: attachment.kind.as_str().to_owned(),
        original_name: attachment.original_name.clone(),
        locator: attachment.locator.clone(),
        content_type: attachment.content_type.clone(),
        byte_size,
        is_primary: attachment.is_primary,
        created_at: attachment.created_at,
    })
}

/// Maps a notification row into the domain.
pub fn row_to_notification(row: NotificationRow) -> StoreResult<Notification> {
    let channel = Channel::try_from(row.channel.as_str()).map_err(corrupt)?;
    let delivery = DeliveryState::try_from(row.delivery.as_str()).map_err(corrupt)?;
    Ok(Notification::from_persisted(PersistedNotificationData {
        id: NotificationId::from_uuid(row.id),
        ticket_id: row.ticket_id.map(TicketId::from_uuid),
        origin: row.origin.map(UserId::from_uuid),
        recipient: UserId::from_uuid(row.recipient),
        channel,
        subject: row.subject,
        body: row.body,
        delivery,
        created_at: row.created_at,
        sent_at: row.sent_at,
        read_at: row.read_at,
    }))
}

/// Maps a notification to its insert model.
pub fn notification_to_new_row(notification: &Notification) -> NewNotificationRow {
    NewNotificationRow {
        id: notification.id().into_inner(),
        ticket_id: notification.ticket_id().map(TicketId::into_inner),
        origin: notification.origin().map(UserId::into_inner),
        recipient: notification.recipient().into_inner(),
        channel: notification.channel().as_str().to_owned(),
        subject: notification.subject().to_owned(),
        body: notification.body().to_owned(),
        delivery: notification.delivery().as_str().to_owned(),
        created_at: notification.created_at(),
        sent_at: notification.sent_at(),
        read_at: notification.read_at(),
    }
}
