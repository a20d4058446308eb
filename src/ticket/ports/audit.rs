//! Append-only audit log sink.

use crate::ticket::domain::{TicketId, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Action recorded by an audit entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// A ticket was created.
    TicketCreated,
    /// An attachment was added to a ticket.
    AttachmentAdded,
    /// A ticket changed state.
    TicketStateChanged,
    /// A ticket was hard-deleted.
    TicketDeleted,
    /// An attachment was deleted.
    AttachmentDeleted,
}

impl AuditAction {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TicketCreated => "ticket.created",
            Self::AttachmentAdded => "ticket.attachment_added",
            Self::TicketStateChanged => "ticket.state_changed",
            Self::TicketDeleted => "ticket.deleted",
            Self::AttachmentDeleted => "ticket.attachment_deleted",
        }
    }
}

/// One "who did what to which ticket when" record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Acting user.
    pub actor: UserId,
    /// Recorded action.
    pub action: AuditAction,
    /// Ticket the action applied to.
    pub ticket_id: TicketId,
    /// Action-specific detail payload.
    pub detail: Value,
    /// Commit-time timestamp of the audited operation.
    pub recorded_at: DateTime<Utc>,
}

impl AuditEntry {
    /// Creates an audit entry.
    #[must_use]
    pub const fn new(
        actor: UserId,
        action: AuditAction,
        ticket_id: TicketId,
        detail: Value,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            actor,
            action,
            ticket_id,
            detail,
            recorded_at,
        }
    }
}

/// Audit recording contract.
///
/// Recording is best-effort observability, never a correctness gate:
/// implementations swallow their own failures and report them only via
/// logging, so callers cannot fail on a lost audit entry.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Records one audit entry.
    async fn record(&self, entry: AuditEntry);
}
