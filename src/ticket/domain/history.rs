//! Immutable state-transition history entries.

use super::{TicketId, TicketState, TransitionId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One committed state change of a ticket.
///
/// Exactly one entry is recorded per committed transition, including the
/// synthetic first entry written at creation. Replaying the entries of a
/// ticket ordered by `recorded_at` reconstructs its current state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateTransition {
    /// Entry identifier.
    pub id: TransitionId,
    /// Owning ticket.
    pub ticket_id: TicketId,
    /// State before the change; `None` only for the synthetic first
    /// entry.
    pub previous: Option<TicketState>,
    /// State after the change.
    pub next: TicketState,
    /// User who caused the change.
    pub actor: UserId,
    /// Free-text comment attached to the change, if any.
    pub comment: Option<String>,
    /// Commit-time timestamp.
    pub recorded_at: DateTime<Utc>,
}

impl StateTransition {
    /// Creates the synthetic first entry written when a ticket is opened.
    #[must_use]
    pub fn initial(
        ticket_id: TicketId,
        state: TicketState,
        actor: UserId,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: TransitionId::new(),
            ticket_id,
            previous: None,
            next: state,
            actor,
            comment: None,
            recorded_at,
        }
    }

    /// Creates an entry for a committed transition.
    #[must_use]
    pub fn record(
        ticket_id: TicketId,
        previous: TicketState,
        next: TicketState,
        actor: UserId,
        comment: Option<String>,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: TransitionId::new(),
            ticket_id,
            previous: Some(previous),
            next,
            actor,
            comment,
            recorded_at,
        }
    }
}
