//! Ticket aggregate root and the fixed lifecycle state machine.

use super::{
    BranchId, EmptySubjectError, ParseTicketStateError, TicketId, TicketStateError, UserId,
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Separator used when appending supervisor comments to the remarks log.
const REMARKS_SEPARATOR: char = '\n';

/// Ticket lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketState {
    /// Legacy creation state; kept for rows predating attachment gating.
    Open,
    /// Awaiting supervisor review.
    Pending,
    /// Created without attachments; invisible to supervisors until the
    /// first attachment arrives.
    PendingAttachments,
    /// Authorised by a supervisor.
    Authorized,
    /// Rejected by a supervisor.
    Rejected,
    /// Terminally closed.
    Closed,
}

impl TicketState {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Pending => "pending",
            Self::PendingAttachments => "pending_attachments",
            Self::Authorized => "authorized",
            Self::Rejected => "rejected",
            Self::Closed => "closed",
        }
    }

    /// Returns `true` for the terminal state.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Returns `true` for states that accept attachment uploads.
    #[must_use]
    pub const fn is_editable(self) -> bool {
        matches!(self, Self::Open | Self::Pending | Self::PendingAttachments)
    }

    /// Returns `true` for states a ticket can only be created in, never
    /// transitioned back into.
    #[must_use]
    pub const fn is_creation_only(self) -> bool {
        matches!(self, Self::Open | Self::PendingAttachments)
    }

    /// Returns whether the state machine permits moving from `self` to
    /// `to`.
    ///
    /// `closed` is terminal, no-op transitions are rejected, and
    /// creation-only states cannot be re-entered. `pending` stays
    /// reachable: the attachment gate enters it and supervisors may send
    /// a ticket back for rework.
    #[must_use]
    pub const fn can_transition_to(self, to: Self) -> bool {
        if self.is_terminal() {
            return false;
        }
        if matches!(
            (self, to),
            (Self::Open, Self::Open)
                | (Self::Pending, Self::Pending)
                | (Self::PendingAttachments, Self::PendingAttachments)
                | (Self::Authorized, Self::Authorized)
                | (Self::Rejected, Self::Rejected)
                | (Self::Closed, Self::Closed)
        ) {
            return false;
        }
        !to.is_creation_only()
    }

    /// Returns `true` for states whose entry appends the supervisor
    /// comment to the remarks log.
    #[must_use]
    pub const fn records_remark(self) -> bool {
        matches!(self, Self::Authorized | Self::Rejected | Self::Closed)
    }
}

impl TryFrom<&str> for TicketState {
    type Error = ParseTicketStateError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "open" => Ok(Self::Open),
            "pending" => Ok(Self::Pending),
            "pending_attachments" => Ok(Self::PendingAttachments),
            "authorized" => Ok(Self::Authorized),
            "rejected" => Ok(Self::Rejected),
            "closed" => Ok(Self::Closed),
            _ => Err(ParseTicketStateError(value.to_owned())),
        }
    }
}

impl std::fmt::Display for TicketState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated, non-empty ticket subject.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Subject(String);

impl Subject {
    /// Creates a validated subject.
    ///
    /// # Errors
    ///
    /// Returns [`EmptySubjectError`] when the value is empty after
    /// trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, EmptySubjectError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(EmptySubjectError);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the subject as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Subject {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Display for Subject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Input for opening a new ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketDraft {
    /// Business date of the reported event.
    pub occurred_on: NaiveDate,
    /// Business time of the reported event, if given.
    pub occurred_at: Option<NaiveTime>,
    /// Branch the ticket belongs to.
    pub branch_id: BranchId,
    /// Operator raising the ticket.
    pub created_by: UserId,
    /// Validated subject line.
    pub subject: Subject,
    /// Free-text description, if given.
    pub description: Option<String>,
}

/// Parameter object for reconstructing a persisted ticket aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTicketData {
    /// Persisted ticket identifier.
    pub id: TicketId,
    /// Persisted business date.
    pub occurred_on: NaiveDate,
    /// Persisted business time, if any.
    pub occurred_at: Option<NaiveTime>,
    /// Persisted owning branch.
    pub branch_id: BranchId,
    /// Persisted creator.
    pub created_by: UserId,
    /// Persisted lifecycle state.
    pub state: TicketState,
    /// Persisted subject.
    pub subject: Subject,
    /// Persisted description, if any.
    pub description: Option<String>,
    /// Persisted remarks log, if any.
    pub remarks: Option<String>,
    /// Persisted closure timestamp, if any.
    pub closed_at: Option<DateTime<Utc>>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Ticket aggregate root.
///
/// Creator and branch are immutable after creation; the state is mutated
/// only through [`Ticket::activate`] and [`Ticket::change_state`], and
/// `closed_at` is non-null exactly when the state is
/// [`TicketState::Closed`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    id: TicketId,
    occurred_on: NaiveDate,
    occurred_at: Option<NaiveTime>,
    branch_id: BranchId,
    created_by: UserId,
    state: TicketState,
    subject: Subject,
    description: Option<String>,
    remarks: Option<String>,
    closed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Ticket {
    /// Opens a new ticket in the given initial state.
    #[must_use]
    pub fn open(draft: TicketDraft, initial_state: TicketState, now: DateTime<Utc>) -> Self {
        Self {
            id: TicketId::new(),
            occurred_on: draft.occurred_on,
            occurred_at: draft.occurred_at,
            branch_id: draft.branch_id,
            created_by: draft.created_by,
            state: initial_state,
            subject: draft.subject,
            description: draft.description,
            remarks: None,
            closed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Reconstructs a ticket from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTicketData) -> Self {
        Self {
            id: data.id,
            occurred_on: data.occurred_on,
            occurred_at: data.occurred_at,
            branch_id: data.branch_id,
            created_by: data.created_by,
            state: data.state,
            subject: data.subject,
            description: data.description,
            remarks: data.remarks,
            closed_at: data.closed_at,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the ticket identifier.
    #[must_use]
    pub const fn id(&self) -> TicketId {
        self.id
    }

    /// Returns the business date of the reported event.
    #[must_use]
    pub const fn occurred_on(&self) -> NaiveDate {
        self.occurred_on
    }

    /// Returns the business time of the reported event, if given.
    #[must_use]
    pub const fn occurred_at(&self) -> Option<NaiveTime> {
        self.occurred_at
    }

    /// Returns the owning branch.
    #[must_use]
    pub const fn branch_id(&self) -> BranchId {
        self.branch_id
    }

    /// Returns the creating operator.
    #[must_use]
    pub const fn created_by(&self) -> UserId {
        self.created_by
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> TicketState {
        self.state
    }

    /// Returns the subject line.
    #[must_use]
    pub const fn subject(&self) -> &Subject {
        &self.subject
    }

    /// Returns the free-text description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the append-only remarks log, if any.
    #[must_use]
    pub fn remarks(&self) -> Option<&str> {
        self.remarks.as_deref()
    }

    /// Returns the closure timestamp, if the ticket is closed.
    #[must_use]
    pub const fn closed_at(&self) -> Option<DateTime<Utc>> {
        self.closed_at
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest mutation timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Fires the attachment gate: moves the ticket from
    /// `pending_attachments` to `pending`.
    ///
    /// # Errors
    ///
    /// Returns [`TicketStateError::NotAwaitingAttachments`] when the
    /// ticket is in any other state.
    pub fn activate(&mut self, now: DateTime<Utc>) -> Result<(), TicketStateError> {
        if self.state != TicketState::PendingAttachments {
            return Err(TicketStateError::NotAwaitingAttachments {
                ticket: self.id,
                state: self.state,
            });
        }
        self.state = TicketState::Pending;
        self.touch(now);
        Ok(())
    }

    /// Applies a supervisor-driven state change.
    ///
    /// Stamps `closed_at` when entering `closed` and appends `comment` to
    /// the remarks log when entering `authorized`, `rejected` or
    /// `closed`. Returns the previous state.
    ///
    /// # Errors
    ///
    /// Returns [`TicketStateError`] when the state machine rejects the
    /// transition.
    pub fn change_state(
        &mut self,
        to: TicketState,
        comment: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<TicketState, TicketStateError> {
        if self.state.is_terminal() {
            return Err(TicketStateError::TicketClosed { ticket: self.id });
        }
        if to == self.state {
            return Err(TicketStateError::AlreadyInState {
                ticket: self.id,
                state: to,
            });
        }
        if to.is_creation_only() {
            return Err(TicketStateError::CreationOnlyTarget {
                ticket: self.id,
                to,
            });
        }

        let previous = self.state;
        self.state = to;
        if to == TicketState::Closed {
            self.closed_at = Some(now);
        }
        if to.records_remark()
            && let Some(trimmed) = comment.map(str::trim).filter(|text| !text.is_empty())
        {
            self.append_remark(trimmed);
        }
        self.touch(now);
        Ok(previous)
    }

    /// Appends one entry to the remarks log.
    fn append_remark(&mut self, comment: &str) {
        let remarks = self.remarks.get_or_insert_with(String::new);
        if !remarks.is_empty() {
            remarks.push(REMARKS_SEPARATOR);
        }
        remarks.push_str(comment);
    }

    /// Updates the `updated_at` timestamp.
    const fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}
