//! Error types for ticket domain validation and parsing.

use super::{TicketId, TicketState};
use thiserror::Error;

/// Error returned when a ticket subject is empty after trimming.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("ticket subject must not be empty")]
pub struct EmptySubjectError;

/// Errors raised by the ticket state machine.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TicketStateError {
    /// The ticket is in the terminal `closed` state.
    #[error("ticket {ticket} is closed and accepts no further transitions")]
    TicketClosed {
        /// Ticket whose transition was rejected.
        ticket: TicketId,
    },

    /// The requested state equals the current state.
    #[error("ticket {ticket} is already in state {state}")]
    AlreadyInState {
        /// Ticket whose transition was rejected.
        ticket: TicketId,
        /// The no-op target state.
        state: TicketState,
    },

    /// The requested state can only be entered at creation time.
    #[error("ticket {ticket} cannot re-enter creation-only state {to}")]
    CreationOnlyTarget {
        /// Ticket whose transition was rejected.
        ticket: TicketId,
        /// The rejected target state.
        to: TicketState,
    },

    /// The attachment gate fired while the ticket was not awaiting
    /// attachments.
    #[error("ticket {ticket} in state {state} is not awaiting attachments")]
    NotAwaitingAttachments {
        /// Ticket whose activation was rejected.
        ticket: TicketId,
        /// State the ticket was found in.
        state: TicketState,
    },

    /// Attachments cannot be added in the ticket's current state.
    #[error("ticket {ticket} does not accept attachments in state {state}")]
    NotEditable {
        /// Ticket whose upload was rejected.
        ticket: TicketId,
        /// State the ticket was found in.
        state: TicketState,
    },
}

/// Error returned while parsing ticket states from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown ticket state: {0}")]
pub struct ParseTicketStateError(pub String);

/// Error returned while parsing user roles from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown role: {0}")]
pub struct ParseRoleError(pub String);

/// Error returned while parsing attachment kinds from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown attachment kind: {0}")]
pub struct ParseAttachmentKindError(pub String);
