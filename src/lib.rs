//! Mostrador: ticket lifecycle and notification fan-out core for an
//! internal helpdesk.
//!
//! Branch operators raise tickets, supervisors authorise or reject them,
//! and every committed mutation leaves an append-only history trail. The
//! crate owns the ticket state machine, the attachment-count activation
//! gate, the multi-recipient notification fan-out with tiered supervisor
//! fallback, and the detached, per-recipient email delivery tracking.
//!
//! # Architecture
//!
//! Mostrador follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (database, files,
//!   SMTP, in-memory test doubles)
//! - **Services**: Orchestration of the transactional protocols
//!
//! # Modules
//!
//! - [`ticket`]: Ticket lifecycle, attachment gating, audit integration
//!   and notification fan-out
//! - [`notification`]: Notification records, inbox queries and the
//!   detached email delivery worker

pub mod notification;
pub mod ticket;
