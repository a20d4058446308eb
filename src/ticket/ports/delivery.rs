//! Post-commit delivery scheduling port.

use crate::ticket::domain::TicketId;

/// Schedules background email delivery after a ticket transaction has
/// committed.
///
/// Scheduling is fire-and-forget: the triggering request completes
/// without waiting for delivery, and a delivery failure never surfaces
/// as the triggering request's failure.
pub trait DeliveryScheduler: Send + Sync {
    /// Schedules delivery of the ticket's pending email notifications.
    fn schedule_email_delivery(&self, ticket_id: TicketId);
}
