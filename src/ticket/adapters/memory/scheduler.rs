//! Delivery scheduler stub recording scheduled tickets for inspection.

use crate::ticket::domain::TicketId;
use crate::ticket::ports::DeliveryScheduler;
use std::sync::{Mutex, MutexGuard};

/// Scheduler that records scheduling requests instead of spawning
/// delivery runs.
#[derive(Debug, Default)]
pub struct RecordingScheduler {
    scheduled: Mutex<Vec<TicketId>>,
}

impl RecordingScheduler {
    /// Creates an empty recording scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the tickets scheduled so far, in scheduling order.
    #[must_use]
    pub fn scheduled(&self) -> Vec<TicketId> {
        self.locked().clone()
    }

    fn locked(&self) -> MutexGuard<'_, Vec<TicketId>> {
        match self.scheduled.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl DeliveryScheduler for RecordingScheduler {
    fn schedule_email_delivery(&self, ticket_id: TicketId) {
        self.locked().push(ticket_id);
    }
}
