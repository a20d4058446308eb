//! In-memory audit sink recording entries for inspection in tests.

use crate::ticket::ports::{AuditEntry, AuditSink};
use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard};

/// Thread-safe in-memory audit log.
#[derive(Debug, Default)]
pub struct InMemoryAuditLog {
    entries: Mutex<Vec<AuditEntry>>,
}

impl InMemoryAuditLog {
    /// Creates an empty audit log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of the recorded entries, oldest first.
    #[must_use]
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.locked().clone()
    }

    fn locked(&self) -> MutexGuard<'_, Vec<AuditEntry>> {
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl AuditSink for InMemoryAuditLog {
    async fn record(&self, entry: AuditEntry) {
        self.locked().push(entry);
    }
}
