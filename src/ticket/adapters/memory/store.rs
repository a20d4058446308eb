//! In-memory transactional store for tests and local development.
//!
//! Transactions clone the whole state, run the closure against the
//! clone, and swap it back on success, so a failing closure genuinely
//! rolls back. The state mutex is held for the duration of a
//! transaction, which serialises concurrent transactions the way a row
//! lock would on a real database.

use crate::notification::domain::{Channel, DeliveryState, Notification};
use crate::notification::ports::{DeliveryOutcome, NotificationStore};
use crate::ticket::domain::{
    Attachment, AttachmentId, Branch, BranchId, NotificationId, Role, StateTransition, Ticket,
    TicketId, User, UserId,
};
use crate::ticket::ports::{StoreError, StoreResult, StoreTx, TicketStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    users: HashMap<UserId, User>,
    branches: HashMap<BranchId, Branch>,
    tickets: HashMap<TicketId, Ticket>,
    transitions: Vec<StateTransition>,
    attachments: HashMap<AttachmentId, Attachment>,
    notifications: HashMap<NotificationId, Notification>,
}

/// Thread-safe in-memory ticket and notification store.
#[derive(Debug, Default)]
pub struct InMemoryTicketStore {
    state: Mutex<MemoryState>,
}

impl InMemoryTicketStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a user record.
    pub fn seed_user(&self, user: User) {
        self.locked().users.insert(user.id, user);
    }

    /// Seeds a branch record.
    pub fn seed_branch(&self, branch: Branch) {
        self.locked().branches.insert(branch.id, branch);
    }

    fn locked(&self) -> MutexGuard<'_, MemoryState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

struct MemoryTx {
    state: MemoryState,
}

impl StoreTx for MemoryTx {
    fn find_user(&mut self, id: UserId) -> StoreResult<Option<User>> {
        Ok(self.state.users.get(&id).cloned())
    }

    fn find_branch(&mut self, id: BranchId) -> StoreResult<Option<Branch>> {
        Ok(self.state.branches.get(&id).cloned())
    }

    fn active_supervisors_for_branch(&mut self, branch_id: BranchId) -> StoreResult<Vec<User>> {
        Ok(filter_users(&self.state, |user| {
            user.role == Role::Supervisor && user.branch_id == Some(branch_id)
        }))
    }

    fn active_global_supervisors(&mut self) -> StoreResult<Vec<User>> {
        Ok(filter_users(&self.state, |user| {
            user.role == Role::Supervisor && user.branch_id.is_none()
        }))
    }

    fn active_admins(&mut self) -> StoreResult<Vec<User>> {
        Ok(filter_users(&self.state, |user| user.role == Role::Admin))
    }

    fn insert_ticket(&mut self, ticket: &Ticket) -> StoreResult<()> {
        self.state.tickets.insert(ticket.id(), ticket.clone());
        Ok(())
    }

    fn ticket_for_update(&mut self, id: TicketId) -> StoreResult<Option<Ticket>> {
        // The transaction already holds the store-wide mutex, which is
        // at least as strict as a per-row lock.
        Ok(self.state.tickets.get(&id).cloned())
    }

    fn update_ticket(&mut self, ticket: &Ticket) -> StoreResult<()> {
        if !self.state.tickets.contains_key(&ticket.id()) {
            return Err(StoreError::Corrupt(format!(
                "update of unknown ticket {}",
                ticket.id()
            )));
        }
        self.state.tickets.insert(ticket.id(), ticket.clone());
        Ok(())
    }

    fn delete_ticket(&mut self, id: TicketId) -> StoreResult<Vec<Attachment>> {
        self.state.tickets.remove(&id);
        self.state.transitions.retain(|entry| entry.ticket_id != id);
        self.state
            .notifications
            .retain(|_, notification| notification.ticket_id() != Some(id));
        let mut removed: Vec<Attachment> = Vec::new();
        self.state.attachments.retain(|_, attachment| {
            if attachment.ticket_id == id {
                removed.push(attachment.clone());
                false
            } else {
                true
            }
        });
        removed.sort_by_key(|attachment| attachment.created_at);
        Ok(removed)
    }

    fn insert_transition(&mut self, entry: &StateTransition) -> StoreResult<()> {
        self.state.transitions.push(entry.clone());
        Ok(())
    }

    fn insert_attachment(&mut self, attachment: &Attachment) -> StoreResult<()> {
        self.state
            .attachments
            .insert(attachment.id, attachment.clone());
        Ok(())
    }

    fn find_attachment(&mut self, id: AttachmentId) -> StoreResult<Option<Attachment>> {
        Ok(self.state.attachments.get(&id).cloned())
    }

    fn delete_attachment(&mut self, id: AttachmentId) -> StoreResult<()> {
        self.state.attachments.remove(&id);
        Ok(())
    }

    fn clear_primary_attachments(&mut self, ticket_id: TicketId) -> StoreResult<()> {
        for attachment in self.state.attachments.values_mut() {
            if attachment.ticket_id == ticket_id {
                attachment.is_primary = false;
            }
        }
        Ok(())
    }

    fn attachment_count(&mut self, ticket_id: TicketId) -> StoreResult<u64> {
        let count = self
            .state
            .attachments
            .values()
            .filter(|attachment| attachment.ticket_id == ticket_id)
            .count();
        Ok(count as u64)
    }

    fn insert_notification(&mut self, notification: &Notification) -> StoreResult<()> {
        self.state
            .notifications
            .insert(notification.id(), notification.clone());
        Ok(())
    }
}

fn filter_users(state: &MemoryState, predicate: impl Fn(&User) -> bool) -> Vec<User> {
    let mut users: Vec<User> = state
        .users
        .values()
        .filter(|user| user.active && predicate(user))
        .cloned()
        .collect();
    users.sort_by(|a, b| a.display_name.cmp(&b.display_name));
    users
}

#[async_trait]
impl TicketStore for InMemoryTicketStore {
    async fn transaction<T, E, F>(&self, work: F) -> Result<T, E>
    where
        T: Send + 'static,
        E: From<StoreError> + Send + 'static,
        F: FnOnce(&mut dyn StoreTx) -> Result<T, E> + Send + 'static,
    {
        let mut guard = self.locked();
        let mut tx = MemoryTx {
            state: guard.clone(),
        };
        let value = work(&mut tx)?;
        *guard = tx.state;
        Ok(value)
    }

    async fn find_ticket(&self, id: TicketId) -> StoreResult<Option<Ticket>> {
        Ok(self.locked().tickets.get(&id).cloned())
    }

    async fn find_user(&self, id: UserId) -> StoreResult<Option<User>> {
        Ok(self.locked().users.get(&id).cloned())
    }

    async fn find_branch(&self, id: BranchId) -> StoreResult<Option<Branch>> {
        Ok(self.locked().branches.get(&id).cloned())
    }

    async fn transitions_for_ticket(&self, id: TicketId) -> StoreResult<Vec<StateTransition>> {
        let state = self.locked();
        let mut entries: Vec<StateTransition> = state
            .transitions
            .iter()
            .filter(|entry| entry.ticket_id == id)
            .cloned()
            .collect();
        entries.sort_by_key(|entry| entry.recorded_at);
        Ok(entries)
    }

    async fn attachments_for_ticket(&self, id: TicketId) -> StoreResult<Vec<Attachment>> {
        let state = self.locked();
        let mut attachments: Vec<Attachment> = state
            .attachments
            .values()
            .filter(|attachment| attachment.ticket_id == id)
            .cloned()
            .collect();
        attachments.sort_by_key(|attachment| attachment.created_at);
        Ok(attachments)
    }
}

#[async_trait]
impl NotificationStore for InMemoryTicketStore {
    async fn find_notification(
        &self,
        id: NotificationId,
    ) -> StoreResult<Option<Notification>> {
        Ok(self.locked().notifications.get(&id).cloned())
    }

    async fn inbox_for(&self, recipient: UserId) -> StoreResult<Vec<Notification>> {
        let state = self.locked();
        let mut inbox: Vec<Notification> = state
            .notifications
            .values()
            .filter(|notification| notification.recipient() == recipient)
            .cloned()
            .collect();
        inbox.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(inbox)
    }

    async fn inbox_recent(&self, recipient: UserId, limit: u32) -> StoreResult<Vec<Notification>> {
        let mut inbox = self.inbox_for(recipient).await?;
        inbox.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(inbox)
    }

    async fn inbox_unread_count(&self, recipient: UserId) -> StoreResult<u64> {
        let state = self.locked();
        let count = state
            .notifications
            .values()
            .filter(|notification| {
                notification.recipient() == recipient && notification.is_unread()
            })
            .count();
        Ok(count as u64)
    }

    async fn mark_notification_read(
        &self,
        id: NotificationId,
        read_at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let mut state = self.locked();
        let Some(notification) = state.notifications.get_mut(&id) else {
            return Ok(false);
        };
        if notification.channel() != Channel::Internal || notification.read_at().is_some() {
            return Ok(false);
        }
        match notification.mark_read(read_at) {
            Ok(stamped) => Ok(stamped),
            Err(err) => Err(StoreError::Corrupt(err.to_string())),
        }
    }

    async fn pending_email_for_ticket(
        &self,
        ticket_id: TicketId,
    ) -> StoreResult<Vec<Notification>> {
        let state = self.locked();
        let mut pending: Vec<Notification> = state
            .notifications
            .values()
            .filter(|notification| {
                notification.ticket_id() == Some(ticket_id)
                    && notification.channel() == Channel::Email
                    && notification.delivery() == DeliveryState::Pending
            })
            .cloned()
            .collect();
        pending.sort_by_key(Notification::created_at);
        Ok(pending)
    }

    async fn record_delivery_outcome(
        &self,
        id: NotificationId,
        outcome: DeliveryOutcome,
        sent_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let mut state = self.locked();
        let notification = state
            .notifications
            .get_mut(&id)
            .ok_or_else(|| StoreError::Corrupt(format!("delivery outcome for unknown row {id}")))?;
        let result = match outcome {
            DeliveryOutcome::Sent => notification.mark_sent(sent_at),
            DeliveryOutcome::Failed => notification.mark_failed(sent_at),
        };
        result.map_err(|err| StoreError::Corrupt(err.to_string()))
    }
}
