//! Transactional persistence port for tickets, history, attachments and
//! notifications.

use crate::notification::domain::Notification;
use crate::ticket::domain::{
    Attachment, AttachmentId, Branch, BranchId, StateTransition, Ticket, TicketId, User, UserId,
};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors returned by store implementations.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Backend failure (connection, pool, commit).
    #[error("store backend failure: {0}")]
    Backend(Arc<dyn std::error::Error + Send + Sync>),

    /// A persisted row could not be mapped back into the domain.
    #[error("corrupt row: {0}")]
    Corrupt(String),
}

impl StoreError {
    /// Wraps a backend error.
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Backend(Arc::new(err))
    }
}

/// Operations available inside one store transaction.
///
/// All mutations performed through a [`StoreTx`] commit or roll back
/// atomically with the owning [`TicketStore::transaction`] call.
pub trait StoreTx {
    /// Finds a user by identifier.
    fn find_user(&mut self, id: UserId) -> StoreResult<Option<User>>;

    /// Finds a branch by identifier.
    fn find_branch(&mut self, id: BranchId) -> StoreResult<Option<Branch>>;

    /// Returns active supervisors bound to the given branch.
    fn active_supervisors_for_branch(&mut self, branch_id: BranchId) -> StoreResult<Vec<User>>;

    /// Returns active supervisors with no branch binding.
    fn active_global_supervisors(&mut self) -> StoreResult<Vec<User>>;

    /// Returns active administrators.
    fn active_admins(&mut self) -> StoreResult<Vec<User>>;

    /// Inserts a new ticket row.
    fn insert_ticket(&mut self, ticket: &Ticket) -> StoreResult<()>;

    /// Loads a ticket with an exclusive row lock held until the
    /// transaction ends, serialising concurrent mutators of the same
    /// ticket.
    fn ticket_for_update(&mut self, id: TicketId) -> StoreResult<Option<Ticket>>;

    /// Persists the mutable columns of an existing ticket.
    fn update_ticket(&mut self, ticket: &Ticket) -> StoreResult<()>;

    /// Hard-deletes a ticket together with its history, attachments and
    /// notifications. Returns the removed attachments so callers can
    /// clean up stored blobs after commit.
    fn delete_ticket(&mut self, id: TicketId) -> StoreResult<Vec<Attachment>>;

    /// Appends a state-transition history entry.
    fn insert_transition(&mut self, entry: &StateTransition) -> StoreResult<()>;

    /// Inserts an attachment row.
    fn insert_attachment(&mut self, attachment: &Attachment) -> StoreResult<()>;

    /// Finds an attachment by identifier.
    fn find_attachment(&mut self, id: AttachmentId) -> StoreResult<Option<Attachment>>;

    /// Deletes one attachment row.
    fn delete_attachment(&mut self, id: AttachmentId) -> StoreResult<()>;

    /// Clears the primary flag on all attachments of a ticket.
    fn clear_primary_attachments(&mut self, ticket_id: TicketId) -> StoreResult<()>;

    /// Counts the attachments of a ticket.
    fn attachment_count(&mut self, ticket_id: TicketId) -> StoreResult<u64>;

    /// Inserts a notification row.
    fn insert_notification(&mut self, notification: &Notification) -> StoreResult<()>;
}

/// Ticket persistence contract.
///
/// Mutating protocols run through [`TicketStore::transaction`]; the
/// remaining methods are single-statement reads used outside of any
/// transaction.
#[async_trait]
pub trait TicketStore: Send + Sync {
    /// Runs `work` inside one store transaction, committing when it
    /// returns `Ok` and rolling back when it returns `Err`.
    ///
    /// # Errors
    ///
    /// Surfaces the closure's error verbatim; backend begin/commit
    /// failures are converted through `E::from(StoreError)`.
    async fn transaction<T, E, F>(&self, work: F) -> Result<T, E>
    where
        T: Send + 'static,
        E: From<StoreError> + Send + 'static,
        F: FnOnce(&mut dyn StoreTx) -> Result<T, E> + Send + 'static;

    /// Finds a ticket by identifier.
    async fn find_ticket(&self, id: TicketId) -> StoreResult<Option<Ticket>>;

    /// Finds a user by identifier.
    async fn find_user(&self, id: UserId) -> StoreResult<Option<User>>;

    /// Finds a branch by identifier.
    async fn find_branch(&self, id: BranchId) -> StoreResult<Option<Branch>>;

    /// Returns a ticket's history entries, oldest first.
    async fn transitions_for_ticket(&self, id: TicketId) -> StoreResult<Vec<StateTransition>>;

    /// Returns a ticket's attachments, oldest first.
    async fn attachments_for_ticket(&self, id: TicketId) -> StoreResult<Vec<Attachment>>;
}
