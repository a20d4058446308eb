//! Ticket lifecycle orchestration: creation, attachment uploads with the
//! activation gate, supervisor state changes, and administrative
//! deletion.
//!
//! Every mutating protocol runs inside one store transaction. Audit
//! entries and email-delivery scheduling are issued strictly after
//! commit, so a caller never observes a notification-related side effect
//! for a rolled-back mutation. Fan-out failures inside the transaction
//! are caught, logged and swallowed: visibility loss is preferred over
//! losing a ticket.

use super::fanout::fan_out_ticket_created;
use crate::ticket::domain::{
    Actor, Attachment, AttachmentId, BranchId, EmptySubjectError, FileUpload, Role,
    StateTransition, Subject, Ticket, TicketDraft, TicketId, TicketState, TicketStateError,
    UserId,
};
use crate::ticket::ports::{
    AuditAction, AuditEntry, AuditSink, DeliveryScheduler, FileStore, FileStoreError, StoreError,
    TicketStore,
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use mockable::Clock;
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

/// Client-caused input failures (400-class).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// The subject was missing or blank.
    #[error(transparent)]
    EmptySubject(#[from] EmptySubjectError),

    /// No branch was given and the actor has no home branch.
    #[error("no branch given and the actor has no home branch")]
    NoBranch,

    /// The referenced branch does not exist.
    #[error("unknown branch: {0}")]
    UnknownBranch(BranchId),

    /// An upload operation carried no files.
    #[error("at least one file is required")]
    NoFiles,
}

/// Authorisation failures (403-class), reported distinctly from
/// validation failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PermissionError {
    /// The actor's role does not authorise the operation.
    #[error("role {role} may not {action}")]
    RoleDenied {
        /// Role of the caller.
        role: Role,
        /// Description of the denied operation.
        action: &'static str,
    },

    /// Operators may only touch tickets they created.
    #[error("user {user} is not the creator of ticket {ticket}")]
    NotTicketCreator {
        /// The calling operator.
        user: UserId,
        /// The foreign ticket.
        ticket: TicketId,
    },
}

/// Service-level errors for ticket lifecycle operations.
///
/// A failed operation had zero effect: every error is raised before the
/// owning transaction commits.
#[derive(Debug, Clone, Error)]
pub enum TicketServiceError {
    /// Malformed or missing input.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The referenced ticket does not exist.
    #[error("ticket not found: {0}")]
    TicketNotFound(TicketId),

    /// The referenced attachment does not exist.
    #[error("attachment not found: {0}")]
    AttachmentNotFound(AttachmentId),

    /// The actor is not authorised.
    #[error(transparent)]
    Permission(#[from] PermissionError),

    /// The operation is not legal in the ticket's current state.
    #[error(transparent)]
    StateConflict(#[from] TicketStateError),

    /// Blob storage failed while persisting uploads.
    #[error(transparent)]
    Files(#[from] FileStoreError),

    /// Transient store failure; the transaction rolled back.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Request payload for creating a ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTicketRequest {
    occurred_on: NaiveDate,
    subject: String,
    occurred_at: Option<NaiveTime>,
    branch_id: Option<BranchId>,
    description: Option<String>,
}

impl CreateTicketRequest {
    /// Creates a request with the required fields.
    #[must_use]
    pub fn new(occurred_on: NaiveDate, subject: impl Into<String>) -> Self {
        Self {
            occurred_on,
            subject: subject.into(),
            occurred_at: None,
            branch_id: None,
            description: None,
        }
    }

    /// Sets the business time of the reported event.
    #[must_use]
    pub const fn with_time(mut self, occurred_at: NaiveTime) -> Self {
        self.occurred_at = Some(occurred_at);
        self
    }

    /// Sets an explicit target branch instead of the actor's home branch.
    #[must_use]
    pub const fn with_branch(mut self, branch_id: BranchId) -> Self {
        self.branch_id = Some(branch_id);
        self
    }

    /// Sets the free-text description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Result of an upload operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachFilesOutcome {
    /// The ticket after the upload, post-gate if it fired.
    pub ticket: Ticket,
    /// The attachments created by this upload.
    pub attachments: Vec<Attachment>,
    /// Whether this upload fired the `pending_attachments → pending`
    /// gate.
    pub activated: bool,
}

/// Result of a supervisor state change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeStateOutcome {
    /// The ticket after the change.
    pub ticket: Ticket,
    /// The state before the change.
    pub previous: TicketState,
}

/// Ticket lifecycle orchestration service.
pub struct TicketLifecycleService<S, C>
where
    S: TicketStore + 'static,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    files: Arc<dyn FileStore>,
    audit: Arc<dyn AuditSink>,
    scheduler: Arc<dyn DeliveryScheduler>,
    clock: Arc<C>,
}

// Derived Clone would demand `S: Clone` and `C: Clone`; only the handles
// are cloned.
impl<S, C> Clone for TicketLifecycleService<S, C>
where
    S: TicketStore + 'static,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            files: Arc::clone(&self.files),
            audit: Arc::clone(&self.audit),
            scheduler: Arc::clone(&self.scheduler),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<S, C> TicketLifecycleService<S, C>
where
    S: TicketStore + 'static,
    C: Clock + Send + Sync,
{
    /// Creates a new lifecycle service.
    #[must_use]
    pub const fn new(
        store: Arc<S>,
        files: Arc<dyn FileStore>,
        audit: Arc<dyn AuditSink>,
        scheduler: Arc<dyn DeliveryScheduler>,
        clock: Arc<C>,
    ) -> Self {
        Self {
            store,
            files,
            audit,
            scheduler,
            clock,
        }
    }

    /// Creates a ticket.
    ///
    /// The ticket starts in `pending`, or in `pending_attachments` when
    /// the branch requires attachment gating (in which case no fan-out
    /// happens until the gate fires). The synthetic first history entry
    /// and, for `pending` tickets, the notification fan-out are written
    /// in the same transaction.
    ///
    /// # Errors
    ///
    /// Returns [`TicketServiceError::Validation`] for a blank subject,
    /// an unresolvable branch, or an unknown branch, and
    /// [`TicketServiceError::Store`] when the transaction fails.
    pub async fn create(
        &self,
        request: CreateTicketRequest,
        actor: &Actor,
    ) -> Result<Ticket, TicketServiceError> {
        let subject = Subject::new(request.subject).map_err(ValidationError::from)?;
        let branch_id = request
            .branch_id
            .or(actor.home_branch())
            .ok_or(ValidationError::NoBranch)?;
        let now = self.clock.utc();
        let actor_id = actor.user_id();
        let occurred_on = request.occurred_on;
        let occurred_at = request.occurred_at;
        let description = request.description;

        let ticket = self
            .store
            .transaction(move |tx| {
                let branch = tx
                    .find_branch(branch_id)?
                    .ok_or(ValidationError::UnknownBranch(branch_id))?;
                let initial_state = if branch.requires_attachments {
                    TicketState::PendingAttachments
                } else {
                    TicketState::Pending
                };
                let ticket = Ticket::open(
                    TicketDraft {
                        occurred_on,
                        occurred_at,
                        branch_id,
                        created_by: actor_id,
                        subject,
                        description,
                    },
                    initial_state,
                    now,
                );
                tx.insert_ticket(&ticket)?;
                tx.insert_transition(&StateTransition::initial(
                    ticket.id(),
                    initial_state,
                    actor_id,
                    now,
                ))?;
                if initial_state == TicketState::Pending {
                    run_fan_out(tx, &ticket, &branch, now);
                }
                Ok::<_, TicketServiceError>(ticket)
            })
            .await?;

        self.audit
            .record(AuditEntry::new(
                actor_id,
                AuditAction::TicketCreated,
                ticket.id(),
                json!({
                    "state": ticket.state().as_str(),
                    "subject": ticket.subject().as_str(),
                    "branch_id": ticket.branch_id(),
                }),
                now,
            ))
            .await;
        if ticket.state() == TicketState::Pending {
            self.scheduler.schedule_email_delivery(ticket.id());
        }
        Ok(ticket)
    }

    /// Adds one or more files to a ticket.
    ///
    /// Blobs are persisted to the file store first, then the attachment
    /// rows are written under an exclusive row lock on the ticket. When
    /// the ticket entered the transaction in `pending_attachments` and
    /// now carries at least one attachment, the gate fires: the ticket
    /// moves to `pending`, a history entry is appended and fan-out runs
    /// in the same transaction. If the transaction fails, the stored
    /// blobs are deleted best-effort.
    ///
    /// # Errors
    ///
    /// Returns [`TicketServiceError::Validation`] for an empty upload,
    /// [`TicketServiceError::TicketNotFound`] for unknown tickets,
    /// [`TicketServiceError::Permission`] when an operator uploads to a
    /// foreign ticket, [`TicketServiceError::StateConflict`] when the
    /// ticket is not editable, [`TicketServiceError::Files`] when blob
    /// storage fails, and [`TicketServiceError::Store`] when the
    /// transaction fails.
    pub async fn attach_files(
        &self,
        ticket_id: TicketId,
        files: Vec<FileUpload>,
        actor: &Actor,
    ) -> Result<AttachFilesOutcome, TicketServiceError> {
        if files.is_empty() {
            return Err(ValidationError::NoFiles.into());
        }
        let now = self.clock.utc();
        let actor_id = actor.user_id();
        let actor_role = actor.role();

        let stored = self.store_uploads(ticket_id, files, now).await?;

        let attachments = stored.clone();
        let result = self
            .store
            .transaction(move |tx| {
                let mut ticket = tx
                    .ticket_for_update(ticket_id)?
                    .ok_or(TicketServiceError::TicketNotFound(ticket_id))?;
                let entry_state = ticket.state();
                if !entry_state.is_editable() {
                    return Err(TicketStateError::NotEditable {
                        ticket: ticket_id,
                        state: entry_state,
                    }
                    .into());
                }
                if actor_role == Role::Operator && ticket.created_by() != actor_id {
                    return Err(PermissionError::NotTicketCreator {
                        user: actor_id,
                        ticket: ticket_id,
                    }
                    .into());
                }

                for attachment in &attachments {
                    if attachment.is_primary {
                        tx.clear_primary_attachments(ticket_id)?;
                    }
                    tx.insert_attachment(attachment)?;
                }

                let mut activated = false;
                if entry_state == TicketState::PendingAttachments
                    && tx.attachment_count(ticket_id)? > 0
                {
                    ticket.activate(now)?;
                    tx.update_ticket(&ticket)?;
                    tx.insert_transition(&StateTransition::record(
                        ticket_id,
                        TicketState::PendingAttachments,
                        TicketState::Pending,
                        actor_id,
                        None,
                        now,
                    ))?;
                    let branch = tx
                        .find_branch(ticket.branch_id())?
                        .ok_or(ValidationError::UnknownBranch(ticket.branch_id()))?;
                    run_fan_out(tx, &ticket, &branch, now);
                    activated = true;
                }
                Ok::<_, TicketServiceError>((ticket, activated))
            })
            .await;

        let (ticket, activated) = match result {
            Ok(outcome) => outcome,
            Err(error) => {
                self.discard_blobs(&stored).await;
                return Err(error);
            }
        };

        for attachment in &stored {
            self.audit
                .record(AuditEntry::new(
                    actor_id,
                    AuditAction::AttachmentAdded,
                    ticket_id,
                    json!({
                        "attachment_id": attachment.id,
                        "kind": attachment.kind.as_str(),
                        "original_name": attachment.original_name,
                        "is_primary": attachment.is_primary,
                    }),
                    now,
                ))
                .await;
        }
        if activated {
            self.scheduler.schedule_email_delivery(ticket_id);
        }
        Ok(AttachFilesOutcome {
            ticket,
            attachments: stored,
            activated,
        })
    }

    /// Applies a supervisor state change.
    ///
    /// Appends a history entry, stamps `closed_at` when entering
    /// `closed`, and appends the comment to the remarks log when
    /// entering `authorized`, `rejected` or `closed`.
    ///
    /// # Errors
    ///
    /// Returns [`TicketServiceError::Permission`] for non-supervisory
    /// callers, [`TicketServiceError::TicketNotFound`] for unknown
    /// tickets, [`TicketServiceError::StateConflict`] when the state
    /// machine rejects the transition, and [`TicketServiceError::Store`]
    /// when the transaction fails.
    pub async fn change_state(
        &self,
        ticket_id: TicketId,
        new_state: TicketState,
        comment: Option<String>,
        actor: &Actor,
    ) -> Result<ChangeStateOutcome, TicketServiceError> {
        if !actor.role().is_supervisory() {
            return Err(PermissionError::RoleDenied {
                role: actor.role(),
                action: "change ticket state",
            }
            .into());
        }
        let now = self.clock.utc();
        let actor_id = actor.user_id();
        let audit_comment = comment.clone();

        let (ticket, previous) = self
            .store
            .transaction(move |tx| {
                let mut ticket = tx
                    .ticket_for_update(ticket_id)?
                    .ok_or(TicketServiceError::TicketNotFound(ticket_id))?;
                let previous = ticket.change_state(new_state, comment.as_deref(), now)?;
                tx.update_ticket(&ticket)?;
                tx.insert_transition(&StateTransition::record(
                    ticket_id, previous, new_state, actor_id, comment, now,
                ))?;
                Ok::<_, TicketServiceError>((ticket, previous))
            })
            .await?;

        self.audit
            .record(AuditEntry::new(
                actor_id,
                AuditAction::TicketStateChanged,
                ticket_id,
                json!({
                    "from": previous.as_str(),
                    "to": new_state.as_str(),
                    "comment": audit_comment,
                }),
                now,
            ))
            .await;
        Ok(ChangeStateOutcome { ticket, previous })
    }

    /// Hard-deletes a ticket with its history, attachments and
    /// notifications.
    ///
    /// Stored attachment blobs are deleted best-effort after commit. No
    /// notification side effects.
    ///
    /// # Errors
    ///
    /// Returns [`TicketServiceError::Permission`] for non-admin callers,
    /// [`TicketServiceError::TicketNotFound`] for unknown tickets, and
    /// [`TicketServiceError::Store`] when the transaction fails.
    pub async fn delete_ticket(
        &self,
        ticket_id: TicketId,
        actor: &Actor,
    ) -> Result<(), TicketServiceError> {
        if actor.role() != Role::Admin {
            return Err(PermissionError::RoleDenied {
                role: actor.role(),
                action: "delete tickets",
            }
            .into());
        }
        let now = self.clock.utc();
        let actor_id = actor.user_id();

        let removed = self
            .store
            .transaction(move |tx| {
                tx.ticket_for_update(ticket_id)?
                    .ok_or(TicketServiceError::TicketNotFound(ticket_id))?;
                let attachments = tx.delete_ticket(ticket_id)?;
                Ok::<_, TicketServiceError>(attachments)
            })
            .await?;

        self.discard_blobs(&removed).await;
        self.audit
            .record(AuditEntry::new(
                actor_id,
                AuditAction::TicketDeleted,
                ticket_id,
                json!({ "attachments_removed": removed.len() }),
                now,
            ))
            .await;
        Ok(())
    }

    /// Deletes one attachment.
    ///
    /// The stored blob is deleted best-effort after commit; the database
    /// deletion succeeds regardless.
    ///
    /// # Errors
    ///
    /// Returns [`TicketServiceError::AttachmentNotFound`] for unknown
    /// attachments, [`TicketServiceError::TicketNotFound`] when the
    /// owning ticket is gone, [`TicketServiceError::Permission`] when an
    /// operator touches a foreign ticket, and
    /// [`TicketServiceError::Store`] when the transaction fails.
    pub async fn delete_attachment(
        &self,
        attachment_id: AttachmentId,
        actor: &Actor,
    ) -> Result<(), TicketServiceError> {
        let now = self.clock.utc();
        let actor_id = actor.user_id();
        let actor_role = actor.role();

        let attachment = self
            .store
            .transaction(move |tx| {
                let attachment = tx
                    .find_attachment(attachment_id)?
                    .ok_or(TicketServiceError::AttachmentNotFound(attachment_id))?;
                // Locking the ticket keeps the attachment count stable
                // for any concurrent upload evaluating the gate.
                let ticket = tx
                    .ticket_for_update(attachment.ticket_id)?
                    .ok_or(TicketServiceError::TicketNotFound(attachment.ticket_id))?;
                if actor_role == Role::Operator && ticket.created_by() != actor_id {
                    return Err(PermissionError::NotTicketCreator {
                        user: actor_id,
                        ticket: ticket.id(),
                    }
                    .into());
                }
                tx.delete_attachment(attachment_id)?;
                Ok::<_, TicketServiceError>(attachment)
            })
            .await?;

        self.discard_blobs(std::slice::from_ref(&attachment)).await;
        self.audit
            .record(AuditEntry::new(
                actor_id,
                AuditAction::AttachmentDeleted,
                attachment.ticket_id,
                json!({
                    "attachment_id": attachment.id,
                    "original_name": attachment.original_name,
                }),
                now,
            ))
            .await;
        Ok(())
    }

    /// Persists upload payloads, cleaning up already stored blobs when a
    /// later one fails.
    async fn store_uploads(
        &self,
        ticket_id: TicketId,
        files: Vec<FileUpload>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Attachment>, TicketServiceError> {
        let mut stored: Vec<Attachment> = Vec::with_capacity(files.len());
        for file in files {
            match self.files.put(&file.original_name, &file.bytes).await {
                Ok(locator) => {
                    stored.push(Attachment::from_upload(ticket_id, file, locator, now));
                }
                Err(error) => {
                    self.discard_blobs(&stored).await;
                    return Err(error.into());
                }
            }
        }
        Ok(stored)
    }

    /// Best-effort removal of stored blobs; failures are logged only.
    async fn discard_blobs(&self, attachments: &[Attachment]) {
        for attachment in attachments {
            if let Err(error) = self.files.delete(&attachment.locator).await {
                tracing::warn!(
                    locator = %attachment.locator,
                    %error,
                    "orphaned attachment blob could not be removed"
                );
            }
        }
    }
}

/// Runs fan-out inside the caller's transaction, swallowing failures.
fn run_fan_out(
    tx: &mut dyn crate::ticket::ports::StoreTx,
    ticket: &Ticket,
    branch: &crate::ticket::domain::Branch,
    now: DateTime<Utc>,
) {
    match fan_out_ticket_created(tx, ticket, branch, now) {
        Ok(created) => {
            tracing::debug!(ticket = %ticket.id(), notifications = created, "fan-out completed");
        }
        Err(error) => {
            tracing::warn!(
                ticket = %ticket.id(),
                %error,
                "notification fan-out failed; ticket mutation continues"
            );
        }
    }
}
