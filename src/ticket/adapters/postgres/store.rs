//! `PostgreSQL`-backed transactional ticket and notification store.

use super::models::{
    AttachmentRow, BranchRow, NotificationRow, TicketRow, TransitionRow, UserRow,
    attachment_to_new_row, notification_to_new_row, row_to_attachment, row_to_branch,
    row_to_notification, row_to_ticket, row_to_transition, row_to_user, ticket_to_new_row,
    transition_to_new_row,
};
use super::schema::{branches, notifications, ticket_attachments, ticket_transitions, tickets, users};
use crate::notification::domain::{Channel, DeliveryState, Notification};
use crate::notification::ports::{DeliveryOutcome, NotificationStore};
use crate::ticket::domain::{
    Attachment, AttachmentId, Branch, BranchId, NotificationId, Role, StateTransition, Ticket,
    TicketId, User, UserId,
};
use crate::ticket::ports::{StoreError, StoreResult, StoreTx, TicketStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::Error as DieselError;

/// `PostgreSQL` connection pool type used by ticket adapters.
pub type TicketPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed ticket and notification store.
#[derive(Debug, Clone)]
pub struct PostgresTicketStore {
    pool: TicketPgPool,
}

impl PostgresTicketStore {
    /// Creates a new store from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: TicketPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut PgConnection) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(StoreError::backend)?;
            f(&mut connection)
        })
        .await
        .map_err(StoreError::backend)?
    }
}

/// Failure channel for closures run inside a database transaction.
///
/// Diesel's transaction API requires the error type to absorb its own
/// errors via `From`; this wrapper keeps the closure's application error
/// separate from backend failures so it can be surfaced verbatim.
enum TxFailure<E> {
    App(E),
    Store(StoreError),
    Db(DieselError),
}

impl<E> From<DieselError> for TxFailure<E> {
    fn from(err: DieselError) -> Self {
        Self::Db(err)
    }
}

struct PgTx<'a> {
    connection: &'a mut PgConnection,
}

impl StoreTx for PgTx<'_> {
    fn find_user(&mut self, id: UserId) -> StoreResult<Option<User>> {
        let row = users::table
            .find(id.into_inner())
            .select(UserRow::as_select())
            .first::<UserRow>(self.connection)
            .optional()
            .map_err(StoreError::backend)?;
        row.map(row_to_user).transpose()
    }

    fn find_branch(&mut self, id: BranchId) -> StoreResult<Option<Branch>> {
        let row = branches::table
            .find(id.into_inner())
            .select(BranchRow::as_select())
            .first::<BranchRow>(self.connection)
            .optional()
            .map_err(StoreError::backend)?;
        Ok(row.map(row_to_branch))
    }

    fn active_supervisors_for_branch(&mut self, branch_id: BranchId) -> StoreResult<Vec<User>> {
        let rows = users::table
            .filter(users::role.eq(Role::Supervisor.as_str()))
            .filter(users::active.eq(true))
            .filter(users::branch_id.eq(branch_id.into_inner()))
            .order(users::display_name.asc())
            .select(UserRow::as_select())
            .load::<UserRow>(self.connection)
            .map_err(StoreError::backend)?;
        rows.into_iter().map(row_to_user).collect()
    }

    fn active_global_supervisors(&mut self) -> StoreResult<Vec<User>> {
        let rows = users::table
            .filter(users::role.eq(Role::Supervisor.as_str()))
            .filter(users::active.eq(true))
            .filter(users::branch_id.is_null())
            .order(users::display_name.asc())
            .select(UserRow::as_select())
            .load::<UserRow>(self.connection)
            .map_err(StoreError::backend)?;
        rows.into_iter().map(row_to_user).collect()
    }

    fn active_admins(&mut self) -> StoreResult<Vec<User>> {
        let rows = users::table
            .filter(users::role.eq(Role::Admin.as_str()))
            .filter(users::active.eq(true))
            .order(users::display_name.asc())
            .select(UserRow::as_select())
            .load::<UserRow>(self.connection)
            .map_err(StoreError::backend)?;
        rows.into_iter().map(row_to_user).collect()
    }

    fn insert_ticket(&mut self, ticket: &Ticket) -> StoreResult<()> {
        diesel::insert_into(tickets::table)
            .values(ticket_to_new_row(ticket))
            .execute(self.connection)
            .map_err(StoreError::backend)?;
        Ok(())
    }

    fn ticket_for_update(&mut self, id: TicketId) -> StoreResult<Option<Ticket>> {
        let row = tickets::table
            .find(id.into_inner())
            .for_update()
            .select(TicketRow::as_select())
            .first::<TicketRow>(self.connection)
            .optional()
            .map_err(StoreError::backend)?;
        row.map(row_to_ticket).transpose()
    }

    fn update_ticket(&mut self, ticket: &Ticket) -> StoreResult<()> {
        let updated = diesel::update(tickets::table.find(ticket.id().into_inner()))
            .set((
                tickets::state.eq(ticket.state().as_str()),
                tickets::remarks.eq(ticket.remarks()),
                tickets::closed_at.eq(ticket.closed_at()),
                tickets::updated_at.eq(ticket.updated_at()),
            ))
            .execute(self.connection)
            .map_err(StoreError::backend)?;
        if updated == 0 {
            return Err(StoreError::Corrupt(format!(
                "update of unknown ticket {}",
                ticket.id()
            )));
        }
        Ok(())
    }

    fn delete_ticket(&mut self, id: TicketId) -> StoreResult<Vec<Attachment>> {
        let removed = attachments_of(self.connection, id)?;
        diesel::delete(
            notifications::table.filter(notifications::ticket_id.eq(id.into_inner())),
        )
        .execute(self.connection)
        .map_err(StoreError::backend)?;
        diesel::delete(
            ticket_attachments::table.filter(ticket_attachments::ticket_id.eq(id.into_inner())),
        )
        .execute(self.connection)
        .map_err(StoreError::backend)?;
        diesel::delete(
            ticket_transitions::table.filter(ticket_transitions::ticket_id.eq(id.into_inner())),
        )
        .execute(self.connection)
        .map_err(StoreError::backend)?;
        diesel::delete(tickets::table.find(id.into_inner()))
            .execute(self.connection)
            .map_err(StoreError::backend)?;
        Ok(removed)
    }

    fn insert_transition(&mut self, entry: &StateTransition) -> StoreResult<()> {
        diesel::insert_into(ticket_transitions::table)
            .values(transition_to_new_row(entry))
            .execute(self.connection)
            .map_err(StoreError::backend)?;
        Ok(())
    }

    fn insert_attachment(&mut self, attachment: &Attachment) -> StoreResult<()> {
        diesel::insert_into(ticket_attachments::table)
            .values(attachment_to_new_row(attachment)?)
            .execute(self.connection)
            .map_err(StoreError::backend)?;
        Ok(())
    }

    fn find_attachment(&mut self, id: AttachmentId) -> StoreResult<Option<Attachment>> {
        let row = ticket_attachments::table
            .find(id.into_inner())
            .select(AttachmentRow::as_select())
            .first::<AttachmentRow>(self.connection)
            .optional()
            .map_err(StoreError::backend)?;
        row.map(row_to_attachment).transpose()
    }

    fn delete_attachment(&mut self, id: AttachmentId) -> StoreResult<()> {
        diesel::delete(ticket_attachments::table.find(id.into_inner()))
            .execute(self.connection)
            .map_err(StoreError::backend)?;
        Ok(())
    }

    fn clear_primary_attachments(&mut self, ticket_id: TicketId) -> StoreResult<()> {
        diesel::update(
            ticket_attachments::table
                .filter(ticket_attachments::ticket_id.eq(ticket_id.into_inner())),
        )
        .set(ticket_attachments::is_primary.eq(false))
        .execute(self.connection)
        .map_err(StoreError::backend)?;
        Ok(())
    }

    fn attachment_count(&mut self, ticket_id: TicketId) -> StoreResult<u64> {
        let count: i64 = ticket_attachments::table
            .filter(ticket_attachments::ticket_id.eq(ticket_id.into_inner()))
            .count()
            .get_result(self.connection)
            .map_err(StoreError::backend)?;
        u64::try_from(count).map_err(|err| StoreError::Corrupt(err.to_string()))
    }

    fn insert_notification(&mut self, notification: &Notification) -> StoreResult<()> {
        diesel::insert_into(notifications::table)
            .values(notification_to_new_row(notification))
            .execute(self.connection)
            .map_err(StoreError::backend)?;
        Ok(())
    }
}

fn attachments_of(connection: &mut PgConnection, id: TicketId) -> StoreResult<Vec<Attachment>> {
    let rows = ticket_attachments::table
        .filter(ticket_attachments::ticket_id.eq(id.into_inner()))
        .order(ticket_attachments::created_at.asc())
        .select(AttachmentRow::as_select())
        .load::<AttachmentRow>(connection)
        .map_err(StoreError::backend)?;
    rows.into_iter().map(row_to_attachment).collect()
}

#[async_trait]
impl TicketStore for PostgresTicketStore {
    async fn transaction<T, E, F>(&self, work: F) -> Result<T, E>
    where
        T: Send + 'static,
        E: From<StoreError> + Send + 'static,
        F: FnOnce(&mut dyn StoreTx) -> Result<T, E> + Send + 'static,
    {
        let pool = self.pool.clone();
        let outcome = tokio::task::spawn_blocking(move || {
            let mut connection = match pool.get() {
                Ok(connection) => connection,
                Err(err) => return Err(TxFailure::Store(StoreError::backend(err))),
            };
            connection.transaction::<T, TxFailure<E>, _>(|conn| {
                let mut tx = PgTx { connection: conn };
                work(&mut tx).map_err(TxFailure::App)
            })
        })
        .await;

        match outcome {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(TxFailure::App(err))) => Err(err),
            Ok(Err(TxFailure::Store(err))) => Err(E::from(err)),
            Ok(Err(TxFailure::Db(err))) => Err(E::from(StoreError::backend(err))),
            Err(join_err) => Err(E::from(StoreError::backend(join_err))),
        }
    }

    async fn find_ticket(&self, id: TicketId) -> StoreResult<Option<Ticket>> {
        self.run_blocking(move |connection| {
            let row = tickets::table
                .find(id.into_inner())
                .select(TicketRow::as_select())
                .first::<TicketRow>(connection)
                .optional()
                .map_err(StoreError::backend)?;
            row.map(row_to_ticket).transpose()
        })
        .await
    }

    async fn find_user(&self, id: UserId) -> StoreResult<Option<User>> {
        self.run_blocking(move |connection| {
            let row = users::table
                .find(id.into_inner())
                .select(UserRow::as_select())
                .first::<UserRow>(connection)
                .optional()
                .map_err(StoreError::backend)?;
            row.map(row_to_user).transpose()
        })
        .await
    }

    async fn find_branch(&self, id: BranchId) -> StoreResult<Option<Branch>> {
        self.run_blocking(move |connection| {
            let row = branches::table
                .find(id.into_inner())
                .select(BranchRow::as_select())
                .first::<BranchRow>(connection)
                .optional()
                .map_err(StoreError::backend)?;
            Ok(row.map(row_to_branch))
        })
        .await
    }

    async fn transitions_for_ticket(&self, id: TicketId) -> StoreResult<Vec<StateTransition>> {
        self.run_blocking(move |connection| {
            let rows = ticket_transitions::table
                .filter(ticket_transitions::ticket_id.eq(id.into_inner()))
                .order(ticket_transitions::recorded_at.asc())
                .select(TransitionRow::as_select())
                .load::<TransitionRow>(connection)
                .map_err(StoreError::backend)?;
            rows.into_iter().map(row_to_transition).collect()
        })
        .await
    }

    async fn attachments_for_ticket(&self, id: TicketId) -> StoreResult<Vec<Attachment>> {
        self.run_blocking(move |connection| attachments_of(connection, id))
            .await
    }
}

#[async_trait]
impl NotificationStore for PostgresTicketStore {
    async fn find_notification(
        &self,
        id: NotificationId,
    ) -> StoreResult<Option<Notification>> {
        self.run_blocking(move |connection| {
            let row = notifications::table
                .find(id.into_inner())
                .select(NotificationRow::as_select())
                .first::<NotificationRow>(connection)
                .optional()
                .map_err(StoreError::backend)?;
            row.map(row_to_notification).transpose()
        })
        .await
    }

    async fn inbox_for(&self, recipient: UserId) -> StoreResult<Vec<Notification>> {
        self.run_blocking(move |connection| {
            let rows = notifications::table
                .filter(notifications::recipient.eq(recipient.into_inner()))
                .order(notifications::created_at.desc())
                .select(NotificationRow::as_select())
                .load::<NotificationRow>(connection)
                .map_err(StoreError::backend)?;
            rows.into_iter().map(row_to_notification).collect()
        })
        .await
    }

    async fn inbox_recent(&self, recipient: UserId, limit: u32) -> StoreResult<Vec<Notification>> {
        self.run_blocking(move |connection| {
            let rows = notifications::table
                .filter(notifications::recipient.eq(recipient.into_inner()))
                .order(notifications::created_at.desc())
                .limit(i64::from(limit))
                .select(NotificationRow::as_select())
                .load::<NotificationRow>(connection)
                .map_err(StoreError::backend)?;
            rows.into_iter().map(row_to_notification).collect()
        })
        .await
    }

    async fn inbox_unread_count(&self, recipient: UserId) -> StoreResult<u64> {
        self.run_blocking(move |connection| {
            let count: i64 = notifications::table
                .filter(notifications::recipient.eq(recipient.into_inner()))
                .filter(notifications::channel.eq(Channel::Internal.as_str()))
                .filter(notifications::read_at.is_null())
                .count()
                .get_result(connection)
                .map_err(StoreError::backend)?;
            u64::try_from(count).map_err(|err| StoreError::Corrupt(err.to_string()))
        })
        .await
    }

    async fn mark_notification_read(
        &self,
        id: NotificationId,
        read_at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        self.run_blocking(move |connection| {
            // The null filter makes the stamp first-write-wins under
            // concurrent marking.
            let updated = diesel::update(
                notifications::table
                    .find(id.into_inner())
                    .filter(notifications::channel.eq(Channel::Internal.as_str()))
                    .filter(notifications::read_at.is_null()),
            )
            .set(notifications::read_at.eq(read_at))
            .execute(connection)
            .map_err(StoreError::backend)?;
            Ok(updated > 0)
        })
        .await
    }

    async fn pending_email_for_ticket(
        &self,
        ticket_id: TicketId,
    ) -> StoreResult<Vec<Notification>> {
        self.run_blocking(move |connection| {
            let rows = notifications::table
                .filter(notifications::ticket_id.eq(ticket_id.into_inner()))
                .filter(notifications::channel.eq(Channel::Email.as_str()))
                .filter(notifications::delivery.eq(DeliveryState::Pending.as_str()))
                .order(notifications::created_at.asc())
                .select(NotificationRow::as_select())
                .load::<NotificationRow>(connection)
                .map_err(StoreError::backend)?;
            rows.into_iter().map(row_to_notification).collect()
        })
        .await
    }

    async fn record_delivery_outcome(
        &self,
        id: NotificationId,
        outcome: DeliveryOutcome,
        sent_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let delivery = match outcome {
            DeliveryOutcome::Sent => DeliveryState::Sent,
            DeliveryOutcome::Failed => DeliveryState::Error,
        };
        self.run_blocking(move |connection| {
            let updated = diesel::update(
                notifications::table
                    .find(id.into_inner())
                    .filter(notifications::delivery.eq(DeliveryState::Pending.as_str())),
            )
            .set((
                notifications::delivery.eq(delivery.as_str()),
                notifications::sent_at.eq(sent_at),
            ))
            .execute(connection)
            .map_err(StoreError::backend)?;
            if updated == 0 {
                return Err(StoreError::Corrupt(format!(
                    "delivery outcome for non-pending notification {id}"
                )));
            }
            Ok(())
        })
        .await
    }
}
