//! `PostgreSQL` audit sink appending to the `audit_log` table.

use super::models::NewAuditRow;
use super::schema::audit_log;
use super::store::TicketPgPool;
use crate::ticket::ports::{AuditEntry, AuditSink};
use async_trait::async_trait;
use diesel::prelude::*;

/// Append-only audit sink writing one row per recorded entry.
///
/// Recording failures are logged and swallowed: an unavailable audit
/// table must never fail the audited operation.
#[derive(Debug, Clone)]
pub struct PostgresAuditLog {
    pool: TicketPgPool,
}

impl PostgresAuditLog {
    /// Creates a new audit sink from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: TicketPgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditSink for PostgresAuditLog {
    async fn record(&self, entry: AuditEntry) {
        let pool = self.pool.clone();
        let row = NewAuditRow {
            actor: entry.actor.into_inner(),
            action: entry.action.as_str().to_owned(),
            ticket_id: entry.ticket_id.into_inner(),
            detail: entry.detail,
            recorded_at: entry.recorded_at,
        };
        let ticket_id = entry.ticket_id;
        let action = entry.action;
        let outcome = tokio::task::spawn_blocking(move || {
            let mut connection = pool
                .get()
                .map_err(|err| err.to_string())?;
            diesel::insert_into(audit_log::table)
                .values(&row)
                .execute(&mut connection)
                .map_err(|err| err.to_string())?;
            Ok::<(), String>(())
        })
        .await;

        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(error)) => {
                tracing::warn!(%ticket_id, action = action.as_str(), error, "audit entry lost");
            }
            Err(join_err) => {
                tracing::warn!(
                    %ticket_id,
                    action = action.as_str(),
                    error = %join_err,
                    "audit entry lost"
                );
            }
        }
    }
}
