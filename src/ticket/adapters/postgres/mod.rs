//! `PostgreSQL` adapters for ticket and notification persistence.

mod audit;
mod models;
mod schema;
mod store;

pub use audit::PostgresAuditLog;
pub use store::{PostgresTicketStore, TicketPgPool};
