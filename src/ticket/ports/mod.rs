//! Port contracts for the ticket lifecycle.
//!
//! Ports define infrastructure-agnostic interfaces used by the lifecycle
//! services: the transactional store, the attachment blob store, the
//! outbound mail transport, the append-only audit sink, and the
//! post-commit delivery scheduler.

pub mod audit;
pub mod delivery;
pub mod files;
pub mod mail;
pub mod store;

pub use audit::{AuditAction, AuditEntry, AuditSink};
pub use delivery::DeliveryScheduler;
pub use files::{FileStore, FileStoreError};
pub use mail::{MailTransport, MailTransportError, OutboundEmail};
pub use store::{StoreError, StoreResult, StoreTx, TicketStore};
