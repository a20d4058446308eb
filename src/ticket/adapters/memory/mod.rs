//! In-memory adapters for tests and local development.

mod audit;
mod files;
mod scheduler;
mod store;

pub use audit::InMemoryAuditLog;
pub use files::InMemoryFileStore;
pub use scheduler::RecordingScheduler;
pub use store::InMemoryTicketStore;
