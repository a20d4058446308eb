//! Port contracts for notification queries and delivery tracking.

pub mod store;

pub use store::{DeliveryOutcome, NotificationStore};
