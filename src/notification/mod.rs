//! Notification records and delivery for Mostrador.
//!
//! A notification is one delivery obligation to one user: fan-out creates
//! an internal row (delivered immediately, read-tracked) and an email row
//! (delivered later by the detached worker) per recipient. This module
//! owns the notification domain, the user-facing inbox service, the fixed
//! message templates, and the email delivery worker with its post-commit
//! scheduler.

pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
