//! Ticket lifecycle management for Mostrador.
//!
//! This module implements the ticket state machine, the creation and
//! state-change protocols, the attachment-count gate that keeps a ticket
//! invisible to supervisors until it carries at least one attachment, and
//! the in-transaction notification fan-out with its tiered supervisor
//! fallback. The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
