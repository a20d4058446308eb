//! Unit tests for the ticket module.
//!
//! Tests are organised by concern: state-machine rules, domain types,
//! recipient resolution, fan-out, and the lifecycle service protocols.

mod fixtures;
mod recipients_tests;
mod state_transition_tests;
