//! Unit tests for the notification module.

mod delivery_tests;
mod domain_tests;
mod inbox_tests;
mod templates_tests;
