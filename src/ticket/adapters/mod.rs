//! Infrastructure adapters implementing the ticket and notification
//! ports.

pub mod fs;
pub mod memory;
pub mod postgres;
pub mod smtp;
