//! Ticket store backends.

pub mod memory;

pub use memory::{InMemoryTicketStore, StoreStats};
