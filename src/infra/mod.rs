//! Infrastructure adapters for ticket storage backends.

pub mod store;
pub use store::InMemoryTicketStore;
