//! Entity store adapters.
//!
//! Both adapters implement [`hotelier_core::EntityStore`] for any [`hotelier_core::Entity`]
//! and are handed to the service layer as `Arc<dyn EntityStore<T>>`.

mod in_memory;
mod postgres;

pub use in_memory::{InMemoryDatabase, InMemoryStore};
pub use postgres::{PostgresDatabase, PostgresStore};
