//! `hotelier-core` — entity records, field metadata, query specs and the failure taxonomy.
//!
//! This crate contains **no I/O**. Store adapters (in-memory, Postgres) live in
//! `hotelier-infra` and implement the [`EntityStore`] trait defined here.

pub mod entity;
pub mod error;
pub mod models;
pub mod query;
pub mod store;
pub mod value;

pub use entity::{Entity, Field};
pub use error::{HotelError, HotelResult, StoreError};
pub use models::{Booking, Customer, Room};
pub use query::{build_query, Filter, Predicate, QuerySpec, Sort, SortDirection};
pub use store::{EntityStore, StoreHealth};
pub use value::{FieldKind, FieldMap, FieldValue};
