//! Domain operations for rooms, customers and bookings.
//!
//! Each service composes entity store calls with the entity's business rules. Services hold
//! their stores as `Arc<dyn EntityStore<_>>` and never cache records across calls.

pub mod bookings;
pub mod customers;
pub mod rooms;

pub use bookings::{BookingFilter, BookingService, NewBooking};
pub use customers::{CustomerChanges, CustomerFilter, CustomerService, NewCustomer};
pub use rooms::{RoomFilter, RoomService};

use hotelier_core::query::DEFAULT_LIMIT;

/// Pagination and ordering shared by every listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListParams {
    pub skip: u64,
    pub limit: u64,
    pub sort_by: Option<String>,
    pub order: Option<String>,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: DEFAULT_LIMIT,
            sort_by: Some("id".to_string()),
            order: Some("asc".to_string()),
        }
    }
}
