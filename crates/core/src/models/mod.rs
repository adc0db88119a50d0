//! Persisted records: rooms, customers and bookings.

pub mod booking;
pub mod customer;
pub mod room;

pub use booking::Booking;
pub use customer::Customer;
pub use room::Room;
