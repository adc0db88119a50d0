use std::sync::Arc;

use axum::Router;

use hotelier_infra::RateAdmission;

pub mod bookings;
pub mod common;
pub mod customers;
pub mod rooms;
pub mod system;

/// Every endpoint. Resource routes are admission-gated per route class; system routes are not.
pub fn router(admission: &Arc<RateAdmission>) -> Router {
    Router::new()
        .merge(system::router())
        .merge(rooms::router(admission))
        .merge(customers::router(admission))
        .merge(bookings::router(admission))
}
