use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        Extension, Path, Query,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    routing::{delete, get, post},
};

use hotelier_core::models::Booking;
use hotelier_infra::{RateAdmission, RouteClass};

use crate::app::routes::common::resource_id;
use crate::app::{dto, errors::ApiError, services::AppServices};
use crate::middleware::gated;

pub fn router(admission: &Arc<RateAdmission>) -> Router {
    Router::new()
        .route("/bookings", gated(get(list_bookings), admission, RouteClass::Search))
        .route("/booking", gated(post(create_booking), admission, RouteClass::Write))
        .route("/booking/:id", gated(get(get_booking), admission, RouteClass::Read))
        .route("/booking/:id", gated(delete(delete_booking), admission, RouteClass::Delete))
}

pub async fn list_bookings(
    Extension(services): Extension<Arc<AppServices>>,
    query: Result<Query<dto::BookingsQuery>, QueryRejection>,
) -> Result<Json<Vec<Booking>>, ApiError> {
    let Query(query) = query?;
    let (filter, params) = query.into_parts()?;
    Ok(Json(services.bookings.list(&filter, &params).await?))
}

pub async fn get_booking(
    Extension(services): Extension<Arc<AppServices>>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Booking>, ApiError> {
    let id = resource_id(path)?;
    Ok(Json(services.bookings.get(id).await?))
}

/// Price is computed server-side from the room's nightly rate.
pub async fn create_booking(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::CreateBookingRequest>, JsonRejection>,
) -> Result<Json<Booking>, ApiError> {
    let Json(body) = body?;
    Ok(Json(services.bookings.create(body.validate()?).await?))
}

/// Returns the deleted booking.
pub async fn delete_booking(
    Extension(services): Extension<Arc<AppServices>>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Booking>, ApiError> {
    let id = resource_id(path)?;
    Ok(Json(services.bookings.delete(id).await?))
}
