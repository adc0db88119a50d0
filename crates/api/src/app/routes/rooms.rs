use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query, rejection::{PathRejection, QueryRejection}},
    routing::get,
};

use hotelier_core::models::Room;
use hotelier_infra::{RateAdmission, RouteClass};

use crate::app::routes::common::resource_id;
use crate::app::{dto, errors::ApiError, services::AppServices};
use crate::middleware::gated;

pub fn router(admission: &Arc<RateAdmission>) -> Router {
    Router::new()
        .route("/rooms", gated(get(list_rooms), admission, RouteClass::Search))
        .route("/room/:id", gated(get(get_room), admission, RouteClass::Read))
}

pub async fn list_rooms(
    Extension(services): Extension<Arc<AppServices>>,
    query: Result<Query<dto::RoomsQuery>, QueryRejection>,
) -> Result<Json<Vec<Room>>, ApiError> {
    let Query(query) = query?;
    let (filter, params) = query.into_parts()?;
    Ok(Json(services.rooms.list(&filter, &params).await?))
}

pub async fn get_room(
    Extension(services): Extension<Arc<AppServices>>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Room>, ApiError> {
    let id = resource_id(path)?;
    Ok(Json(services.rooms.get(id).await?))
}
