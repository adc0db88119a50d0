use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        Extension, Path, Query,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    routing::{get, patch, post},
};

use hotelier_core::models::Customer;
use hotelier_infra::{RateAdmission, RouteClass};

use crate::app::routes::common::resource_id;
use crate::app::{dto, errors::ApiError, services::AppServices};
use crate::middleware::gated;

pub fn router(admission: &Arc<RateAdmission>) -> Router {
    Router::new()
        .route("/customers", gated(get(list_customers), admission, RouteClass::Search))
        .route("/customer", gated(post(create_customer), admission, RouteClass::Write))
        .route("/customer/:id", gated(get(get_customer), admission, RouteClass::Read))
        .route("/customer/:id", gated(patch(update_customer), admission, RouteClass::Write))
}

pub async fn list_customers(
    Extension(services): Extension<Arc<AppServices>>,
    query: Result<Query<dto::CustomersQuery>, QueryRejection>,
) -> Result<Json<Vec<Customer>>, ApiError> {
    let Query(query) = query?;
    let (filter, params) = query.into_parts()?;
    Ok(Json(services.customers.list(&filter, &params).await?))
}

pub async fn get_customer(
    Extension(services): Extension<Arc<AppServices>>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Customer>, ApiError> {
    let id = resource_id(path)?;
    Ok(Json(services.customers.get(id).await?))
}

pub async fn create_customer(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::CreateCustomerRequest>, JsonRejection>,
) -> Result<Json<Customer>, ApiError> {
    let Json(body) = body?;
    Ok(Json(services.customers.create(body.validate()?).await?))
}

pub async fn update_customer(
    Extension(services): Extension<Arc<AppServices>>,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<dto::UpdateCustomerRequest>, JsonRejection>,
) -> Result<Json<Customer>, ApiError> {
    let id = resource_id(path)?;
    let Json(body) = body?;
    Ok(Json(services.customers.update(id, body.validate()?).await?))
}
