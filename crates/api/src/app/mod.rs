//! HTTP API application wiring (axum router + service wiring).
//!
//! - `services.rs`: store backend selection and domain service assembly
//! - `routes/`: HTTP routes + handlers (one file per resource)
//! - `dto.rs`: query/body DTOs and boundary validation
//! - `errors.rs`: the error envelope and failure translation

use std::sync::Arc;

use axum::{Extension, Router};
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;

use hotelier_infra::Settings;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router around already-wired services.
pub fn build_router(services: Arc<services::AppServices>) -> Router {
    routes::router(&services.admission)
        .fallback(errors::route_not_found)
        .method_not_allowed_fallback(errors::method_not_allowed)
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(middleware::request_context))
                .layer(CatchPanicLayer::custom(errors::panic_response))
                .layer(Extension(services)),
        )
}

/// Build the router for the configured backend (public entrypoint used by `main.rs`).
pub async fn build_app(settings: &Settings) -> anyhow::Result<(Router, Arc<services::AppServices>)> {
    let services = Arc::new(services::build_services(settings).await?);
    Ok((build_router(services.clone()), services))
}
