use std::sync::Arc;

use axum::{
    Json, Router,
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::json;

use crate::app::errors::{self, UNAVAILABLE};
use crate::app::services::AppServices;

pub const SERVICE_NAME: &str = "hotel-api";
pub const BANNER: &str = "The server is watching you, without blinking.";

/// Banner and probes. Never rate limited so monitoring always gets through.
pub fn router() -> Router {
    Router::new()
        .route("/", get(banner))
        .route("/health", get(health))
        .route("/health/", get(health))
        .route("/health/ready", get(ready))
}

pub async fn banner() -> &'static str {
    BANNER
}

pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy", "service": SERVICE_NAME }))
}

pub async fn ready(Extension(services): Extension<Arc<AppServices>>) -> Response {
    match services.health.ping().await {
        Ok(()) => Json(json!({
            "status": "ready",
            "service": SERVICE_NAME,
            "database": "connected",
        }))
        .into_response(),
        Err(err) => {
            tracing::error!(error = %err, "readiness check failed");
            errors::json_error(
                StatusCode::SERVICE_UNAVAILABLE,
                UNAVAILABLE,
                "Database connection failed",
                json!({ "service": SERVICE_NAME, "database": "disconnected" }),
            )
        }
    }
}
