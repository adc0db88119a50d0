//! Error translation: every failure leaves the API as the same JSON envelope.
//!
//! `{"error": <category>, "message": <text>, "details": <object>}`
//!
//! [`ApiError`] wraps the domain taxonomy; its `IntoResponse` impl is the single exhaustive
//! mapping from failure kind to status code and envelope. Store and unclassified failures
//! are logged in full and redacted in the response.

use std::any::Any;

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};

use hotelier_core::{HotelError, StoreError};

pub const NOT_FOUND: &str = "Resource Not Found";
pub const VALIDATION: &str = "Validation Error";
pub const INTEGRITY: &str = "Integrity Constraint Violation";
pub const DATABASE: &str = "Database Error";
pub const METHOD_NOT_ALLOWED: &str = "Method Not Allowed";
pub const RATE_LIMITED: &str = "Rate Limit Exceeded";
pub const INTERNAL: &str = "Internal Server Error";
pub const UNAVAILABLE: &str = "Service Unavailable";

/// A request failure on its way out of a handler or middleware.
#[derive(Debug)]
pub struct ApiError(pub HotelError);

impl From<HotelError> for ApiError {
    fn from(err: HotelError) -> Self {
        Self(err)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        Self(err.into())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(HotelError::validation(
            "Invalid request body",
            json!({ "location": "body", "reason": rejection.body_text() }),
        ))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self(HotelError::validation(
            "Invalid query parameters",
            json!({ "location": "query", "reason": rejection.body_text() }),
        ))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self(HotelError::validation(
            "Invalid path parameter",
            json!({ "location": "path", "reason": rejection.body_text() }),
        ))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = self.0.to_string();
        match self.0 {
            HotelError::NotFound { resource, id } => {
                tracing::warn!(resource, id, "resource not found");
                json_error(
                    StatusCode::NOT_FOUND,
                    NOT_FOUND,
                    message,
                    json!({ "resource_type": resource, "resource_id": id }),
                )
            }
            HotelError::InvalidDateRange {
                check_in,
                check_out,
                days,
            } => {
                tracing::warn!(%check_in, %check_out, days, "invalid booking date range");
                json_error(
                    StatusCode::UNPROCESSABLE_ENTITY,
                    VALIDATION,
                    message,
                    json!({
                        "check_in": check_in.to_string(),
                        "check_out": check_out.to_string(),
                        "days": days,
                    }),
                )
            }
            HotelError::Validation { details, .. } => {
                tracing::warn!(%message, %details, "request validation failed");
                json_error(StatusCode::UNPROCESSABLE_ENTITY, VALIDATION, message, details)
            }
            HotelError::ConstraintViolation(detail) => {
                tracing::warn!(%detail, "integrity constraint violation");
                json_error(
                    StatusCode::UNPROCESSABLE_ENTITY,
                    INTEGRITY,
                    "Referenced resource does not exist or constraint violated",
                    json!({}),
                )
            }
            HotelError::StoreFailure(detail) => {
                tracing::error!(%detail, "store failure");
                json_error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    DATABASE,
                    "An internal database error occurred",
                    json!({}),
                )
            }
            HotelError::AdmissionRejected {
                limit,
                quota,
                path,
                retry_after,
            } => {
                tracing::warn!(%limit, quota, %path, retry_after, "rate limit exceeded");
                let header_limit = limit.replace("per", "/").replace(' ', "");
                let mut response = json_error(
                    StatusCode::TOO_MANY_REQUESTS,
                    RATE_LIMITED,
                    "Too many requests. Please try again later.",
                    json!({ "limit": limit, "endpoint": path, "retry_after": retry_after }),
                );
                let headers = response.headers_mut();
                headers.insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
                if let Ok(v) = HeaderValue::from_str(&header_limit) {
                    headers.insert("x-ratelimit-limit", v);
                }
                headers.insert("x-ratelimit-remaining", HeaderValue::from_static("0"));
                response
            }
            HotelError::Unclassified(detail) => {
                tracing::error!(severity = "critical", %detail, "unhandled failure");
                json_error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    INTERNAL,
                    "An unexpected error occurred",
                    json!({}),
                )
            }
        }
    }
}

/// Build the envelope for any status.
pub fn json_error(
    status: StatusCode,
    error: &'static str,
    message: impl Into<String>,
    details: Value,
) -> Response {
    (
        status,
        axum::Json(json!({
            "error": error,
            "message": message.into(),
            "details": details,
        })),
    )
        .into_response()
}

/// `CatchPanicLayer` hook: a panicking handler becomes an unclassified failure.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "handler panicked".to_string()
    };
    ApiError(HotelError::Unclassified(detail)).into_response()
}

/// Fallback for unmatched routes.
pub async fn route_not_found(uri: axum::http::Uri) -> Response {
    json_error(
        StatusCode::NOT_FOUND,
        NOT_FOUND,
        "The requested resource does not exist",
        json!({ "path": uri.path() }),
    )
}

/// Fallback for a known path called with a method it does not serve.
pub async fn method_not_allowed(method: axum::http::Method, uri: axum::http::Uri) -> Response {
    tracing::warn!(%method, path = uri.path(), "method not allowed");
    json_error(
        StatusCode::METHOD_NOT_ALLOWED,
        METHOD_NOT_ALLOWED,
        format!("Method {method} is not allowed on this resource"),
        json!({ "path": uri.path(), "method": method.as_str() }),
    )
}
