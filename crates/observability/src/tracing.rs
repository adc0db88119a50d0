//! Tracing/logging initialization.
//!
//! JSON logs with timestamps, filtered through `RUST_LOG`.

use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Default filter when `RUST_LOG` is unset: quiet the driver, keep the service at info.
pub const DEFAULT_FILTER: &str = "info,sqlx=warn";

/// Initialize tracing/logging for the process.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_current_span(true)
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .try_init();
}

/// Time-ordered request id (UUIDv7).
pub fn new_request_id() -> String {
    Uuid::now_v7().to_string()
}

/// Span wrapping one inbound HTTP request. Events logged while handling the request
/// inherit these fields.
pub fn request_span(method: &str, path: &str, client: &str, request_id: &str) -> ::tracing::Span {
    ::tracing::info_span!(
        "http.request",
        method = %method,
        path = %path,
        client = %client,
        request_id = %request_id,
        status = ::tracing::field::Empty,
    )
}
