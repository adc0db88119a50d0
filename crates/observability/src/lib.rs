//! `hotelier-observability`: JSON logging for the hotel API.
//!
//! The binary calls [`init`] once at startup. The API's request-context middleware opens a
//! [`request_span`] per request, tagged with a [`new_request_id`], so every log event a
//! handler or the error translator emits carries the method, path, client and request id.

pub mod tracing;

pub use self::tracing::{DEFAULT_FILTER, new_request_id, request_span};

/// Install the process-wide subscriber. Later calls keep the first one.
pub fn init() {
    tracing::init();
}
