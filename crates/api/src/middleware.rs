use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderValue,
    middleware::{Next, from_fn_with_state},
    response::Response,
    routing::MethodRouter,
};
use tracing::Instrument;

use hotelier_core::HotelError;
use hotelier_infra::{Decision, Identity, RateAdmission, RouteClass};

use crate::app::errors::ApiError;
use crate::context::RequestContext;

pub const REQUEST_ID_HEADER: &str = "x-request-id";
pub const LIMIT_HEADER: &str = "x-ratelimit-limit";
pub const REMAINING_HEADER: &str = "x-ratelimit-remaining";

/// Outermost middleware: assigns a request id, resolves the client address and runs the
/// rest of the stack inside the `http.request` span.
pub async fn request_context(mut req: Request, next: Next) -> Response {
    let ctx = RequestContext::new(hotelier_observability::new_request_id(), connect_ip(&req));
    let span = hotelier_observability::request_span(
        req.method().as_str(),
        req.uri().path(),
        &ctx.client_label(),
        ctx.request_id(),
    );
    req.extensions_mut().insert(ctx.clone());

    let mut response = next.run(req).instrument(span.clone()).await;

    span.record("status", response.status().as_u16());
    if let Ok(value) = HeaderValue::from_str(ctx.request_id()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

#[derive(Clone)]
pub struct AdmissionState {
    pub admission: Arc<RateAdmission>,
    pub class: RouteClass,
}

/// Per-route admission check. Runs before the handler; a rejected request never reaches it.
pub async fn admit(State(state): State<AdmissionState>, req: Request, next: Next) -> Result<Response, ApiError> {
    let origin = req
        .extensions()
        .get::<RequestContext>()
        .and_then(RequestContext::client)
        .or_else(|| connect_ip(&req));
    let identity = state.admission.resolve_identity(origin);

    match state.admission.admit(&identity, state.class) {
        Decision::Reject { limit, retry_after } => Err(ApiError(HotelError::AdmissionRejected {
            limit: state.admission.limit(state.class).to_string(),
            quota: limit,
            path: req.uri().path().to_string(),
            retry_after: retry_after.as_secs(),
        })),
        Decision::Admit { remaining, .. } => {
            let mut response = next.run(req).await;
            if state.admission.is_enabled() && identity != Identity::Exempt {
                let headers = response.headers_mut();
                if let Ok(value) = HeaderValue::from_str(&state.admission.limit(state.class).header_value()) {
                    headers.insert(LIMIT_HEADER, value);
                }
                headers.insert(REMAINING_HEADER, HeaderValue::from(remaining));
            }
            Ok(response)
        }
    }
}

/// Put `route` behind the admission controller under `class`.
pub fn gated(route: MethodRouter, admission: &Arc<RateAdmission>, class: RouteClass) -> MethodRouter {
    route.route_layer(from_fn_with_state(
        AdmissionState {
            admission: admission.clone(),
            class,
        },
        admit,
    ))
}

fn connect_ip(req: &Request) -> Option<IpAddr> {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
}
