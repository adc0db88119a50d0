//! HTTP API: router, middleware, request/response mapping and error translation.

pub mod app;
pub mod context;
pub mod middleware;
