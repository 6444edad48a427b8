//! Axum wiring for the single MCP endpoint.

use axum::Router;
use axum::extract::{Request, State};
use axum::response::Response;
use axum::routing::any;

use crate::server::StreamableHttpServerTransport;

/// Build a router exposing `transport` at `path`.
///
/// All methods are routed through the transport, which answers unsupported
/// ones with 405 itself. Host middleware may attach an
/// [`AuthInfo`](crate::server::AuthInfo) request extension; it is passed
/// through to the message callback.
pub fn create_router(path: &str, transport: StreamableHttpServerTransport) -> Router {
    Router::new()
        .route(path, any(endpoint))
        .with_state(transport)
}

async fn endpoint(
    State(transport): State<StreamableHttpServerTransport>,
    request: Request,
) -> Response {
    transport.handle_request(request).await
}
