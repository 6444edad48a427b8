//! Session identity and request validation.
//!
//! A stateful transport binds itself to one session: the id assigned on the
//! single permitted `initialize` POST. Every later request must present that
//! id in the `Mcp-Session-Id` header. A stateless transport skips all of
//! this.

use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use rillmcp_protocol::JsonRpcErrorCode;
use uuid::Uuid;

use crate::server::error_response;

/// Header carrying the session identifier.
pub const MCP_SESSION_ID_HEADER: &str = "mcp-session-id";

/// Default session id generator: a random UUID v4.
pub fn random_session_id() -> String {
    Uuid::new_v4().to_string()
}

/// Snapshot of the transport's session state, taken under the state lock.
#[derive(Debug, Clone, Default)]
pub(crate) struct SessionSnapshot {
    pub(crate) stateful: bool,
    pub(crate) initialized: bool,
    pub(crate) session_id: Option<String>,
}

/// Validate an incoming request against the current session state.
///
/// Pure: the outcome depends only on the request headers and the snapshot.
/// Rules are evaluated in order; the first failure yields the concrete HTTP
/// error response.
pub(crate) fn validate_session(
    headers: &HeaderMap,
    session: &SessionSnapshot,
) -> Result<(), Response> {
    if !session.stateful {
        return Ok(());
    }
    if !session.initialized {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            JsonRpcErrorCode::Transport,
            "Server not initialized",
            None,
        ));
    }
    let Some(header) = headers
        .get(MCP_SESSION_ID_HEADER)
        .and_then(|value| value.to_str().ok())
    else {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            JsonRpcErrorCode::Transport,
            "Mcp-Session-Id header is required",
            None,
        ));
    };
    if session.session_id.as_deref() != Some(header) {
        return Err(error_response(
            StatusCode::NOT_FOUND,
            JsonRpcErrorCode::SessionNotFound,
            "Session not found",
            None,
        ));
    }
    Ok(())
}
