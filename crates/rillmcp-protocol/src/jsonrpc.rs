//! JSON-RPC 2.0 message types.
//!
//! The transport works with [`JsonRpcMessage`], an untagged union of
//! request, response, and notification. Deserialization discriminates by
//! shape: requests carry `method` and `id`, notifications carry `method`
//! without `id`, responses carry `result` or `error`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

use crate::types::RequestId;

/// JSON-RPC version constant.
pub const JSONRPC_VERSION: &str = "2.0";

/// JSON-RPC version marker.
///
/// Serializes as the literal `"2.0"` and rejects anything else on
/// deserialization, so an accepted message is known to be well-versioned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JsonRpcVersion;

impl Serialize for JsonRpcVersion {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(JSONRPC_VERSION)
    }
}

impl<'de> Deserialize<'de> for JsonRpcVersion {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let version = String::deserialize(deserializer)?;
        if version == JSONRPC_VERSION {
            Ok(JsonRpcVersion)
        } else {
            Err(serde::de::Error::custom(format!(
                "invalid JSON-RPC version: expected '{JSONRPC_VERSION}', got '{version}'"
            )))
        }
    }
}

/// JSON-RPC request message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// JSON-RPC version.
    pub jsonrpc: JsonRpcVersion,
    /// Request method name.
    pub method: String,
    /// Request parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    /// Request identifier.
    pub id: RequestId,
}

impl JsonRpcRequest {
    /// Create a new request.
    pub fn new(method: impl Into<String>, params: Option<Value>, id: impl Into<RequestId>) -> Self {
        Self {
            jsonrpc: JsonRpcVersion,
            method: method.into(),
            params,
            id: id.into(),
        }
    }

    /// Whether this is the session-opening `initialize` request.
    pub fn is_initialize(&self) -> bool {
        self.method == crate::METHOD_INITIALIZE
    }
}

/// JSON-RPC notification message (no response expected).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcNotification {
    /// JSON-RPC version.
    pub jsonrpc: JsonRpcVersion,
    /// Notification method name.
    pub method: String,
    /// Notification parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcNotification {
    /// Create a new notification.
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JsonRpcVersion,
            method: method.into(),
            params,
        }
    }
}

/// JSON-RPC response payload, either a result or an error but never both.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JsonRpcResponsePayload {
    /// Successful response.
    Success {
        /// Response result.
        result: Value,
    },
    /// Error response.
    Error {
        /// Response error.
        error: JsonRpcError,
    },
}

/// Response identifier, which is `null` for errors that could not be
/// correlated with a request (e.g. parse errors).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResponseId(pub Option<RequestId>);

impl ResponseId {
    /// Response id for a normal response.
    pub fn from_request(id: RequestId) -> Self {
        Self(Some(id))
    }

    /// Null response id.
    pub fn null() -> Self {
        Self(None)
    }

    /// The request id this response answers, if any.
    pub fn as_request_id(&self) -> Option<&RequestId> {
        self.0.as_ref()
    }
}

/// JSON-RPC response message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// JSON-RPC version.
    pub jsonrpc: JsonRpcVersion,
    /// Result or error.
    #[serde(flatten)]
    pub payload: JsonRpcResponsePayload,
    /// Identifier of the request this answers.
    pub id: ResponseId,
}

impl JsonRpcResponse {
    /// Create a successful response.
    pub fn success(result: Value, id: impl Into<RequestId>) -> Self {
        Self {
            jsonrpc: JsonRpcVersion,
            payload: JsonRpcResponsePayload::Success { result },
            id: ResponseId::from_request(id.into()),
        }
    }

    /// Create an error response answering `id`.
    pub fn error(error: JsonRpcError, id: impl Into<RequestId>) -> Self {
        Self {
            jsonrpc: JsonRpcVersion,
            payload: JsonRpcResponsePayload::Error { error },
            id: ResponseId::from_request(id.into()),
        }
    }

    /// Whether this response carries an error.
    pub fn is_error(&self) -> bool {
        matches!(self.payload, JsonRpcResponsePayload::Error { .. })
    }

    /// The result value, if this is a success response.
    pub fn result(&self) -> Option<&Value> {
        match &self.payload {
            JsonRpcResponsePayload::Success { result } => Some(result),
            JsonRpcResponsePayload::Error { .. } => None,
        }
    }
}

/// JSON-RPC error object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// Error code.
    pub code: i32,
    /// Error message.
    pub message: String,
    /// Additional error data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    /// Create a new error.
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Create a new error with additional data.
    pub fn with_data(code: i32, message: impl Into<String>, data: Value) -> Self {
        Self {
            code,
            message: message.into(),
            data: Some(data),
        }
    }
}

/// Standard JSON-RPC and MCP transport error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonRpcErrorCode {
    /// Parse error (−32700).
    ParseError,
    /// Invalid request (−32600).
    InvalidRequest,
    /// Method not found (−32601).
    MethodNotFound,
    /// Invalid params (−32602).
    InvalidParams,
    /// Internal error (−32603).
    InternalError,
    /// Generic transport-level error (−32000).
    Transport,
    /// Session not found (−32001).
    SessionNotFound,
    /// Application-defined error.
    Application(i32),
}

impl JsonRpcErrorCode {
    /// The numeric error code.
    pub fn code(self) -> i32 {
        match self {
            Self::ParseError => -32700,
            Self::InvalidRequest => -32600,
            Self::MethodNotFound => -32601,
            Self::InvalidParams => -32602,
            Self::InternalError => -32603,
            Self::Transport => -32000,
            Self::SessionNotFound => -32001,
            Self::Application(code) => code,
        }
    }
}

impl fmt::Display for JsonRpcErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// JSON-RPC message: request, response, or notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JsonRpcMessage {
    /// Request message.
    Request(JsonRpcRequest),
    /// Response message.
    Response(JsonRpcResponse),
    /// Notification message.
    Notification(JsonRpcNotification),
}

impl JsonRpcMessage {
    /// Whether this message is a request (expects a response).
    pub fn is_request(&self) -> bool {
        matches!(self, Self::Request(_))
    }

    /// Whether this message is a response (success or error).
    pub fn is_response(&self) -> bool {
        matches!(self, Self::Response(_))
    }

    /// Whether this message is a notification.
    pub fn is_notification(&self) -> bool {
        matches!(self, Self::Notification(_))
    }

    /// For responses, the id of the request being answered.
    pub fn response_request_id(&self) -> Option<&RequestId> {
        match self {
            Self::Response(resp) => resp.id.as_request_id(),
            _ => None,
        }
    }

    /// The request id carried by this message, if it is a request.
    pub fn request_id(&self) -> Option<&RequestId> {
        match self {
            Self::Request(req) => Some(&req.id),
            _ => None,
        }
    }

    /// Whether this message is the `initialize` request.
    pub fn is_initialize_request(&self) -> bool {
        matches!(self, Self::Request(req) if req.is_initialize())
    }
}

impl From<JsonRpcRequest> for JsonRpcMessage {
    fn from(req: JsonRpcRequest) -> Self {
        Self::Request(req)
    }
}

impl From<JsonRpcResponse> for JsonRpcMessage {
    fn from(resp: JsonRpcResponse) -> Self {
        Self::Response(resp)
    }
}

impl From<JsonRpcNotification> for JsonRpcMessage {
    fn from(notif: JsonRpcNotification) -> Self {
        Self::Notification(notif)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_roundtrip() {
        let req = JsonRpcRequest::new("tools/list", Some(json!({"cursor": null})), 1);
        let text = serde_json::to_string(&req).unwrap();
        assert!(text.contains("\"jsonrpc\":\"2.0\""));
        assert!(text.contains("\"method\":\"tools/list\""));

        let back: JsonRpcRequest = serde_json::from_str(&text).unwrap();
        assert_eq!(back.method, "tools/list");
        assert_eq!(back.id, RequestId::Number(1));
    }

    #[test]
    fn version_rejected_when_wrong() {
        let err = serde_json::from_value::<JsonRpcRequest>(json!({
            "jsonrpc": "1.0",
            "method": "ping",
            "id": 1
        }))
        .unwrap_err();
        assert!(err.to_string().contains("invalid JSON-RPC version"));
    }

    #[test]
    fn message_discrimination() {
        let req: JsonRpcMessage =
            serde_json::from_value(json!({"jsonrpc": "2.0", "method": "ping", "id": 1})).unwrap();
        assert!(req.is_request());

        let notif: JsonRpcMessage =
            serde_json::from_value(json!({"jsonrpc": "2.0", "method": "ping"})).unwrap();
        assert!(notif.is_notification());

        let resp: JsonRpcMessage =
            serde_json::from_value(json!({"jsonrpc": "2.0", "result": {}, "id": 1})).unwrap();
        assert!(resp.is_response());
        assert_eq!(resp.response_request_id(), Some(&RequestId::Number(1)));

        let err: JsonRpcMessage = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "error": {"code": -32601, "message": "Method not found"},
            "id": "r1"
        }))
        .unwrap();
        assert!(err.is_response());
    }

    #[test]
    fn response_payload_is_exclusive() {
        let ok = JsonRpcResponse::success(json!({"ok": true}), 5);
        let text = serde_json::to_string(&ok).unwrap();
        assert!(text.contains("\"result\""));
        assert!(!text.contains("\"error\""));

        let failed = JsonRpcResponse::error(JsonRpcError::new(-32000, "boom"), 5);
        let text = serde_json::to_string(&failed).unwrap();
        assert!(text.contains("\"error\""));
        assert!(!text.contains("\"result\""));
        assert!(failed.is_error());
    }

    #[test]
    fn null_response_id() {
        let resp = JsonRpcResponse {
            jsonrpc: JsonRpcVersion,
            payload: JsonRpcResponsePayload::Error {
                error: JsonRpcError::new(JsonRpcErrorCode::ParseError.code(), "Parse error"),
            },
            id: ResponseId::null(),
        };
        let text = serde_json::to_string(&resp).unwrap();
        assert!(text.contains("\"id\":null"));
    }

    #[test]
    fn initialize_predicate() {
        let init: JsonRpcMessage = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "method": "initialize",
            "params": {},
            "id": 1
        }))
        .unwrap();
        assert!(init.is_initialize_request());

        let other: JsonRpcMessage =
            serde_json::from_value(json!({"jsonrpc": "2.0", "method": "initialized"})).unwrap();
        assert!(!other.is_initialize_request());
    }

    #[test]
    fn error_codes() {
        assert_eq!(JsonRpcErrorCode::ParseError.code(), -32700);
        assert_eq!(JsonRpcErrorCode::InvalidRequest.code(), -32600);
        assert_eq!(JsonRpcErrorCode::Transport.code(), -32000);
        assert_eq!(JsonRpcErrorCode::SessionNotFound.code(), -32001);
        assert_eq!(JsonRpcErrorCode::Application(-32099).code(), -32099);
    }
}
