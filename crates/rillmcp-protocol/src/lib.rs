//! # rillmcp-protocol
//!
//! JSON-RPC 2.0 message model for the Model Context Protocol.
//!
//! This crate holds the wire types shared by MCP transports: requests,
//! responses, notifications, the untagged [`JsonRpcMessage`] union, and the
//! standard error codes. It is deliberately small; everything
//! transport-specific (framing, sessions, streams) lives in
//! `rillmcp-transport`.

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub,
    clippy::all
)]
#![deny(unsafe_code)]

pub mod jsonrpc;
pub mod types;

pub use jsonrpc::{
    JSONRPC_VERSION, JsonRpcError, JsonRpcErrorCode, JsonRpcMessage, JsonRpcNotification,
    JsonRpcRequest, JsonRpcResponse, JsonRpcResponsePayload, JsonRpcVersion, ResponseId,
};
pub use types::RequestId;

/// Method name of the request that opens an MCP session.
pub const METHOD_INITIALIZE: &str = "initialize";
