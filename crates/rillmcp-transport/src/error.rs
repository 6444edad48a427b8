//! Transport error types.

use rillmcp_protocol::RequestId;
use thiserror::Error;

/// Result type for transport operations.
pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// Errors surfaced by the Streamable HTTP transport.
///
/// Protocol gate failures (bad Accept header, oversized body, unknown
/// session) never appear here; those are recovered into HTTP error
/// responses. This enum covers the dispatch errors `send` propagates to its
/// caller and the I/O failures reported through the error callback.
#[derive(Debug, Error)]
pub enum TransportError {
    /// `start` was called on a transport that is already started.
    #[error("Transport already started")]
    AlreadyStarted,

    /// `send` could not correlate the message with any open stream.
    #[error("No stream found for request ID: {0}")]
    NoStreamForRequest(RequestId),

    /// A response was sent without a request id to correlate it.
    #[error("Cannot send a response on a standalone SSE stream unless resuming a previous client request")]
    ResponseOnStandaloneStream,

    /// The SSE consumer went away while a frame was being enqueued.
    #[error("SSE stream closed by consumer")]
    StreamClosed,

    /// A message could not be encoded as JSON.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The event store failed to append or replay.
    #[error("event store: {0}")]
    EventStore(String),
}
