//! Server-Sent Events frame writer.
//!
//! Every outbound message becomes one SSE frame:
//!
//! ```text
//! event: message
//! id: <event id, when resumability is enabled>
//! data: {"jsonrpc":"2.0",...}
//!
//! ```
//!
//! Frames are UTF-8 and terminated by a blank line. The JSON payload never
//! contains a raw newline, so a single `data:` field always suffices.

use bytes::Bytes;
use rillmcp_protocol::JsonRpcMessage;
use tokio::sync::mpsc;

use crate::error::{TransportError, TransportResult};

/// Encode one message as an SSE frame.
pub fn encode_frame(event_id: Option<&str>, message: &JsonRpcMessage) -> TransportResult<Bytes> {
    let data = serde_json::to_string(message)?;
    let mut frame = String::with_capacity(data.len() + 48);
    frame.push_str("event: message\n");
    if let Some(id) = event_id {
        frame.push_str("id: ");
        frame.push_str(id);
        frame.push('\n');
    }
    frame.push_str("data: ");
    frame.push_str(&data);
    frame.push_str("\n\n");
    Ok(Bytes::from(frame))
}

/// Write half of one SSE stream.
///
/// Encodes messages and enqueues the frames into the stream's body channel.
/// Dropping every clone of a sender closes the stream.
#[derive(Clone, Debug)]
pub struct FrameSender {
    tx: mpsc::UnboundedSender<Bytes>,
}

impl FrameSender {
    /// Create a connected sender/receiver pair for a new SSE body.
    pub(crate) fn channel() -> (Self, mpsc::UnboundedReceiver<Bytes>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Encode `message` and enqueue the frame.
    ///
    /// Fails with [`TransportError::StreamClosed`] when the consumer is gone.
    pub fn write(&self, event_id: Option<&str>, message: &JsonRpcMessage) -> TransportResult<()> {
        let frame = encode_frame(event_id, message)?;
        self.tx.send(frame).map_err(|_| TransportError::StreamClosed)
    }

    /// Whether the consumer side has been dropped.
    pub(crate) fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
