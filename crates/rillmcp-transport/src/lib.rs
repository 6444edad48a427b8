//! # rillmcp-transport
//!
//! Server-side Streamable HTTP transport for the Model Context Protocol.
//!
//! One HTTP endpoint multiplexes three methods: POST for client→server
//! JSON-RPC messages, GET for the server-initiated push stream, DELETE for
//! session teardown. Responses to client requests are delivered either as
//! Server-Sent Events (the default) or as a single batched JSON body, and an
//! optional [`EventStore`] makes dropped SSE connections resumable via
//! `Last-Event-Id`.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use rillmcp_transport::{StreamableHttpConfig, StreamableHttpServerTransport, create_router};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = StreamableHttpConfig::builder().stateful().build();
//!     let transport = StreamableHttpServerTransport::new(config);
//!     transport.start()?;
//!
//!     // Answer every inbound request through `send`.
//!     let responder = transport.clone();
//!     transport.set_on_message(move |message, _extra| {
//!         if let Some(id) = message.request_id().cloned() {
//!             let responder = responder.clone();
//!             tokio::spawn(async move {
//!                 let response = rillmcp_protocol::JsonRpcResponse::success(
//!                     serde_json::json!({}),
//!                     id,
//!                 );
//!                 let _ = responder.send(response.into()).await;
//!             });
//!         }
//!     });
//!
//!     let app = create_router("/mcp", transport);
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub,
    clippy::all
)]
#![deny(unsafe_code)]

pub mod axum;
pub mod config;
pub mod error;
pub mod event_store;
pub mod server;
pub mod session;
pub mod sse;

pub use self::axum::create_router;
pub use self::config::{
    SessionIdGenerator, SessionInitializedCallback, StreamableHttpConfig,
    StreamableHttpConfigBuilder,
};
pub use self::error::{TransportError, TransportResult};
pub use self::event_store::{EventStore, InMemoryEventStore, ReplaySink};
pub use self::server::{
    AuthInfo, CloseCallback, ErrorCallback, MAXIMUM_MESSAGE_SIZE, MessageCallback, MessageExtra,
    StreamableHttpServerTransport,
};
pub use self::session::{MCP_SESSION_ID_HEADER, random_session_id};
pub use self::sse::{FrameSender, encode_frame};
