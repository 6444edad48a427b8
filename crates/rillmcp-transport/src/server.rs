//! Streamable HTTP server transport.
//!
//! One HTTP endpoint multiplexes three methods:
//!
//! - **POST** carries client→server JSON-RPC messages. Payloads with at
//!   least one request open a response stream (SSE by default, a pending
//!   batched JSON response when [`json_response`] is enabled);
//!   notification/response-only payloads are acknowledged with 202.
//! - **GET** opens the standalone SSE stream used for server-initiated
//!   messages, or resumes a dropped connection when `Last-Event-Id` is
//!   present and an event store is configured.
//! - **DELETE** tears the session down.
//!
//! The transport owns the correlation state between in-flight requests and
//! the streams their responses must be delivered on. [`send`] consults that
//! state to pick the right sink; once every request correlated with a stream
//! has its terminal response, the stream completes (SSE body closes, or the
//! pending JSON response resolves) and all bookkeeping for it is dropped.
//!
//! Dispatch of inbound messages to the message callback is deliberately
//! deferred past a scheduler yield, so the caller of [`handle_request`]
//! holds the response (and its live body) before the first callback can
//! trigger a `send` against the new stream. This is a contract, not an
//! implementation detail: without it a synchronous callback could write to a
//! stream the HTTP runtime has not seen yet.
//!
//! [`json_response`]: crate::config::StreamableHttpConfigBuilder::json_response
//! [`send`]: StreamableHttpServerTransport::send
//! [`handle_request`]: StreamableHttpServerTransport::handle_request

use std::collections::HashMap;
use std::convert::Infallible;
use std::fmt;
use std::pin::Pin;
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};

use axum::body::{Body, Bytes};
use axum::extract::Request;
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode, header, response};
use axum::response::Response;
use futures::Stream;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};
use uuid::Uuid;

use rillmcp_protocol::{
    JSONRPC_VERSION, JsonRpcError, JsonRpcErrorCode, JsonRpcMessage, RequestId,
};

use crate::config::StreamableHttpConfig;
use crate::error::{TransportError, TransportResult};
use crate::event_store::{EventStore, ReplaySink};
use crate::session::{MCP_SESSION_ID_HEADER, SessionSnapshot, validate_session};
use crate::sse::FrameSender;

/// Maximum accepted POST body size: 4 MiB.
pub const MAXIMUM_MESSAGE_SIZE: usize = 4 * 1024 * 1024;

/// Reserved stream id for the standalone GET SSE stream.
pub(crate) const STANDALONE_STREAM_ID: &str = "_GET_stream";

/// Callback receiving each inbound JSON-RPC message after all gates pass.
pub type MessageCallback = Arc<dyn Fn(JsonRpcMessage, MessageExtra) + Send + Sync>;

/// Callback receiving frame-write and replay failures.
pub type ErrorCallback = Arc<dyn Fn(TransportError) + Send + Sync>;

/// Callback invoked once when the transport closes.
pub type CloseCallback = Arc<dyn Fn() + Send + Sync>;

/// Opaque authentication payload.
///
/// Host middleware may attach one to the request (as an extension); the
/// transport passes it through to the message callback untouched.
#[derive(Debug, Clone)]
pub struct AuthInfo(pub Value);

/// Per-message metadata handed to the message callback.
#[derive(Debug, Clone, Default)]
pub struct MessageExtra {
    /// Authentication payload attached to the HTTP request, if any.
    pub auth_info: Option<AuthInfo>,
}

/// Server-side Streamable HTTP transport.
///
/// Cheap to clone; clones share all state. A single instance is typically
/// bound to one logical session.
#[derive(Clone)]
pub struct StreamableHttpServerTransport {
    inner: Arc<Inner>,
}

struct Inner {
    config: StreamableHttpConfig,
    state: Mutex<MuxState>,
    callbacks: RwLock<Callbacks>,
}

#[derive(Default)]
struct Callbacks {
    on_message: Option<MessageCallback>,
    on_error: Option<ErrorCallback>,
    on_close: Option<CloseCallback>,
}

#[derive(Default)]
struct MuxState {
    started: bool,
    initialized: bool,
    session_id: Option<String>,
    /// One entry per open stream: the requests correlated with it plus its
    /// response sink. A known stream whose SSE controller is gone means the
    /// consumer canceled; writes are elided but bookkeeping continues.
    streams: HashMap<String, StreamEntry>,
    /// Reverse index: request id → owning stream id.
    request_index: HashMap<RequestId, String>,
    /// Terminal responses received so far, keyed by request id. Drained when
    /// their stream completes.
    response_buffer: HashMap<RequestId, JsonRpcMessage>,
}

struct StreamEntry {
    /// Request ids correlated with this stream, in payload order. Empty for
    /// the standalone stream and for resumed streams, which by construction
    /// can never carry responses to earlier client requests.
    request_ids: Vec<RequestId>,
    sink: StreamSink,
}

enum StreamSink {
    Sse(Option<FrameSender>),
    Json(Option<oneshot::Sender<Response>>),
}

impl StreamEntry {
    fn controller(&self) -> Option<FrameSender> {
        match &self.sink {
            StreamSink::Sse(Some(sender)) => Some(sender.clone()),
            _ => None,
        }
    }
}

impl StreamableHttpServerTransport {
    /// Create a transport with the given configuration.
    pub fn new(config: StreamableHttpConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                state: Mutex::new(MuxState::default()),
                callbacks: RwLock::new(Callbacks::default()),
            }),
        }
    }

    /// Mark the transport started. Performs no I/O; connections are
    /// per-request. Fails on a second call.
    pub fn start(&self) -> TransportResult<()> {
        let mut state = self.inner.state.lock();
        if state.started {
            return Err(TransportError::AlreadyStarted);
        }
        state.started = true;
        Ok(())
    }

    /// The session id assigned on `initialize`, if any.
    pub fn session_id(&self) -> Option<String> {
        self.inner.state.lock().session_id.clone()
    }

    /// Whether an `initialize` request has been accepted.
    pub fn is_initialized(&self) -> bool {
        self.inner.state.lock().initialized
    }

    /// Number of registered streams (request-bound, standalone, resumed).
    pub fn active_streams(&self) -> usize {
        self.inner.state.lock().streams.len()
    }

    /// Number of requests still waiting for a terminal response.
    pub fn pending_requests(&self) -> usize {
        self.inner.state.lock().request_index.len()
    }

    /// Install the inbound-message callback.
    pub fn set_on_message(&self, callback: impl Fn(JsonRpcMessage, MessageExtra) + Send + Sync + 'static) {
        self.inner.callbacks.write().on_message = Some(Arc::new(callback));
    }

    /// Install the error callback (frame-write and replay failures).
    pub fn set_on_error(&self, callback: impl Fn(TransportError) + Send + Sync + 'static) {
        self.inner.callbacks.write().on_error = Some(Arc::new(callback));
    }

    /// Install the close callback.
    pub fn set_on_close(&self, callback: impl Fn() + Send + Sync + 'static) {
        self.inner.callbacks.write().on_close = Some(Arc::new(callback));
    }

    /// Handle one HTTP request against the MCP endpoint.
    ///
    /// Returns immediately for JSON-mode-less errors and acknowledgements;
    /// returns a response whose body is a live SSE stream for streaming
    /// paths; in JSON mode, resolves once every request in the payload has
    /// been answered via [`send`](Self::send).
    pub async fn handle_request(&self, request: Request) -> Response {
        let (parts, body) = request.into_parts();
        let auth_info = parts.extensions.get::<AuthInfo>().cloned();
        match parts.method {
            Method::POST => self.handle_post(&parts.headers, body, auth_info).await,
            Method::GET => self.handle_get(&parts.headers),
            Method::DELETE => self.handle_delete(&parts.headers),
            _ => method_not_allowed(),
        }
    }

    /// Send an outbound message not tied to a client request.
    ///
    /// Server-initiated requests and notifications go to the standalone GET
    /// stream; if no such stream is open the message is dropped. Sending a
    /// response here is an error.
    pub async fn send(&self, message: JsonRpcMessage) -> TransportResult<()> {
        self.send_related(message, None).await
    }

    /// Send an outbound message, optionally correlated with a client request.
    ///
    /// Responses are routed by their own id; requests and notifications by
    /// `related_request_id`. With no id at all the message targets the
    /// standalone stream.
    pub async fn send_related(
        &self,
        message: JsonRpcMessage,
        related_request_id: Option<RequestId>,
    ) -> TransportResult<()> {
        let request_id = match &message {
            JsonRpcMessage::Response(resp) => resp.id.as_request_id().cloned(),
            _ => related_request_id,
        };
        match request_id {
            Some(request_id) => self.send_to_request_stream(message, request_id).await,
            None => self.send_to_standalone_stream(message).await,
        }
    }

    /// Close every stream, drop all correlation state, and fire the close
    /// callback. Tolerates streams whose consumers are already gone.
    pub fn close(&self) {
        let dropped: Vec<StreamEntry> = {
            let mut state = self.inner.state.lock();
            state.session_id = None;
            state.request_index.clear();
            state.response_buffer.clear();
            state.streams.drain().map(|(_, entry)| entry).collect()
        };
        // Dropping the sinks ends every SSE body and wakes pending JSON
        // waiters with an error.
        drop(dropped);
        let callback = self.inner.callbacks.read().on_close.clone();
        if let Some(callback) = callback {
            callback();
        }
    }

    // ------------------------------------------------------------------
    // POST
    // ------------------------------------------------------------------

    async fn handle_post(
        &self,
        headers: &HeaderMap,
        body: Body,
        auth_info: Option<AuthInfo>,
    ) -> Response {
        if !accept_includes(headers, "application/json")
            || !accept_includes(headers, "text/event-stream")
        {
            return error_response(
                StatusCode::NOT_ACCEPTABLE,
                JsonRpcErrorCode::Transport,
                "Not Acceptable: Client must accept both application/json and text/event-stream",
                None,
            );
        }
        if !content_type_is_json(headers) {
            return error_response(
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                JsonRpcErrorCode::Transport,
                "Unsupported Media Type: Content-Type must be application/json",
                None,
            );
        }
        let bytes = match axum::body::to_bytes(body, MAXIMUM_MESSAGE_SIZE).await {
            Ok(bytes) => bytes,
            Err(_) => {
                return error_response(
                    StatusCode::PAYLOAD_TOO_LARGE,
                    JsonRpcErrorCode::Transport,
                    "Payload Too Large: request body exceeds the 4 MiB limit",
                    None,
                );
            }
        };
        let raw: Value = match serde_json::from_slice(&bytes) {
            Ok(value) => value,
            Err(err) => return parse_error_response(&err.to_string()),
        };
        let raw_items = match raw {
            Value::Array(items) => items,
            single => vec![single],
        };
        let mut messages = Vec::with_capacity(raw_items.len());
        for item in raw_items {
            match serde_json::from_value::<JsonRpcMessage>(item) {
                Ok(message) => messages.push(message),
                Err(err) => return parse_error_response(&err.to_string()),
            }
        }

        if messages.iter().any(JsonRpcMessage::is_initialize_request) {
            // The only payload on which a session id may be assigned.
            if messages.len() > 1 {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    JsonRpcErrorCode::InvalidRequest,
                    "Only one initialization request is allowed",
                    None,
                );
            }
            if let Err(response) = self.initialize_session() {
                return *response;
            }
        } else if let Err(response) = self.check_session(headers) {
            return response;
        }

        let extra = MessageExtra { auth_info };
        let request_ids: Vec<RequestId> = messages
            .iter()
            .filter_map(|message| message.request_id().cloned())
            .collect();

        if request_ids.is_empty() {
            // Notifications and responses only: nothing to correlate.
            for message in &messages {
                self.inner.dispatch(message.clone(), extra.clone());
            }
            return empty_response(StatusCode::ACCEPTED);
        }

        let stream_id = Uuid::new_v4().to_string();
        if self.inner.config.enable_json_response {
            let (resolver, pending) = oneshot::channel();
            self.register_stream(&stream_id, request_ids, StreamSink::Json(Some(resolver)));
            self.spawn_dispatch(stream_id, messages, extra);
            match pending.await {
                Ok(response) => response,
                Err(_) => error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    JsonRpcErrorCode::InternalError,
                    "Internal error: transport closed before responding",
                    None,
                ),
            }
        } else {
            let (sender, frames) = FrameSender::channel();
            let session_id =
                self.register_stream(&stream_id, request_ids, StreamSink::Sse(Some(sender)));
            let guard = CancelGuard::bound(&self.inner, stream_id.clone());
            self.spawn_dispatch(stream_id, messages, extra);
            sse_response(frames, guard, session_id)
        }
    }

    fn initialize_session(&self) -> Result<(), Box<Response>> {
        let stateful = self.inner.config.is_stateful();
        let session_id = {
            let mut state = self.inner.state.lock();
            if state.initialized && stateful {
                return Err(Box::new(error_response(
                    StatusCode::BAD_REQUEST,
                    JsonRpcErrorCode::InvalidRequest,
                    "Server already initialized",
                    None,
                )));
            }
            state.session_id = self
                .inner
                .config
                .session_id_generator
                .as_ref()
                .map(|generate| generate());
            state.initialized = true;
            state.session_id.clone()
        };
        if let (Some(callback), Some(id)) =
            (&self.inner.config.on_session_initialized, &session_id)
        {
            callback(id);
        }
        Ok(())
    }

    fn check_session(&self, headers: &HeaderMap) -> Result<(), Response> {
        let snapshot = {
            let state = self.inner.state.lock();
            SessionSnapshot {
                stateful: self.inner.config.is_stateful(),
                initialized: state.initialized,
                session_id: state.session_id.clone(),
            }
        };
        validate_session(headers, &snapshot)
    }

    /// Register a new stream and index its requests. Returns the current
    /// session id for response headers.
    fn register_stream(
        &self,
        stream_id: &str,
        request_ids: Vec<RequestId>,
        sink: StreamSink,
    ) -> Option<String> {
        let mut state = self.inner.state.lock();
        for id in &request_ids {
            state.request_index.insert(id.clone(), stream_id.to_owned());
        }
        state
            .streams
            .insert(stream_id.to_owned(), StreamEntry { request_ids, sink });
        state.session_id.clone()
    }

    /// Dispatch the payload to the message callback after a scheduler yield,
    /// so the caller holds the response before the first callback runs. A
    /// transport closed (or a stream torn down) in the interim dispatches
    /// nothing.
    fn spawn_dispatch(&self, stream_id: String, messages: Vec<JsonRpcMessage>, extra: MessageExtra) {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            tokio::task::yield_now().await;
            {
                let state = inner.state.lock();
                if !state.started || !state.streams.contains_key(&stream_id) {
                    debug!(%stream_id, "stream gone before dispatch, dropping payload");
                    return;
                }
            }
            for message in messages {
                inner.dispatch(message, extra.clone());
            }
        });
    }

    // ------------------------------------------------------------------
    // GET
    // ------------------------------------------------------------------

    fn handle_get(&self, headers: &HeaderMap) -> Response {
        if !accept_includes(headers, "text/event-stream") {
            return error_response(
                StatusCode::NOT_ACCEPTABLE,
                JsonRpcErrorCode::Transport,
                "Not Acceptable: Client must accept text/event-stream",
                None,
            );
        }
        if let Err(response) = self.check_session(headers) {
            return response;
        }

        let last_event_id = headers
            .get("last-event-id")
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        if let Some(store) = &self.inner.config.event_store
            && let Some(last_event_id) = last_event_id
        {
            return self.open_replay_stream(Arc::clone(store), last_event_id);
        }

        let (sender, frames) = FrameSender::channel();
        let session_id = {
            let mut state = self.inner.state.lock();
            if state.streams.contains_key(STANDALONE_STREAM_ID) {
                return error_response(
                    StatusCode::CONFLICT,
                    JsonRpcErrorCode::Transport,
                    "Only one SSE stream is allowed per session",
                    None,
                );
            }
            state.streams.insert(
                STANDALONE_STREAM_ID.to_owned(),
                StreamEntry {
                    request_ids: Vec::new(),
                    sink: StreamSink::Sse(Some(sender)),
                },
            );
            state.session_id.clone()
        };
        let guard = CancelGuard::bound(&self.inner, STANDALONE_STREAM_ID.to_owned());
        sse_response(frames, guard, session_id)
    }

    /// Open an SSE stream that first replays missed events, then carries
    /// live traffic under the stream id the store returns.
    fn open_replay_stream(&self, store: Arc<dyn EventStore>, last_event_id: String) -> Response {
        let (sender, frames) = FrameSender::channel();
        let session_id = self.inner.state.lock().session_id.clone();
        let guard = CancelGuard::deferred(&self.inner);
        let slot = guard.slot();
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let sink = ReplaySink::new(sender.clone());
            match store.replay_events_after(&last_event_id, &sink).await {
                Ok(stream_id) => {
                    *slot.lock() = Some(stream_id.clone());
                    let mut state = inner.state.lock();
                    state.streams.insert(
                        stream_id.clone(),
                        StreamEntry {
                            request_ids: Vec::new(),
                            sink: StreamSink::Sse(Some(sender.clone())),
                        },
                    );
                    // Consumer may have vanished while the store was
                    // replaying; don't leave a dead registration behind.
                    if sender.is_closed() {
                        state.streams.remove(&stream_id);
                    }
                }
                Err(error) => inner.report_error(error),
            }
        });
        sse_response(frames, guard, session_id)
    }

    // ------------------------------------------------------------------
    // DELETE
    // ------------------------------------------------------------------

    fn handle_delete(&self, headers: &HeaderMap) -> Response {
        if let Err(response) = self.check_session(headers) {
            return response;
        }
        self.close();
        empty_response(StatusCode::OK)
    }

    // ------------------------------------------------------------------
    // send
    // ------------------------------------------------------------------

    async fn send_to_standalone_stream(&self, message: JsonRpcMessage) -> TransportResult<()> {
        if message.is_response() {
            return Err(TransportError::ResponseOnStandaloneStream);
        }
        let controller = {
            let state = self.inner.state.lock();
            state
                .streams
                .get(STANDALONE_STREAM_ID)
                .and_then(StreamEntry::controller)
        };
        // No standalone consumer is connected; server-initiated messages
        // are droppable by contract.
        let Some(controller) = controller else {
            debug!("no standalone SSE stream, dropping server-initiated message");
            return Ok(());
        };
        let event_id = self.store_event(STANDALONE_STREAM_ID, &message).await?;
        if let Err(error) = controller.write(event_id.as_deref(), &message) {
            self.inner.report_error(error);
        }
        Ok(())
    }

    async fn send_to_request_stream(
        &self,
        message: JsonRpcMessage,
        request_id: RequestId,
    ) -> TransportResult<()> {
        let (stream_id, controller) = {
            let state = self.inner.state.lock();
            let Some(stream_id) = state.request_index.get(&request_id) else {
                return Err(TransportError::NoStreamForRequest(request_id));
            };
            let controller = state.streams.get(stream_id).and_then(StreamEntry::controller);
            (stream_id.clone(), controller)
        };
        // A known stream without a controller is either in JSON mode or had
        // its SSE body canceled: elide the write, keep the bookkeeping.
        if let Some(controller) = &controller {
            let event_id = self.store_event(&stream_id, &message).await?;
            if let Err(error) = controller.write(event_id.as_deref(), &message) {
                self.inner.report_error(error);
            }
        }
        if message.is_response() {
            self.inner.finish_request(&stream_id, request_id, message);
        }
        Ok(())
    }

    async fn store_event(
        &self,
        stream_id: &str,
        message: &JsonRpcMessage,
    ) -> TransportResult<Option<String>> {
        match &self.inner.config.event_store {
            Some(store) => Ok(Some(store.store_event(stream_id, message).await?)),
            None => Ok(None),
        }
    }
}

impl Inner {
    fn dispatch(&self, message: JsonRpcMessage, extra: MessageExtra) {
        let callback = self.callbacks.read().on_message.clone();
        if let Some(callback) = callback {
            callback(message, extra);
        }
    }

    fn report_error(&self, error: TransportError) {
        warn!(error = %error, "transport stream error");
        let callback = self.callbacks.read().on_error.clone();
        if let Some(callback) = callback {
            callback(error);
        }
    }

    /// Record a terminal response and, when it is the last one the stream is
    /// waiting for, complete the stream and drop all of its bookkeeping.
    fn finish_request(&self, stream_id: &str, request_id: RequestId, message: JsonRpcMessage) {
        let mut state = self.state.lock();
        state.response_buffer.insert(request_id, message);
        let complete = state.streams.get(stream_id).is_some_and(|entry| {
            entry
                .request_ids
                .iter()
                .all(|id| state.response_buffer.contains_key(id))
        });
        if !complete {
            return;
        }
        let Some(entry) = state.streams.remove(stream_id) else {
            return;
        };
        let mut responses = Vec::with_capacity(entry.request_ids.len());
        for id in &entry.request_ids {
            state.request_index.remove(id);
            if let Some(response) = state.response_buffer.remove(id) {
                responses.push(response);
            }
        }
        let session_id = state.session_id.clone();
        drop(state);
        match entry.sink {
            // Dropping the SSE controller closes the body; a canceled stream
            // has no controller left and there is nothing to close.
            StreamSink::Sse(_) => {}
            StreamSink::Json(Some(resolver)) => {
                let _ = resolver.send(json_completion_response(&responses, session_id.as_deref()));
            }
            StreamSink::Json(None) => {}
        }
    }

    /// Consumer-cancellation hook: forget the stream's controller but keep
    /// the request bookkeeping, so late responses still complete and clean
    /// up. Streams with no correlated requests are removed outright, which
    /// frees the standalone id for a new GET.
    fn release_stream(&self, stream_id: &str) {
        let mut state = self.state.lock();
        let Some(entry) = state.streams.get_mut(stream_id) else {
            return;
        };
        if entry.request_ids.is_empty() {
            state.streams.remove(stream_id);
        } else if let StreamSink::Sse(controller) = &mut entry.sink {
            *controller = None;
        }
    }
}

impl fmt::Debug for StreamableHttpServerTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("StreamableHttpServerTransport")
            .field("started", &state.started)
            .field("initialized", &state.initialized)
            .field("session_id", &state.session_id)
            .field("active_streams", &state.streams.len())
            .finish()
    }
}

// ----------------------------------------------------------------------
// SSE body plumbing
// ----------------------------------------------------------------------

/// Deregisters its stream when the response body is dropped, which is how
/// consumer cancellation reaches the multiplexer.
struct CancelGuard {
    inner: Weak<Inner>,
    stream_id: Arc<Mutex<Option<String>>>,
}

impl CancelGuard {
    fn bound(inner: &Arc<Inner>, stream_id: String) -> Self {
        Self {
            inner: Arc::downgrade(inner),
            stream_id: Arc::new(Mutex::new(Some(stream_id))),
        }
    }

    /// Guard whose stream id is not yet known (replay streams learn theirs
    /// from the event store). The spawned replay task fills the slot.
    fn deferred(inner: &Arc<Inner>) -> Self {
        Self {
            inner: Arc::downgrade(inner),
            stream_id: Arc::new(Mutex::new(None)),
        }
    }

    fn slot(&self) -> Arc<Mutex<Option<String>>> {
        Arc::clone(&self.stream_id)
    }
}

impl Drop for CancelGuard {
    fn drop(&mut self) {
        let Some(inner) = self.inner.upgrade() else {
            return;
        };
        let Some(stream_id) = self.stream_id.lock().take() else {
            return;
        };
        inner.release_stream(&stream_id);
    }
}

struct SseBody {
    frames: mpsc::UnboundedReceiver<Bytes>,
    _guard: CancelGuard,
}

impl Stream for SseBody {
    type Item = Result<Bytes, Infallible>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().frames.poll_recv(cx).map(|frame| frame.map(Ok))
    }
}

fn sse_response(
    frames: mpsc::UnboundedReceiver<Bytes>,
    guard: CancelGuard,
    session_id: Option<String>,
) -> Response {
    let body = Body::from_stream(SseBody {
        frames,
        _guard: guard,
    });
    let builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/event-stream")
        .header(header::CACHE_CONTROL, "no-cache")
        .header(header::CONNECTION, "keep-alive");
    finish_response(apply_session_header(builder, session_id.as_deref()), body)
}

// ----------------------------------------------------------------------
// Response helpers
// ----------------------------------------------------------------------

/// Build the JSON-RPC error envelope `{jsonrpc, error, id: null}` with the
/// given HTTP status.
pub(crate) fn error_response(
    status: StatusCode,
    code: JsonRpcErrorCode,
    message: &str,
    data: Option<Value>,
) -> Response {
    let error = match data {
        Some(data) => JsonRpcError::with_data(code.code(), message, data),
        None => JsonRpcError::new(code.code(), message),
    };
    let body = serde_json::json!({
        "jsonrpc": JSONRPC_VERSION,
        "error": error,
        "id": null,
    });
    let builder = Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json");
    finish_response(
        builder,
        Body::from(serde_json::to_vec(&body).unwrap_or_default()),
    )
}

fn parse_error_response(cause: &str) -> Response {
    error_response(
        StatusCode::BAD_REQUEST,
        JsonRpcErrorCode::ParseError,
        "Parse error",
        Some(Value::String(cause.to_owned())),
    )
}

fn method_not_allowed() -> Response {
    let mut response = error_response(
        StatusCode::METHOD_NOT_ALLOWED,
        JsonRpcErrorCode::Transport,
        "Method not allowed",
        None,
    );
    response
        .headers_mut()
        .insert(header::ALLOW, HeaderValue::from_static("GET, POST, DELETE"));
    response
}

fn empty_response(status: StatusCode) -> Response {
    finish_response(Response::builder().status(status), Body::empty())
}

fn json_completion_response(responses: &[JsonRpcMessage], session_id: Option<&str>) -> Response {
    let body = if responses.len() == 1 {
        serde_json::to_vec(&responses[0])
    } else {
        serde_json::to_vec(responses)
    }
    .unwrap_or_default();
    let builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/json");
    finish_response(apply_session_header(builder, session_id), Body::from(body))
}

fn apply_session_header(
    mut builder: response::Builder,
    session_id: Option<&str>,
) -> response::Builder {
    if let Some(id) = session_id
        && let Ok(value) = HeaderValue::from_str(id)
    {
        builder = builder.header(MCP_SESSION_ID_HEADER, value);
    }
    builder
}

fn finish_response(builder: response::Builder, body: Body) -> Response {
    builder.body(body).unwrap_or_else(|_| {
        let mut response = Response::new(Body::empty());
        *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
        response
    })
}

fn accept_includes(headers: &HeaderMap, media_type: &str) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|accept| accept.contains(media_type))
}

fn content_type_is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|content_type| content_type.contains("application/json"))
}
