//! Transport configuration.

use std::fmt;
use std::sync::Arc;

use crate::event_store::EventStore;
use crate::session::random_session_id;

/// Produces the opaque session id assigned on `initialize`.
///
/// Present means the transport is stateful; absent means stateless (no
/// session validation, no `Mcp-Session-Id` response headers).
pub type SessionIdGenerator = Arc<dyn Fn() -> String + Send + Sync>;

/// Invoked once per successful `initialize` with the assigned session id.
pub type SessionInitializedCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Configuration for [`StreamableHttpServerTransport`].
///
/// [`StreamableHttpServerTransport`]: crate::server::StreamableHttpServerTransport
#[derive(Clone, Default)]
pub struct StreamableHttpConfig {
    pub(crate) session_id_generator: Option<SessionIdGenerator>,
    pub(crate) on_session_initialized: Option<SessionInitializedCallback>,
    pub(crate) enable_json_response: bool,
    pub(crate) event_store: Option<Arc<dyn EventStore>>,
}

impl StreamableHttpConfig {
    /// Start building a configuration.
    ///
    /// Defaults: stateless, SSE response mode, no event store.
    pub fn builder() -> StreamableHttpConfigBuilder {
        StreamableHttpConfigBuilder::default()
    }

    /// Whether a session id generator is configured.
    pub fn is_stateful(&self) -> bool {
        self.session_id_generator.is_some()
    }
}

impl fmt::Debug for StreamableHttpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamableHttpConfig")
            .field("stateful", &self.session_id_generator.is_some())
            .field("enable_json_response", &self.enable_json_response)
            .field("resumable", &self.event_store.is_some())
            .finish()
    }
}

/// Builder for [`StreamableHttpConfig`].
#[derive(Clone, Default)]
pub struct StreamableHttpConfigBuilder {
    config: StreamableHttpConfig,
}

impl StreamableHttpConfigBuilder {
    /// Create a builder with the default (stateless, SSE mode) configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the transport stateful with a custom session id generator.
    pub fn session_id_generator(
        mut self,
        generate: impl Fn() -> String + Send + Sync + 'static,
    ) -> Self {
        self.config.session_id_generator = Some(Arc::new(generate));
        self
    }

    /// Make the transport stateful with random (UUID v4) session ids.
    pub fn stateful(self) -> Self {
        self.session_id_generator(random_session_id)
    }

    /// Observe session creation.
    pub fn on_session_initialized(
        mut self,
        callback: impl Fn(&str) + Send + Sync + 'static,
    ) -> Self {
        self.config.on_session_initialized = Some(Arc::new(callback));
        self
    }

    /// Answer request-bearing POSTs with a single batched JSON response
    /// instead of an SSE stream. Default: false.
    pub fn json_response(mut self, enable: bool) -> Self {
        self.config.enable_json_response = enable;
        self
    }

    /// Enable resumability backed by `store`.
    pub fn event_store(mut self, store: Arc<dyn EventStore>) -> Self {
        self.config.event_store = Some(store);
        self
    }

    /// Finish building.
    pub fn build(self) -> StreamableHttpConfig {
        self.config
    }
}

impl fmt::Debug for StreamableHttpConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamableHttpConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}
