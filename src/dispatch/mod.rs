//! Dispatcher context: the per-instance root object.
//!
//! # Data Flow
//! ```text
//! register(module)
//!     → registry append (streaming modules activate eagerly)
//!
//! inbound request
//!     → http::server dispatch handler
//!     → registry.resolve(path)
//!     → ensure_activated(entry) (lazy, at-most-once)
//!     → forward into the module's own handlers
//! ```
//!
//! # Design Decisions
//! - No process-global state: the context owns the registry, the streaming
//!   hub and the server config, so independent instances coexist and tests
//!   need no global fixtures
//! - Cheap to clone; handlers share the same inner state

use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::errors::DispatchError;
use crate::http::server;
use crate::module::sink::StreamingHub;
use crate::module::{HandlerSink, Module, RouteSink, ServerKind, StreamSink};
use crate::registry::{ModuleEntry, Registry};

/// Owns one dispatcher instance: registry, streaming hub and server config.
#[derive(Clone)]
pub struct DispatcherContext {
    inner: Arc<Inner>,
}

struct Inner {
    registry: Registry,
    hub: StreamingHub,
    config: ServerConfig,
}

impl DispatcherContext {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                registry: Registry::new(),
                hub: StreamingHub::default(),
                config,
            }),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    pub(crate) fn hub(&self) -> &StreamingHub {
        &self.inner.hub
    }

    /// Register a module under its context path.
    ///
    /// Streaming modules are activated immediately; primary modules wait for
    /// their first matching request.
    pub fn register(&self, module: Arc<dyn Module>) -> Result<(), DispatchError> {
        let hub = self.inner.hub.clone();
        self.inner.registry.register(module, |entry| {
            HandlerSink::Stream(StreamSink::new(entry.context_path().to_string(), hub))
        })?;
        Ok(())
    }

    /// Build the sink matching the entry's declared kind.
    pub(crate) fn sink_for(&self, entry: &ModuleEntry) -> HandlerSink {
        match entry.kind() {
            ServerKind::Primary => HandlerSink::Routes(RouteSink::new(entry.route_slot())),
            ServerKind::Streaming => HandlerSink::Stream(StreamSink::new(
                entry.context_path().to_string(),
                self.inner.hub.clone(),
            )),
        }
    }

    /// Activate the entry if needed. At-most-once under concurrency; a
    /// failure leaves the entry retry-able and propagates to the request.
    pub(crate) async fn ensure_activated(
        &self,
        entry: &Arc<ModuleEntry>,
    ) -> Result<(), DispatchError> {
        entry.ensure_activated(|| self.sink_for(entry)).await
    }

    /// The underlying HTTP application, for advanced external wiring.
    ///
    /// The returned router carries the catch-all dispatch interceptor and
    /// the ambient middleware layers; callers may merge additional routes or
    /// hand it to `axum::serve` themselves.
    pub fn app(&self) -> Router {
        server::build_app(self.clone())
    }

    /// Bind `port` on the configured host and serve until shutdown.
    ///
    /// Calling this twice on the same context is a usage error.
    pub async fn listen(&self, port: u16) -> Result<(), DispatchError> {
        let listener =
            TcpListener::bind((self.inner.config.bind_host.as_str(), port)).await?;
        self.run(listener).await
    }

    /// Serve on an already-bound listener. Useful when the caller owns port
    /// selection, e.g. binding port 0 in tests.
    pub async fn run(&self, listener: TcpListener) -> Result<(), DispatchError> {
        server::serve(self.clone(), listener).await
    }
}

impl Default for DispatcherContext {
    fn default() -> Self {
        Self::new(ServerConfig::default())
    }
}
