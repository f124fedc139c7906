//! Handler sinks: the registration surface passed to `Module::activate`.
//!
//! # Data Flow
//! ```text
//! Primary module:
//!     activate(HandlerSink::Routes(sink))
//!         → sink.mount(Router)
//!         → router stored on the module's entry
//!         → dispatcher forwards matching requests into it
//!
//! Streaming module:
//!     activate(HandlerSink::Stream(sink))
//!         → sink.accept(handler)
//!         → handler stored on the hub under the context path
//!         → dispatcher upgrades matching requests and hands over the socket
//! ```

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use axum::Router;

use crate::module::StreamHandler;

/// Registration surface handed to `Module::activate`.
///
/// The variant always matches the module's declared [`ServerKind`]: primary
/// modules receive `Routes`, streaming modules receive `Stream`.
///
/// [`ServerKind`]: crate::module::ServerKind
pub enum HandlerSink {
    /// Mounts an axum sub-application for a primary module.
    Routes(RouteSink),
    /// Installs a connection handler for a streaming module.
    Stream(StreamSink),
}

/// Route registration surface for primary modules.
///
/// The mounted router receives requests with their original, unstripped
/// paths, so handlers are mounted under the module's own context path.
pub struct RouteSink {
    slot: Arc<RwLock<Option<Router>>>,
}

impl RouteSink {
    pub(crate) fn new(slot: Arc<RwLock<Option<Router>>>) -> Self {
        Self { slot }
    }

    /// Mount the module's routes. A repeat mount replaces the previous one,
    /// so a retried activation serves the routes of the attempt that
    /// succeeded, never a leftover from one that failed.
    pub fn mount(self, routes: Router) {
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = Some(routes);
    }
}

/// Connection registration surface for streaming modules.
pub struct StreamSink {
    context_path: String,
    hub: StreamingHub,
}

impl StreamSink {
    pub(crate) fn new(context_path: String, hub: StreamingHub) -> Self {
        Self { context_path, hub }
    }

    /// Install the module's connection handler under its context path.
    pub fn accept<H>(self, handler: H)
    where
        H: StreamHandler + 'static,
    {
        self.hub.install(self.context_path, Arc::new(handler));
    }
}

/// Shared table of streaming connection handlers, keyed by context path.
/// Installs happen at activation time; lookups on every upgrade request.
#[derive(Clone, Default)]
pub(crate) struct StreamingHub {
    handlers: Arc<RwLock<HashMap<String, Arc<dyn StreamHandler>>>>,
}

impl StreamingHub {
    pub(crate) fn install(&self, context_path: String, handler: Arc<dyn StreamHandler>) {
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(context_path, handler);
    }

    pub(crate) fn handler_for(&self, context_path: &str) -> Option<Arc<dyn StreamHandler>> {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(context_path)
            .cloned()
    }
}
