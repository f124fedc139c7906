//! Module capability contract.
//!
//! # Responsibilities
//! - Define the interface handler modules implement
//! - Distinguish request/response modules from persistent-connection modules
//! - Define the connection handler contract for streaming modules
//!
//! # Design Decisions
//! - One `Module` trait plus a tagged `HandlerSink`; the dispatcher always
//!   hands a module the sink matching its declared kind
//! - `activate()` is called at most once per process lifetime
//! - Context paths are raw string prefixes, not segment-aware

pub mod sink;

use axum::extract::ws::WebSocket;
use futures_util::future::BoxFuture;

use crate::errors::BoxError;

pub use sink::{HandlerSink, RouteSink, StreamSink};

/// Server surface a module binds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerKind {
    /// Request/response handling over plain HTTP. Activated lazily on the
    /// first request matching the module's context path.
    Primary,
    /// Persistent-connection handling over WebSocket. Activated eagerly at
    /// registration, before any client attempts a connection.
    Streaming,
}

/// A handler module registered under a context path.
///
/// `activate` performs the module's one-time setup (mounting routes or
/// installing a connection handler) through the supplied sink. The dispatcher
/// guarantees at most one successful invocation per process; a failed
/// invocation may be retried by a later matching request.
pub trait Module: Send + Sync {
    /// Path prefix this module is registered under. Immutable.
    fn context_path(&self) -> &str;

    /// Which server surface this module binds to.
    fn kind(&self) -> ServerKind;

    /// One-time setup. May block; the latency lands on the first matching
    /// request only.
    fn activate(&self, sink: HandlerSink) -> Result<(), BoxError>;
}

/// Connection handler installed by a streaming module.
pub trait StreamHandler: Send + Sync {
    /// Called once per accepted WebSocket connection.
    fn on_connect(&self, socket: WebSocket) -> BoxFuture<'static, ()>;
}

impl<F, Fut> StreamHandler for F
where
    F: Fn(WebSocket) -> Fut + Send + Sync,
    Fut: std::future::Future<Output = ()> + Send + 'static,
{
    fn on_connect(&self, socket: WebSocket) -> BoxFuture<'static, ()> {
        Box::pin(self(socket))
    }
}
