//! Lazy-activating HTTP/WebSocket module dispatcher.
//!
//! Handler modules register against context paths; each module's expensive
//! setup is deferred until the first request matching its path arrives.
//! Streaming (WebSocket) modules activate eagerly at registration instead,
//! so their connection handlers are wired before any client connects.

pub mod config;
pub mod dispatch;
pub mod errors;
pub mod http;
pub mod module;
pub mod observability;
pub mod registry;

pub use config::ServerConfig;
pub use dispatch::DispatcherContext;
pub use errors::{BoxError, DispatchError};
pub use module::{HandlerSink, Module, RouteSink, ServerKind, StreamHandler, StreamSink};
pub use registry::{ModuleEntry, Registry};
