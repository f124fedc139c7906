//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum setup, catch-all dispatch route)
//!     → request.rs (request ID)
//!     → registry resolve + lazy activation
//!     → module's mounted router (primary) or WebSocket handler (streaming)
//! ```

pub mod request;
pub mod server;

pub use request::{UuidRequestId, X_REQUEST_ID};
