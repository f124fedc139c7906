//! Error definitions for the dispatcher core.

use thiserror::Error;

/// Boxed error type returned by module activation hooks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors surfaced by registration, activation and serving.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Registration input failed validation (empty context path).
    #[error("invalid module: {0}")]
    InvalidModule(String),

    /// A module's `activate()` failed. The entry stays uninitialized and
    /// the next matching request retries activation.
    #[error("activation of module at {context_path} failed: {reason}")]
    Activation {
        context_path: String,
        reason: BoxError,
    },

    /// Bind or serve failure.
    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),
}
