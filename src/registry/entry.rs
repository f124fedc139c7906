//! Per-module registration entry and activation state.
//!
//! # Responsibilities
//! - Pair a module with its activation flag
//! - Guarantee at-most-once activation under concurrent requests
//! - Hold the router a primary module mounts at activation
//!
//! # Design Decisions
//! - Activation state is an atomic fast path plus an async mutex slow path,
//!   never a plain read-then-write of a bool
//! - A failed activation is not committed; the next matching request retries
//! - A failed activation also discards any routes it mounted, so a retry
//!   never serves the failed attempt's handlers
//! - State machine: UNINITIALIZED → INITIALIZED, one transition, terminal

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use axum::Router;
use tokio::sync::Mutex;

use crate::errors::DispatchError;
use crate::module::{HandlerSink, Module, ServerKind};

/// One registered module plus its activation state. Owned by the registry.
pub struct ModuleEntry {
    module: Arc<dyn Module>,
    activated: AtomicBool,
    activating: Mutex<()>,
    routes: Arc<RwLock<Option<Router>>>,
}

impl std::fmt::Debug for ModuleEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleEntry")
            .field("context_path", &self.module.context_path())
            .field("activated", &self.activated)
            .finish_non_exhaustive()
    }
}

impl ModuleEntry {
    pub(crate) fn new(module: Arc<dyn Module>) -> Self {
        Self {
            module,
            activated: AtomicBool::new(false),
            activating: Mutex::new(()),
            routes: Arc::new(RwLock::new(None)),
        }
    }

    pub fn context_path(&self) -> &str {
        self.module.context_path()
    }

    pub fn kind(&self) -> ServerKind {
        self.module.kind()
    }

    /// Whether this entry has completed activation.
    pub fn is_activated(&self) -> bool {
        self.activated.load(Ordering::Acquire)
    }

    /// Router mounted by the module at activation, if any.
    pub(crate) fn routes(&self) -> Option<Router> {
        self.routes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn route_slot(&self) -> Arc<RwLock<Option<Router>>> {
        Arc::clone(&self.routes)
    }

    /// A failed activation attempt leaves nothing behind.
    fn discard_routes(&self) {
        *self.routes.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Activate the module if it has not been activated yet.
    ///
    /// Exactly one caller executes `activate()`; concurrent callers wait on
    /// the entry's mutex and observe the committed state before returning.
    /// The sink factory runs only for the winning caller. On failure the
    /// flag stays unset and the error propagates to the triggering request.
    pub async fn ensure_activated<F>(&self, sink_factory: F) -> Result<(), DispatchError>
    where
        F: FnOnce() -> HandlerSink,
    {
        if self.activated.load(Ordering::Acquire) {
            return Ok(());
        }

        let _guard = self.activating.lock().await;
        if self.activated.load(Ordering::Acquire) {
            return Ok(());
        }

        if let Err(reason) = self.module.activate(sink_factory()) {
            self.discard_routes();
            return Err(DispatchError::Activation {
                context_path: self.context_path().to_string(),
                reason,
            });
        }
        self.activated.store(true, Ordering::Release);
        Ok(())
    }

    /// Eager activation for streaming modules at registration time. The
    /// entry is not yet visible to `resolve`, so no request can race this.
    pub(crate) fn activate_now(&self, sink: HandlerSink) -> Result<(), DispatchError> {
        if let Err(reason) = self.module.activate(sink) {
            self.discard_routes();
            return Err(DispatchError::Activation {
                context_path: self.context_path().to_string(),
                reason,
            });
        }
        self.activated.store(true, Ordering::Release);
        Ok(())
    }
}
