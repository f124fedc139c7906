//! Module registry.
//!
//! # Responsibilities
//! - Own the ordered list of registered modules
//! - Resolve request paths to owning modules by context-path prefix
//! - Enforce the eager-activation policy for streaming modules
//!
//! # Design Decisions
//! - Registration order is resolution order; first-registered wins on
//!   overlapping prefixes
//! - Prefix match is a raw `starts_with`, not segment-aware: a module at
//!   `/api` also claims `/apix`
//! - Reads take a lock-free snapshot; appends are serialized, so late
//!   registration while traffic is flowing stays safe

pub mod entry;

use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwap;

use crate::errors::DispatchError;
use crate::module::{HandlerSink, Module, ServerKind};

pub use entry::ModuleEntry;

/// Ordered, append-only collection of registered modules.
pub struct Registry {
    entries: ArcSwap<Vec<Arc<ModuleEntry>>>,
    append: Mutex<()>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            entries: ArcSwap::from_pointee(Vec::new()),
            append: Mutex::new(()),
        }
    }

    /// Append a module at the end of the resolution order.
    ///
    /// Streaming modules are activated here, before the entry becomes
    /// visible, via the sink the caller supplies; connection-oriented
    /// transports must be wired up before any client attempts a connection.
    /// Primary modules stay unactivated until their first matching request.
    ///
    /// Fails with [`DispatchError::InvalidModule`] on an empty context path
    /// and with [`DispatchError::Activation`] if eager activation fails; a
    /// failed registration leaves the registry unchanged.
    pub fn register<F>(
        &self,
        module: Arc<dyn Module>,
        streaming_sink: F,
    ) -> Result<Arc<ModuleEntry>, DispatchError>
    where
        F: FnOnce(&ModuleEntry) -> HandlerSink,
    {
        if module.context_path().is_empty() {
            return Err(DispatchError::InvalidModule(
                "context path must not be empty".to_string(),
            ));
        }

        let entry = Arc::new(ModuleEntry::new(module));
        if entry.kind() == ServerKind::Streaming {
            entry.activate_now(streaming_sink(&entry))?;
        }

        let _guard = self.append.lock().unwrap_or_else(PoisonError::into_inner);
        let mut next = (*self.entries.load_full()).clone();
        next.push(Arc::clone(&entry));
        self.entries.store(Arc::new(next));
        Ok(entry)
    }

    /// First-registered entry whose context path is a prefix of
    /// `request_path`, or `None` if no module claims it.
    pub fn resolve(&self, request_path: &str) -> Option<Arc<ModuleEntry>> {
        self.entries
            .load()
            .iter()
            .find(|entry| request_path.starts_with(entry.context_path()))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.load().is_empty()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
