//! Observability subsystem.
//!
//! # Design Decisions
//! - Structured logging via tracing; request IDs flow through all spans
//! - Level configurable via environment

pub mod logging;
