//! Observability subsystem.
//!
//! Structured log events come from `tracing` call sites throughout the
//! crate (the subscriber is installed in `main`); this module owns metric
//! recording and exposition.

pub mod metrics;
