//! Lifecycle management subsystem.
//!
//! Startup ordering lives in `main` (config first, then metrics, then the
//! listener); shutdown.rs coordinates the way back down.

pub mod shutdown;

pub use shutdown::{Shutdown, ShutdownSignal};
