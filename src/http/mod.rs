//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, layering)
//!     → request.rs (add request ID)
//!     → middleware/redirect.rs (match rules, short-circuit or continue)
//!     → server.rs forward handler (proxy unmatched requests upstream)
//!     → Send to client
//! ```

pub mod middleware;
pub mod request;
pub mod server;

pub use request::{RequestIdLayer, X_REQUEST_ID};
pub use server::HttpServer;
