//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//!
//! On reload signal:
//!     watcher.rs detects change (debounced)
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → redirect rules published if they actually changed
//!     → fresh RedirectFilter swapped into the running server
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Redirect targets are NOT URL-parsed here; a malformed catch-all
//!   target surfaces as a 500 at request time

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use schema::GatewayConfig;
pub use schema::ListenerConfig;
pub use schema::RedirectRuleConfig;
pub use schema::UpstreamConfig;
