//! Redirect subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path, query)
//!     → filter.rs (ordered rule scan, first match wins)
//!     → catch-all: compose target from rule URL + request path/query
//!     → exact: hand back the rule target verbatim
//!     → response.rs (status redirect or HTML meta-refresh page)
//!
//! Rule compilation (at startup / reload):
//!     RedirectRuleConfig[]
//!     → rule.rs (resolve status codes)
//!     → Freeze as immutable RedirectFilter
//! ```
//!
//! # Design Decisions
//! - Rules compiled once, immutable at runtime; a reload builds a fresh filter
//! - First match wins; a catch-all shadows every rule after it
//! - Exact matching is byte-for-byte, no trailing-slash equivalence
//! - Catch-all composition folds the target host into the lexical path join
//!   and keeps only the first value of repeated request query keys; both are
//!   deliberate, kept-as-is behaviors

pub mod filter;
pub mod response;
pub mod rule;

pub use filter::{InvalidTarget, RedirectAction, RedirectFilter};
pub use rule::Rule;
