//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check redirect rules are structurally usable
//! - Validate addresses and value ranges
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Redirect status codes are accepted as-is apart from representability;
//!   the gateway does not insist on a 3xx class
//! - Catch-all targets are not URL-parsed here; a malformed target is a
//!   request-time failure, not a load-time one

use axum::http::StatusCode;

use crate::config::schema::GatewayConfig;

/// A single semantic validation failure.
#[derive(Debug)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration, collecting every error found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<std::net::SocketAddr>().is_err() {
        errors.push(ValidationError {
            field: "listener.bind_address".to_string(),
            message: format!("not a valid socket address: {}", config.listener.bind_address),
        });
    }

    if config.listener.max_connections == 0 {
        errors.push(ValidationError {
            field: "listener.max_connections".to_string(),
            message: "must be greater than zero".to_string(),
        });
    }

    if config.upstream.address.parse::<std::net::SocketAddr>().is_err() {
        errors.push(ValidationError {
            field: "upstream.address".to_string(),
            message: format!("not a valid socket address: {}", config.upstream.address),
        });
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError {
            field: "timeouts.request_secs".to_string(),
            message: "must be greater than zero".to_string(),
        });
    }

    for (i, rule) in config.redirects.iter().enumerate() {
        let field = |name: &str| format!("redirects[{}].{}", i, name);

        if !rule.from.starts_with('/') {
            errors.push(ValidationError {
                field: field("from"),
                message: format!("must start with '/': {:?}", rule.from),
            });
        }
        if rule.to.is_empty() {
            errors.push(ValidationError {
                field: field("to"),
                message: "must not be empty".to_string(),
            });
        }
        if StatusCode::from_u16(rule.code).is_err() {
            errors.push(ValidationError {
                field: field("code"),
                message: format!("not a representable HTTP status code: {}", rule.code),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
