//! Redirect rule model.

use axum::http::StatusCode;

use crate::config::schema::RedirectRuleConfig;

/// `from` value that makes a rule match every request.
pub const CATCH_ALL_FROM: &str = "/";

/// A single compiled redirect directive.
#[derive(Debug, Clone)]
pub struct Rule {
    /// Path to match; [`CATCH_ALL_FROM`] matches everything.
    pub from: String,

    /// Redirect target; an absolute URL for catch-all rules, any string
    /// for exact rules.
    pub to: String,

    /// Status for the redirect response. Ignored when `meta` is set.
    pub code: StatusCode,

    /// Serve an HTML meta-refresh page instead of a status redirect.
    pub meta: bool,
}

impl Rule {
    /// True when this rule matches regardless of the request path.
    pub fn is_catch_all(&self) -> bool {
        self.from == CATCH_ALL_FROM
    }

    /// Compile a configured rule.
    ///
    /// Config validation has already rejected codes `StatusCode` cannot
    /// represent; 301 stands in if one slips through anyway.
    pub fn from_config(config: &RedirectRuleConfig) -> Self {
        Self {
            from: config.from.clone(),
            to: config.to.clone(),
            code: StatusCode::from_u16(config.code).unwrap_or(StatusCode::MOVED_PERMANENTLY),
            meta: config.meta,
        }
    }
}
