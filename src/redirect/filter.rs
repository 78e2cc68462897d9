//! Rule evaluation and redirect target composition.

use std::collections::{BTreeMap, BTreeSet};

use axum::http::StatusCode;
use url::form_urlencoded;
use url::Url;

use crate::config::schema::RedirectRuleConfig;
use crate::redirect::rule::Rule;

/// Decision produced by a matching rule: where to send the client and how.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectAction {
    /// Fully composed redirect target.
    pub target: String,

    /// Status for the redirect response. Ignored when `meta` is set.
    pub code: StatusCode,

    /// Serve an HTML meta-refresh page instead of a status redirect.
    pub meta: bool,
}

/// A catch-all rule's target could not be parsed as a URL.
#[derive(Debug, thiserror::Error)]
#[error("invalid redirect target {target:?}: {source}")]
pub struct InvalidTarget {
    pub target: String,
    #[source]
    pub source: url::ParseError,
}

/// Immutable, ordered redirect rule table.
///
/// Evaluation scans rules in configuration order and stops at the first
/// match, so a catch-all placed anywhere but last shadows every rule after
/// it. Safe to share across workers without locks.
#[derive(Debug, Default)]
pub struct RedirectFilter {
    rules: Vec<Rule>,
}

impl RedirectFilter {
    /// Create a filter over an ordered rule list.
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Compile a filter from configured rules, preserving their order.
    pub fn from_config(rules: &[RedirectRuleConfig]) -> Self {
        Self::new(rules.iter().map(Rule::from_config).collect())
    }

    /// Number of rules in the table.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// True when no rules are configured.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Match `path`/`query` against the rule table.
    ///
    /// Returns `Ok(Some(action))` for the earliest matching rule,
    /// `Ok(None)` when the request should continue down the pipeline, and
    /// `Err` when a matching catch-all rule carries an unparseable target.
    pub fn evaluate(
        &self,
        path: &str,
        query: Option<&str>,
    ) -> Result<Option<RedirectAction>, InvalidTarget> {
        for rule in &self.rules {
            if rule.is_catch_all() {
                // Catch-all redirect grafts the request path onto the target.
                let target = compose_catch_all_target(&rule.to, path, query)?;
                return Ok(Some(RedirectAction {
                    target,
                    code: rule.code,
                    meta: rule.meta,
                }));
            }
            if path == rule.from {
                return Ok(Some(RedirectAction {
                    target: rule.to.clone(),
                    code: rule.code,
                    meta: rule.meta,
                }));
            }
        }
        Ok(None)
    }
}

/// Build the target for a catch-all rule.
///
/// The target host (with port, when present) participates in the lexical
/// path join together with the target path and the request path; the result
/// is reassembled as `scheme://joined`. A trailing slash on the request path
/// survives the join. Query parameters start from the target URL's own and
/// each request key overwrites per-key, keeping only the request's first
/// value.
fn compose_catch_all_target(
    to: &str,
    path: &str,
    query: Option<&str>,
) -> Result<String, InvalidTarget> {
    let to_url = Url::parse(to).map_err(|source| InvalidTarget {
        target: to.to_string(),
        source,
    })?;

    let host = match (to_url.host_str(), to_url.port()) {
        (Some(host), Some(port)) => format!("{}:{}", host, port),
        (Some(host), None) => host.to_string(),
        (None, _) => String::new(),
    };

    let mut new_path = join_paths(&[host.as_str(), to_url.path(), path]);
    if path.ends_with('/') {
        // The join strips trailing slashes; put the request's back.
        new_path.push('/');
    }

    let mut target = format!("{}://{}", to_url.scheme(), new_path);

    let parameters = merge_query(&to_url, query);
    if !parameters.is_empty() {
        target.push('?');
        target.push_str(&encode_query(&parameters));
    }

    Ok(target)
}

/// Join path elements with `/` and clean the result lexically.
///
/// Leading empty elements are skipped; an all-empty input joins to the
/// empty string.
fn join_paths(elems: &[&str]) -> String {
    let first = match elems.iter().position(|e| !e.is_empty()) {
        Some(i) => i,
        None => return String::new(),
    };
    clean_path(&elems[first..].join("/"))
}

/// Lexically clean a path: collapse repeated separators, drop `.` segments,
/// resolve `..` against preceding segments, and strip any trailing slash.
fn clean_path(path: &str) -> String {
    let rooted = path.starts_with('/');
    let mut out: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match out.last() {
                Some(&"..") => out.push(".."),
                Some(_) => {
                    out.pop();
                }
                // `..` past the start of a relative path is kept; past a
                // rooted path's root it is dropped.
                None if !rooted => out.push(".."),
                None => {}
            },
            segment => out.push(segment),
        }
    }

    if rooted {
        format!("/{}", out.join("/"))
    } else if out.is_empty() {
        ".".to_string()
    } else {
        out.join("/")
    }
}

/// Merge the target URL's query with the request's.
///
/// Request keys overwrite target keys wholesale; only the first value of a
/// repeated request key is used. Keys never mentioned by the request keep
/// all of their target values.
fn merge_query(to_url: &Url, request_query: Option<&str>) -> BTreeMap<String, Vec<String>> {
    let mut merged: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (key, value) in to_url.query_pairs() {
        merged
            .entry(key.into_owned())
            .or_default()
            .push(value.into_owned());
    }

    if let Some(raw) = request_query {
        let mut overlaid = BTreeSet::new();
        for (key, value) in form_urlencoded::parse(raw.as_bytes()) {
            let key = key.into_owned();
            if overlaid.insert(key.clone()) {
                merged.insert(key, vec![value.into_owned()]);
            }
        }
    }

    merged
}

/// Encode merged parameters as a form-urlencoded query string, keys in
/// sorted order.
fn encode_query(parameters: &BTreeMap<String, Vec<String>>) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, values) in parameters {
        for value in values {
            serializer.append_pair(key, value);
        }
    }
    serializer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(from: &str, to: &str, code: StatusCode, meta: bool) -> Rule {
        Rule {
            from: from.to_string(),
            to: to.to_string(),
            code,
            meta,
        }
    }

    fn status_rule(from: &str, to: &str, code: StatusCode) -> Rule {
        rule(from, to, code, false)
    }

    #[test]
    fn exact_rule_redirects_verbatim() {
        let filter = RedirectFilter::new(vec![status_rule(
            "/old",
            "/new",
            StatusCode::MOVED_PERMANENTLY,
        )]);

        let action = filter.evaluate("/old", None).unwrap().unwrap();
        assert_eq!(action.target, "/new");
        assert_eq!(action.code, StatusCode::MOVED_PERMANENTLY);
        assert!(!action.meta);
    }

    #[test]
    fn exact_match_is_byte_for_byte() {
        let filter = RedirectFilter::new(vec![
            status_rule("/foo", "/a", StatusCode::MOVED_PERMANENTLY),
            status_rule("/bar/", "/b", StatusCode::MOVED_PERMANENTLY),
        ]);

        assert!(filter.evaluate("/foo/", None).unwrap().is_none());
        assert!(filter.evaluate("/bar", None).unwrap().is_none());
        assert!(filter.evaluate("/Foo", None).unwrap().is_none());
        assert!(filter.evaluate("/foo", None).unwrap().is_some());
        assert!(filter.evaluate("/bar/", None).unwrap().is_some());
    }

    #[test]
    fn no_match_falls_through() {
        let filter = RedirectFilter::new(vec![status_rule(
            "/old",
            "/new",
            StatusCode::MOVED_PERMANENTLY,
        )]);

        assert!(filter.evaluate("/other", None).unwrap().is_none());
    }

    #[test]
    fn earliest_matching_rule_wins() {
        let filter = RedirectFilter::new(vec![
            status_rule("/dup", "/first", StatusCode::MOVED_PERMANENTLY),
            status_rule("/dup", "/second", StatusCode::FOUND),
        ]);

        let action = filter.evaluate("/dup", None).unwrap().unwrap();
        assert_eq!(action.target, "/first");
        assert_eq!(action.code, StatusCode::MOVED_PERMANENTLY);
    }

    #[test]
    fn catch_all_shadows_later_rules() {
        let filter = RedirectFilter::new(vec![
            status_rule("/", "http://example.com", StatusCode::FOUND),
            status_rule("/old", "/new", StatusCode::MOVED_PERMANENTLY),
        ]);

        let action = filter.evaluate("/old", None).unwrap().unwrap();
        assert_eq!(action.target, "http://example.com/old");
        assert_eq!(action.code, StatusCode::FOUND);
    }

    #[test]
    fn catch_all_matches_every_path() {
        let filter = RedirectFilter::new(vec![status_rule(
            "/",
            "http://example.com",
            StatusCode::FOUND,
        )]);

        for path in ["/", "/a/b", ""] {
            assert!(
                filter.evaluate(path, None).unwrap().is_some(),
                "catch-all must match {:?}",
                path
            );
        }
    }

    #[test]
    fn catch_all_grafts_request_path() {
        let filter = RedirectFilter::new(vec![status_rule(
            "/",
            "http://newsite.com/base",
            StatusCode::FOUND,
        )]);

        let action = filter.evaluate("/page", None).unwrap().unwrap();
        assert_eq!(action.target, "http://newsite.com/base/page");
        assert_eq!(action.code, StatusCode::FOUND);
    }

    #[test]
    fn catch_all_preserves_trailing_slash() {
        let filter = RedirectFilter::new(vec![status_rule(
            "/",
            "http://example.com/x",
            StatusCode::FOUND,
        )]);

        let with = filter.evaluate("/y/", None).unwrap().unwrap();
        assert_eq!(with.target, "http://example.com/x/y/");

        let without = filter.evaluate("/y", None).unwrap().unwrap();
        assert_eq!(without.target, "http://example.com/x/y");
    }

    #[test]
    fn catch_all_keeps_host_port_in_join() {
        let filter = RedirectFilter::new(vec![status_rule(
            "/",
            "http://example.com:8080/x",
            StatusCode::FOUND,
        )]);

        let action = filter.evaluate("/y", None).unwrap().unwrap();
        assert_eq!(action.target, "http://example.com:8080/x/y");
    }

    #[test]
    fn catch_all_cleans_dot_dot_segments() {
        let filter = RedirectFilter::new(vec![status_rule(
            "/",
            "http://example.com/base",
            StatusCode::FOUND,
        )]);

        // `..` backtracks over the target path during the lexical join.
        let action = filter.evaluate("/../peer", None).unwrap().unwrap();
        assert_eq!(action.target, "http://example.com/peer");
    }

    #[test]
    fn request_query_overrides_target_query() {
        let filter = RedirectFilter::new(vec![status_rule(
            "/",
            "http://example.com?lang=en",
            StatusCode::FOUND,
        )]);

        let action = filter.evaluate("/page", Some("lang=fr")).unwrap().unwrap();
        assert_eq!(action.target, "http://example.com/page?lang=fr");
    }

    #[test]
    fn unmentioned_target_params_survive() {
        let filter = RedirectFilter::new(vec![status_rule(
            "/",
            "http://example.com/x?a=1&b=2",
            StatusCode::FOUND,
        )]);

        let action = filter.evaluate("/p", Some("b=9")).unwrap().unwrap();
        assert_eq!(action.target, "http://example.com/x/p?a=1&b=9");
    }

    #[test]
    fn only_first_request_value_survives() {
        let filter = RedirectFilter::new(vec![status_rule(
            "/",
            "http://example.com",
            StatusCode::FOUND,
        )]);

        let action = filter
            .evaluate("/p", Some("lang=fr&lang=de"))
            .unwrap()
            .unwrap();
        assert_eq!(action.target, "http://example.com/p?lang=fr");
    }

    #[test]
    fn no_query_means_no_question_mark() {
        let filter = RedirectFilter::new(vec![status_rule(
            "/",
            "http://example.com",
            StatusCode::FOUND,
        )]);

        let action = filter.evaluate("/p", None).unwrap().unwrap();
        assert_eq!(action.target, "http://example.com/p");

        let empty = filter.evaluate("/p", Some("")).unwrap().unwrap();
        assert_eq!(empty.target, "http://example.com/p");
    }

    #[test]
    fn malformed_catch_all_target_errors() {
        let filter = RedirectFilter::new(vec![status_rule(
            "/",
            "not a url",
            StatusCode::FOUND,
        )]);

        let err = filter.evaluate("/page", None).unwrap_err();
        assert_eq!(err.target, "not a url");
    }

    #[test]
    fn malformed_exact_target_never_errors() {
        // Exact rules pass `to` through verbatim, parsed by nobody.
        let filter = RedirectFilter::new(vec![status_rule(
            "/old",
            "not a url",
            StatusCode::MOVED_PERMANENTLY,
        )]);

        let action = filter.evaluate("/old", None).unwrap().unwrap();
        assert_eq!(action.target, "not a url");
    }

    #[test]
    fn empty_filter_matches_nothing() {
        let filter = RedirectFilter::default();
        assert!(filter.is_empty());
        assert!(filter.evaluate("/", None).unwrap().is_none());
    }

    #[test]
    fn join_skips_leading_empty_elements() {
        assert_eq!(join_paths(&["", "/x", "/y"]), "/x/y");
        assert_eq!(join_paths(&["", "", ""]), "");
        assert_eq!(join_paths(&["example.com", "/", "/p"]), "example.com/p");
    }

    #[test]
    fn clean_path_normalizes() {
        assert_eq!(clean_path("a//b"), "a/b");
        assert_eq!(clean_path("a/./b"), "a/b");
        assert_eq!(clean_path("a/b/.."), "a");
        assert_eq!(clean_path("a/../.."), "..");
        assert_eq!(clean_path("/a/../../b"), "/b");
        assert_eq!(clean_path("/.."), "/");
        assert_eq!(clean_path("a/b/"), "a/b");
    }
}
