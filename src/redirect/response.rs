//! Redirect response construction.

use axum::{
    body::Body,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
};

use crate::redirect::filter::RedirectAction;

impl IntoResponse for RedirectAction {
    fn into_response(self) -> Response {
        if self.meta {
            // Meta-refresh pages always go out as a plain 200; the rule's
            // status code applies to status redirects only.
            return Html(meta_refresh_page(&self.target)).into_response();
        }

        match header::HeaderValue::from_str(&self.target) {
            Ok(location) => Response::builder()
                .status(self.code)
                .header(header::LOCATION, location)
                .body(Body::empty())
                .unwrap(),
            Err(_) => {
                tracing::error!(target = %self.target, "Redirect target is not a valid header value");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

/// HTML document that bounces the client to `target` via a refresh
/// directive. The target is escaped before embedding.
fn meta_refresh_page(target: &str) -> String {
    format!(
        "<html>\n<head>\n  <meta http-equiv=\"refresh\" content=\"0;URL='{}'\">\n</head>\n<body>redirecting...</body>\n</html>",
        escape_html(target)
    )
}

/// Escape the characters HTML gives meaning to: `& < > " '`.
fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '\'' => escaped.push_str("&#39;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&#34;"),
            c => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_string(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn status_redirect_sets_location_and_code() {
        let action = RedirectAction {
            target: "/new".to_string(),
            code: StatusCode::MOVED_PERMANENTLY,
            meta: false,
        };

        let response = action.into_response();
        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/new"
        );
    }

    #[tokio::test]
    async fn meta_redirect_is_a_200_html_page() {
        let action = RedirectAction {
            target: "http://example.com/x".to_string(),
            code: StatusCode::TEMPORARY_REDIRECT,
            meta: true,
        };

        let response = action.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(header::LOCATION).is_none());

        let body = body_string(response).await;
        assert!(body.contains("meta http-equiv=\"refresh\""));
        assert!(body.contains("0;URL='http://example.com/x'"));
    }

    #[tokio::test]
    async fn meta_redirect_escapes_markup() {
        let action = RedirectAction {
            target: "/x'><script>alert(1)</script>".to_string(),
            code: StatusCode::FOUND,
            meta: true,
        };

        let body = body_string(action.into_response()).await;
        assert!(!body.contains("<script>"));
        assert!(body.contains("&lt;script&gt;"));
    }

    #[test]
    fn escapes_all_significant_characters() {
        assert_eq!(escape_html(r#"&<>"'"#), "&amp;&lt;&gt;&#34;&#39;");
        assert_eq!(escape_html("/plain/path"), "/plain/path");
    }
}
