//! Redirect middleware.
//! Short-circuits matched requests with a redirect response; everything
//! else continues down the pipeline untouched.

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::http::server::AppState;
use crate::observability::metrics;

pub async fn redirect_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let filter = state.filter.load();
    let decision = filter.evaluate(request.uri().path(), request.uri().query());

    match decision {
        Ok(Some(action)) => {
            tracing::debug!(
                path = %request.uri().path(),
                target = %action.target,
                code = %action.code,
                meta = action.meta,
                "Redirecting request"
            );
            metrics::record_redirect(action.code.as_u16(), action.meta);
            action.into_response()
        }
        Ok(None) => next.run(request).await,
        Err(e) => {
            tracing::error!(
                path = %request.uri().path(),
                error = %e,
                "Failed to compose redirect target"
            );
            (StatusCode::INTERNAL_SERVER_ERROR, "Invalid redirect target").into_response()
        }
    }
}
