//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the redirect middleware stack
//! - Wire up middleware (tracing, timeout, request ID)
//! - Bind server to listener
//! - Forward unmatched requests to the upstream
//! - Apply redirect rule reloads without restarting

use axum::{
    body::Body,
    extract::State,
    http::{
        uri::{Authority, PathAndQuery, Scheme},
        Request, StatusCode, Uri,
    },
    middleware,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use arc_swap::ArcSwap;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::schema::{GatewayConfig, RedirectRuleConfig, UpstreamConfig};
use crate::http::middleware::redirect::redirect_middleware;
use crate::http::request::{RequestIdLayer, X_REQUEST_ID};
use crate::lifecycle::ShutdownSignal;
use crate::observability::metrics;
use crate::redirect::RedirectFilter;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Live rule table; reloads swap in a fresh filter.
    pub filter: Arc<ArcSwap<RedirectFilter>>,
    pub client: Client<HttpConnector, Body>,
    pub upstream: UpstreamConfig,
}

/// HTTP server for the redirect gateway.
pub struct HttpServer {
    router: Router,
    filter: Arc<ArcSwap<RedirectFilter>>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: GatewayConfig) -> Self {
        let filter = Arc::new(ArcSwap::from_pointee(RedirectFilter::from_config(
            &config.redirects,
        )));

        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        let state = AppState {
            filter: filter.clone(),
            client,
            upstream: config.upstream.clone(),
        };

        let router = Self::build_router(&config, state);
        Self { router, filter }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(forward_handler))
            .route("/", any(forward_handler))
            .with_state(state.clone())
            .layer(middleware::from_fn_with_state(state, redirect_middleware))
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            )))
            .layer(RequestIdLayer)
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// `rule_updates` feeds reloaded rule tables that are swapped into the
    /// live filter; `shutdown` stops the accept loop.
    pub async fn run(
        self,
        listener: TcpListener,
        mut rule_updates: mpsc::UnboundedReceiver<Vec<RedirectRuleConfig>>,
        shutdown: ShutdownSignal,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let filter = self.filter.clone();
        tokio::spawn(async move {
            while let Some(rules) = rule_updates.recv().await {
                filter.store(Arc::new(RedirectFilter::from_config(&rules)));
                tracing::info!(rules = rules.len(), "Redirect rules swapped in");
            }
        });

        let app = self.router.into_make_service();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown.triggered())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Delegate stage for requests no redirect rule claimed.
/// Rewrites the URI authority to the upstream and proxies the request.
async fn forward_handler(
    State(state): State<AppState>,
    mut request: Request<Body>,
) -> impl IntoResponse {
    let start_time = Instant::now();
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();
    let method = request.method().to_string();

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %request.uri().path(),
        "Forwarding request upstream"
    );

    let authority = match Authority::from_str(&state.upstream.address) {
        Ok(authority) => authority,
        Err(e) => {
            tracing::error!(upstream = %state.upstream.address, error = %e, "Invalid upstream address");
            return (StatusCode::BAD_GATEWAY, "Invalid upstream address").into_response();
        }
    };

    let mut uri_parts = request.uri().clone().into_parts();
    uri_parts.scheme = Some(Scheme::HTTP);
    uri_parts.authority = Some(authority);
    if uri_parts.path_and_query.is_none() {
        uri_parts.path_and_query = Some(PathAndQuery::from_static("/"));
    }
    match Uri::from_parts(uri_parts) {
        Ok(uri) => *request.uri_mut() = uri,
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Failed to rewrite upstream URI");
            return (StatusCode::BAD_GATEWAY, "Invalid upstream URI").into_response();
        }
    }

    match state.client.request(request).await {
        Ok(response) => {
            let status = response.status();
            metrics::record_forward(&method, status.as_u16(), start_time);

            let (parts, body) = response.into_parts();
            Response::from_parts(parts, Body::new(body)).into_response()
        }
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Upstream error");
            metrics::record_forward(&method, 502, start_time);
            (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
        }
    }
}
