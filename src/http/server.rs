//! HTTP server setup and subscription dispatch.
//!
//! # Responsibilities
//! - Create the Axum router with the subscription and health handlers
//! - Wire up middleware (request ID, tracing, timeout)
//! - Bind plain or TLS listeners and serve with graceful shutdown
//! - Gate every request on the app token before any upstream traffic
//! - Dispatch: detect the client format, fetch, convert, answer

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{OriginalUri, Query, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use axum_server::tls_rustls::RustlsConfig;
use serde::Deserialize;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ServiceConfig;
use crate::convert::format::{SubFormat, BYPASS_PASSTHROUGH};
use crate::convert::Converter;
use crate::http::request::{self, UuidRequestId};
use crate::http::response;
use crate::observability::metrics;
use crate::template::{TemplateSelector, TemplateSource};
use crate::upstream::{FetchError, UpstreamClient};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub converter: Arc<Converter>,
    pub upstream: UpstreamClient,
    pub config: Arc<ServiceConfig>,
}

/// HTTP server for the subscription service.
pub struct HttpServer {
    router: Router,
    config: Arc<ServiceConfig>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: Arc<ServiceConfig>) -> Result<Self, FetchError> {
        let upstream = UpstreamClient::new(Duration::from_secs(config.upstream.timeout_secs))?;
        let selector = TemplateSelector::new(config.clone());
        let source = TemplateSource::new(config.templates.dir.clone(), upstream.clone());
        let converter = Arc::new(Converter::new(selector, source));

        let state = AppState {
            converter,
            upstream,
            config: config.clone(),
        };

        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ServiceConfig, state: AppState) -> Router {
        Router::new()
            .route("/sub", get(subscription_handler))
            .route("/", get(subscription_handler))
            .route("/healthz", get(health_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(TimeoutLayer::new(Duration::from_secs(
                        config.listener.request_timeout_secs,
                    ))),
            )
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            tls = self.config.listener.tls.is_some(),
            "HTTP server starting"
        );

        match &self.config.listener.tls {
            Some(tls) => {
                let rustls = RustlsConfig::from_pem_file(&tls.cert_path, &tls.key_path).await?;
                let handle = axum_server::Handle::new();
                tokio::spawn({
                    let handle = handle.clone();
                    async move {
                        shutdown_signal().await;
                        handle.graceful_shutdown(Some(Duration::from_secs(5)));
                    }
                });
                axum_server::from_tcp_rustls(listener.into_std()?, rustls)
                    .handle(handle)
                    .serve(self.router.into_make_service())
                    .await?;
            }
            None => {
                axum::serve(listener, self.router.into_make_service())
                    .with_graceful_shutdown(shutdown_signal())
                    .await?;
            }
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Query parameters of the subscription endpoint. Both are optional at
/// the extractor so rejections stay under this crate's control.
#[derive(Debug, Deserialize)]
struct SubQuery {
    apptoken: Option<String>,
    url: Option<String>,
}

/// Main subscription handler.
/// Validates the token, fetches the provider document, and converts it
/// for the requesting client.
async fn subscription_handler(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Query(query): Query<SubQuery>,
    headers: HeaderMap,
) -> Response {
    let start = Instant::now();
    let request_id = request::request_id(&headers).to_string();
    let agent = request::user_agent(&headers);
    let format = agent.and_then(SubFormat::detect);
    let token = query.apptoken.as_deref().unwrap_or_default();

    tracing::debug!(
        request_id = %request_id,
        agent = agent.unwrap_or("none"),
        format = ?format,
        "Subscription request"
    );

    // Token gate before any upstream traffic. A recognized client must
    // also have a template registered for its format.
    let known = match format {
        Some(format) => state.converter.selector().select(token, format).is_ok(),
        None => state.converter.selector().knows_token(token),
    };
    if !known {
        tracing::warn!(request_id = %request_id, "Rejecting unknown token");
        metrics::record_request(format_label(format), "rejected", start);
        return response::invalid_token();
    }

    let url = match query.url.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
        Some(url) if url::Url::parse(url).is_ok() => url,
        _ => {
            tracing::warn!(request_id = %request_id, "Missing or invalid url parameter");
            metrics::record_request(format_label(format), "bad_request", start);
            return response::missing_url();
        }
    };

    let upstream = match state.upstream.fetch(url, agent).await {
        Ok(document) => document,
        Err(err) => {
            tracing::error!(request_id = %request_id, error = %err, "Upstream fetch failed");
            metrics::record_request(format_label(format), "upstream_failed", start);
            return response::upstream_failed();
        }
    };

    let format = match format {
        Some(format) => format,
        None => {
            // Unrecognized client with a valid token: hand the provider
            // document back untouched.
            let passthrough =
                response::passthrough_headers(BYPASS_PASSTHROUGH, upstream.headers());
            metrics::record_request("none", "bypass", start);
            return response::subscription(passthrough, upstream.into_body());
        }
    };

    let request_url =
        request::full_request_url(&uri, &headers, state.config.listener.tls.is_some());
    let passthrough =
        response::passthrough_headers(format.passthrough_headers(), upstream.headers());

    match state
        .converter
        .convert(format, token, upstream.body(), &request_url)
        .await
    {
        Some(body) => {
            metrics::record_request(format.name(), "converted", start);
            response::subscription(passthrough, body)
        }
        None => {
            metrics::record_request(format.name(), "sentinel", start);
            response::sentinel()
        }
    }
}

async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

fn format_label(format: Option<SubFormat>) -> &'static str {
    match format {
        Some(format) => format.name(),
        None => "none",
    }
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received");
}
