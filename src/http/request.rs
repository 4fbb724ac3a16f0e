//! Request-side helpers: correlation ids and header extraction.
//!
//! # Responsibilities
//! - Mint a UUID request id for every inbound request and expose the
//!   header name the rest of the crate logs under
//! - Recover the client's original request URL behind a reverse proxy,
//!   for substitution into managed-config directives
//! - Pull the agent string used for format detection
//!
//! # Design Decisions
//! - `X-Forwarded-Proto`/`X-Forwarded-Host` win over the Host header so
//!   deployments behind TLS-terminating proxies hand out correct
//!   re-subscription URLs
//! - A request with no usable host still produces a URL; `localhost` is
//!   the fallback rather than an error, since the directive is advisory

use axum::http::header::{HOST, USER_AGENT};
use axum::http::{HeaderMap, Request, Uri};
use tower_http::request_id::{MakeRequestId, RequestId};

pub const X_REQUEST_ID: &str = "x-request-id";

const X_FORWARDED_PROTO: &str = "x-forwarded-proto";
const X_FORWARDED_HOST: &str = "x-forwarded-host";

/// Generates a fresh UUID v4 per request for `SetRequestIdLayer`.
#[derive(Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = uuid::Uuid::new_v4().to_string();
        id.parse().ok().map(RequestId::new)
    }
}

/// The request id minted by the middleware, for log correlation.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown")
}

/// The client's agent string, if it sent a readable one.
pub fn user_agent(headers: &HeaderMap) -> Option<&str> {
    headers.get(USER_AGENT).and_then(|value| value.to_str().ok())
}

/// Reconstructs the absolute URL the client requested.
///
/// Absolute-form request targets pass through unchanged. Otherwise the
/// scheme comes from `X-Forwarded-Proto` (first hop) or the listener's
/// own TLS mode, and the host from `X-Forwarded-Host`, then `Host`.
pub fn full_request_url(uri: &Uri, headers: &HeaderMap, tls: bool) -> String {
    if uri.scheme().is_some() {
        return uri.to_string();
    }
    let scheme = headers
        .get(X_FORWARDED_PROTO)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(if tls { "https" } else { "http" });
    let host = headers
        .get(X_FORWARDED_HOST)
        .or_else(|| headers.get(HOST))
        .and_then(|value| value.to_str().ok())
        .unwrap_or("localhost");
    format!("{scheme}://{host}{uri}")
}
