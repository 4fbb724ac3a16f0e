//! Response construction and upstream header passthrough.
//!
//! # Responsibilities
//! - Build every response shape the subscription endpoint returns
//! - Copy the per-format allowlist of upstream headers to the client
//! - Keep the rejection and sentinel bodies identical across handlers
//!
//! # Design Decisions
//! - Conversion failure is a 200 with a sentinel body, not an error
//!   status; client apps treat non-2xx as a dead subscription and a
//!   sentinel body keeps the profile slot alive for a manual refresh
//! - Passthrough is allowlist-only; unlisted upstream headers never
//!   reach the client
//! - Header values cross as raw bytes, untouched by any re-encoding

use axum::http::{HeaderMap, HeaderName, StatusCode};
use axum::response::{IntoResponse, Response};

/// Body returned with 200 when the upstream document cannot be converted.
pub const SENTINEL_BODY: &str = "Nothing!";

/// Body returned with 401 for tokens outside the binding table.
pub const INVALID_TOKEN_BODY: &str = "Invalid apptoken";

/// Copies the named upstream headers into a fresh map, skipping absent
/// ones. Names must be lowercase.
pub fn passthrough_headers(names: &[&'static str], upstream: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for &name in names {
        if let Some(value) = upstream.get(name) {
            headers.insert(HeaderName::from_static(name), value.clone());
        }
    }
    headers
}

/// A successful subscription body, converted or raw, with its
/// passthrough headers.
pub fn subscription(headers: HeaderMap, body: String) -> Response {
    (StatusCode::OK, headers, body).into_response()
}

pub fn sentinel() -> Response {
    (StatusCode::OK, SENTINEL_BODY).into_response()
}

pub fn invalid_token() -> Response {
    (StatusCode::UNAUTHORIZED, INVALID_TOKEN_BODY).into_response()
}

pub fn missing_url() -> Response {
    (StatusCode::BAD_REQUEST, "Missing url").into_response()
}

pub fn upstream_failed() -> Response {
    (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
}
