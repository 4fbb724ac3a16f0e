//! Plain GET against the subscription provider.
//!
//! # Design Decisions
//! - The client's own User-Agent is forwarded upstream so the provider
//!   serves the matching wire format; the service never invents one
//! - Redirects are followed, matching how provider links are published
//! - A non-success status is an error, never treated as a document

use std::time::Duration;

use reqwest::header::{HeaderMap, USER_AGENT};
use reqwest::StatusCode;
use thiserror::Error;

/// The upstream fetch failed before a usable document arrived.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("building upstream client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("fetching {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("upstream returned {status} for {url}")]
    Status { url: String, status: StatusCode },
}

/// A fetched document: body text plus the response headers the passthrough
/// layer may copy to the client.
#[derive(Debug)]
pub struct FetchedDocument {
    body: String,
    headers: HeaderMap,
}

impl FetchedDocument {
    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn into_body(self) -> String {
        self.body
    }

    /// Case-insensitive lookup; values that are not valid UTF-8 read as
    /// absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// The full upstream header map, for passthrough copying.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

#[derive(Clone)]
pub struct UpstreamClient {
    client: reqwest::Client,
}

impl UpstreamClient {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self { client })
    }

    pub async fn fetch(
        &self,
        url: &str,
        user_agent: Option<&str>,
    ) -> Result<FetchedDocument, FetchError> {
        let mut request = self.client.get(url);
        if let Some(user_agent) = user_agent {
            request = request.header(USER_AGENT, user_agent);
        }
        let response = request.send().await.map_err(|err| FetchError::Transport {
            url: url.to_string(),
            source: err,
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        let headers = response.headers().clone();
        let body = response.text().await.map_err(|err| FetchError::Transport {
            url: url.to_string(),
            source: err,
        })?;
        Ok(FetchedDocument { body, headers })
    }
}
