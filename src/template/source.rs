//! Resolving a template locator to its text.

use std::path::PathBuf;

use thiserror::Error;

use crate::convert::format::SubFormat;
use crate::template::selector::SelectError;
use crate::upstream::UpstreamClient;

/// Anything that keeps a template from reaching the merge step.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error(transparent)]
    Select(#[from] SelectError),
    #[error("loading template {locator}: {detail}")]
    Load { locator: String, detail: String },
}

/// Loads template text from disk or over HTTP, depending on the locator.
pub struct TemplateSource {
    dir: PathBuf,
    client: UpstreamClient,
}

impl TemplateSource {
    pub fn new(dir: impl Into<PathBuf>, client: UpstreamClient) -> Self {
        Self {
            dir: dir.into(),
            client,
        }
    }

    /// Load one template. Locators with an http(s) scheme are fetched with
    /// the format name as User-Agent; anything else is read as a path under
    /// the configured templates directory.
    pub async fn load(&self, locator: &str, format: SubFormat) -> Result<String, TemplateError> {
        if locator.starts_with("http://") || locator.starts_with("https://") {
            let fetched = self
                .client
                .fetch(locator, Some(format.name()))
                .await
                .map_err(|err| load_error(locator, err))?;
            Ok(fetched.into_body())
        } else {
            let path = self.dir.join(locator);
            tokio::fs::read_to_string(&path)
                .await
                .map_err(|err| load_error(locator, err))
        }
    }
}

fn load_error(locator: &str, err: impl std::fmt::Display) -> TemplateError {
    TemplateError::Load {
        locator: locator.to_string(),
        detail: err.to_string(),
    }
}
