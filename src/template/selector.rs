//! Binding-table lookup: which template serves a given token and format.

use std::sync::Arc;

use thiserror::Error;

use crate::config::schema::ServiceConfig;
use crate::convert::format::SubFormat;

/// Unknown token, or no template of the requested format registered for it.
/// The two cases are deliberately indistinguishable to callers.
#[derive(Debug, Error)]
pub enum SelectError {
    #[error("unknown token or no {0} template registered")]
    NotFound(SubFormat),
}

/// A successful lookup: the owning application and the locator to load.
#[derive(Debug, Clone, Copy)]
pub struct Selection<'a> {
    pub app: &'a str,
    pub locator: &'a str,
}

/// Read-only view over the `[[apps]]` binding table.
pub struct TemplateSelector {
    config: Arc<ServiceConfig>,
}

impl TemplateSelector {
    pub fn new(config: Arc<ServiceConfig>) -> Self {
        Self { config }
    }

    pub fn select(&self, token: &str, format: SubFormat) -> Result<Selection<'_>, SelectError> {
        let app = self
            .config
            .apps
            .iter()
            .find(|app| app.token == token)
            .ok_or(SelectError::NotFound(format))?;
        let locator = match format {
            SubFormat::Clash => app.templates.clash.as_deref(),
            SubFormat::Surge => app.templates.surge.as_deref(),
        };
        match locator {
            Some(locator) => Ok(Selection {
                app: &app.name,
                locator,
            }),
            None => Err(SelectError::NotFound(format)),
        }
    }

    /// Token membership check, independent of format. Used to gate clients
    /// whose agent string matches no known format.
    pub fn knows_token(&self, token: &str) -> bool {
        self.config.apps.iter().any(|app| app.token == token)
    }
}
