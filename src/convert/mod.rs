//! Subscription conversion core.
//!
//! # Data Flow
//! ```text
//! raw upstream text
//!     → Document::parse (clash.rs / surge.rs) → document + preserved metadata
//! template selection (token, format)
//!     → template source text → Document::parse
//!     → Document::merge (groups.rs resolves each membership list)
//!     → Document::serialize (metadata, live request URL)
//!     → output text in the client's wire format
//! ```
//!
//! # Design Decisions
//! - The format is resolved once at the HTTP boundary and passed down as an
//!   explicit `SubFormat`; nothing in the core re-inspects headers
//! - `Converter::convert` collapses every stage failure to `None` after
//!   logging it; the boundary answers with a fixed sentinel body instead of
//!   an error, so a broken upstream never turns into a client-visible 5xx
//! - Documents are request-scoped and owned by the pipeline; no sharing, no
//!   caching across requests

pub mod clash;
pub mod format;
pub mod groups;
pub mod surge;

use thiserror::Error;

use crate::template::{TemplateError, TemplateSelector, TemplateSource};

pub use format::SubFormat;

/// A document failed to parse in its expected grammar.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed {format} document: {detail}")]
    Malformed { format: SubFormat, detail: String },
}

/// The merge step could not combine the two documents.
#[derive(Debug, Error)]
pub enum MergeError {
    /// The original document has no proxies collection to merge from.
    #[error("original document has no proxies collection")]
    MissingProxies,
    /// The template has no group section to populate.
    #[error("template has no proxy group section")]
    MissingGroups,
    /// A proxy entry carries no usable name.
    #[error("proxy entry {index} has no name")]
    UnnamedProxy { index: usize },
    /// The two documents were parsed from different formats.
    #[error("original and template documents are different formats")]
    FormatMismatch,
}

/// Catch-all for a failed conversion, tagged with the failing stage.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("original document: {0}")]
    ParseOriginal(#[source] ParseError),
    #[error("template document: {0}")]
    ParseTemplate(#[source] ParseError),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error(transparent)]
    Merge(#[from] MergeError),
    #[error("serializing merged document: {0}")]
    Serialize(#[from] serde_yaml::Error),
}

/// Placeholder inside a preserved directive that stands for the URL of the
/// request being served.
pub const URL_PLACEHOLDER: &str = "{url}";

/// Format-specific metadata carried from a source document into the final
/// output. For Surge this is the managed-config directive line; Clash has
/// none.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PreservedMetadata {
    directive: Option<String>,
}

impl PreservedMetadata {
    pub fn none() -> Self {
        Self { directive: None }
    }

    pub fn directive(line: String) -> Self {
        Self {
            directive: Some(line),
        }
    }

    /// Keep this metadata when present, otherwise fall back to `other`.
    /// The original document's directive wins over the template's.
    pub fn or(self, other: Self) -> Self {
        if self.directive.is_some() {
            self
        } else {
            other
        }
    }

    pub fn directive_line(&self) -> Option<&str> {
        self.directive.as_deref()
    }

    /// The directive with every `{url}` placeholder replaced by the live
    /// request URL.
    pub fn render(&self, request_url: &str) -> Option<String> {
        self.directive
            .as_ref()
            .map(|line| line.replace(URL_PLACEHOLDER, request_url))
    }
}

/// A parsed document of either supported format.
#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    Clash(clash::ClashDocument),
    Surge(surge::SurgeDocument),
}

impl Document {
    pub fn parse(format: SubFormat, text: &str) -> Result<(Self, PreservedMetadata), ParseError> {
        match format {
            SubFormat::Clash => {
                clash::parse(text).map(|doc| (Self::Clash(doc), PreservedMetadata::none()))
            }
            SubFormat::Surge => {
                surge::parse(text).map(|(doc, meta)| (Self::Surge(doc), meta))
            }
        }
    }

    pub fn merge(original: Self, template: Self) -> Result<Self, MergeError> {
        match (original, template) {
            (Self::Clash(original), Self::Clash(template)) => {
                clash::merge(original, template).map(Self::Clash)
            }
            (Self::Surge(original), Self::Surge(template)) => {
                surge::merge(original, template).map(Self::Surge)
            }
            _ => Err(MergeError::FormatMismatch),
        }
    }

    pub fn serialize(
        &self,
        metadata: &PreservedMetadata,
        request_url: &str,
    ) -> Result<String, serde_yaml::Error> {
        match self {
            Self::Clash(doc) => clash::serialize(doc),
            Self::Surge(doc) => Ok(surge::serialize(doc, metadata, request_url)),
        }
    }
}

/// Drives the full pipeline for one request.
pub struct Converter {
    selector: TemplateSelector,
    source: TemplateSource,
}

impl Converter {
    pub fn new(selector: TemplateSelector, source: TemplateSource) -> Self {
        Self { selector, source }
    }

    /// Template lookup, exposed so the boundary can reject unknown tokens
    /// before fetching anything.
    pub fn selector(&self) -> &TemplateSelector {
        &self.selector
    }

    /// Run parse → select → load → parse → merge → serialize. Any stage
    /// failure is logged with its cause and collapsed to `None`; the caller
    /// decides what an empty result looks like on the wire.
    pub async fn convert(
        &self,
        format: SubFormat,
        token: &str,
        original_text: &str,
        request_url: &str,
    ) -> Option<String> {
        match self.run(format, token, original_text, request_url).await {
            Ok(text) => Some(text),
            Err(err) => {
                tracing::error!(format = %format, error = %err, "conversion failed");
                None
            }
        }
    }

    async fn run(
        &self,
        format: SubFormat,
        token: &str,
        original_text: &str,
        request_url: &str,
    ) -> Result<String, ConvertError> {
        let (original, original_meta) =
            Document::parse(format, original_text).map_err(ConvertError::ParseOriginal)?;

        let selection = self
            .selector
            .select(token, format)
            .map_err(TemplateError::Select)?;
        let template_text = self.source.load(selection.locator, format).await?;
        let (template, template_meta) =
            Document::parse(format, &template_text).map_err(ConvertError::ParseTemplate)?;

        let merged = Document::merge(original, template)?;
        let metadata = original_meta.or(template_meta);
        let text = merged.serialize(&metadata, request_url)?;
        tracing::debug!(app = %selection.app, format = %format, "conversion complete");
        Ok(text)
    }
}
