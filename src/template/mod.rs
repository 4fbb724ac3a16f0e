//! Template lookup and loading.
//!
//! # Data Flow
//! ```text
//! (apptoken, format)
//!     → selector.rs (binding table lookup → app name + locator)
//!     → source.rs (locator classification: http(s) URL or path
//!       under the templates dir → template text)
//! ```

pub mod selector;
pub mod source;

pub use selector::{SelectError, Selection, TemplateSelector};
pub use source::{TemplateError, TemplateSource};
