//! Subscription template weaving service library.

pub mod config;
pub mod convert;
pub mod http;
pub mod observability;
pub mod template;
pub mod upstream;

pub use config::{load_config, ServiceConfig};
pub use convert::{Converter, Document, SubFormat};
pub use http::HttpServer;
