//! Upstream subscription transport.

pub mod client;

pub use client::{FetchError, FetchedDocument, UpstreamClient};
