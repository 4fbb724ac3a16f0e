//! HTTP boundary subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, token gate, format detection)
//!     → request.rs (request ID, agent string, original URL)
//!     → [upstream fetch] → [conversion pipeline]
//!     → response.rs (passthrough headers, sentinel and rejection bodies)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{UuidRequestId, X_REQUEST_ID};
pub use server::HttpServer;
