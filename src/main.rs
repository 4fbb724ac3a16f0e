//! Subscription weaving service (subweave)
//!
//! Fetches proxy subscription documents from providers and re-serves
//! them with the provider's proxies woven into per-application group
//! templates, in the client's native wire format.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌───────────────────────────────────────────────┐
//!                     │              SUBWEAVE SERVICE                 │
//!                     │                                               │
//!   Client Request    │  ┌────────┐    ┌──────────┐    ┌──────────┐  │
//!   ──────────────────┼─▶│  http  │───▶│ template │───▶│ upstream │──┼──▶ Provider
//!                     │  │ server │    │ selector │    │  client  │  │
//!                     │  └────────┘    └──────────┘    └─────┬────┘  │
//!                     │       ▲                              │       │
//!                     │       │                              ▼       │
//!   Client Response   │  ┌────┴────┐    ┌────────────────────────┐   │
//!   ◀─────────────────┼──│response │◀───│ convert (parse, merge, │   │
//!                     │  │headers  │    │ groups, serialize)     │   │
//!                     │  └─────────┘    └────────────────────────┘   │
//!                     │                                               │
//!                     │  Cross-cutting: config, observability         │
//!                     └───────────────────────────────────────────────┘
//! ```

use std::path::Path;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use subweave::config::load_config;
use subweave::http::HttpServer;
use subweave::observability::metrics;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "subweave=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("subweave starting");

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());
    let config = Arc::new(load_config(Path::new(&config_path))?);

    tracing::info!(
        config_path = %config_path,
        bind_address = %config.listener.bind_address,
        apps = config.apps.len(),
        "Configuration loaded"
    );

    // Bind TCP listener
    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(
        address = %local_addr,
        "Listening for connections"
    );

    // Metrics exporter on its own listener
    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    // Create and run HTTP server
    let server = HttpServer::new(config)?;
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
