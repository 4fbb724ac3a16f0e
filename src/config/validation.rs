//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check binding integrity (tokens unique and non-empty, each app
//!   registers at least one template)
//! - Validate value ranges (timeouts > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashMap;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::ServiceConfig;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("listener.bind_address {0:?} is not a valid socket address")]
    BadBindAddress(String),
    #[error("observability.metrics_address {0:?} is not a valid socket address")]
    BadMetricsAddress(String),
    #[error("listener.tls needs both cert_path and key_path")]
    IncompleteTls,
    #[error("listener.request_timeout_secs must be greater than zero")]
    ZeroRequestTimeout,
    #[error("upstream.timeout_secs must be greater than zero")]
    ZeroUpstreamTimeout,
    #[error("app #{0} has an empty name")]
    EmptyAppName(usize),
    #[error("app {0:?} has an empty token")]
    EmptyToken(String),
    #[error("apps {0:?} and {1:?} share a token")]
    DuplicateToken(String, String),
    #[error("app {0:?} registers no templates")]
    NoTemplates(String),
}

/// Validate semantic constraints on an already-deserialized config.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BadBindAddress(
            config.listener.bind_address.clone(),
        ));
    }
    if let Some(tls) = &config.listener.tls {
        if tls.cert_path.is_empty() || tls.key_path.is_empty() {
            errors.push(ValidationError::IncompleteTls);
        }
    }
    if config.listener.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }
    if config.upstream.timeout_secs == 0 {
        errors.push(ValidationError::ZeroUpstreamTimeout);
    }
    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::BadMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    let mut token_owner: HashMap<&str, &str> = HashMap::new();
    for (index, app) in config.apps.iter().enumerate() {
        if app.name.is_empty() {
            errors.push(ValidationError::EmptyAppName(index));
        }
        if app.token.is_empty() {
            errors.push(ValidationError::EmptyToken(app.name.clone()));
        } else if let Some(first) = token_owner.insert(&app.token, &app.name) {
            errors.push(ValidationError::DuplicateToken(
                first.to_string(),
                app.name.clone(),
            ));
        }
        if app.templates.clash.is_none() && app.templates.surge.is_none() {
            errors.push(ValidationError::NoTemplates(app.name.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
