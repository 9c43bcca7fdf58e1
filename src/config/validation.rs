//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, intervals > 0)
//! - Check endpoint URLs and bind addresses parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: SigwaitConfig → Result<(), Vec<ValidationError>>

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::SigwaitConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("{field} has invalid URL '{value}'")]
    InvalidUrl { field: &'static str, value: String },

    #[error("{field} must use one of the schemes {expected}, got '{value}'")]
    WrongScheme {
        field: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("confirmation.commitment must not be empty")]
    EmptyCommitment,

    #[error("observability.metrics_address '{0}' is not a socket address")]
    InvalidMetricsAddress(String),
}

/// Check a loaded configuration, collecting every problem found.
pub fn validate_config(config: &SigwaitConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.confirmation.timeout_ms == 0 {
        errors.push(ValidationError::Zero {
            field: "confirmation.timeout_ms",
        });
    }
    if config.confirmation.poll_interval_ms == 0 {
        errors.push(ValidationError::Zero {
            field: "confirmation.poll_interval_ms",
        });
    }
    if config.rpc.request_timeout_secs == 0 {
        errors.push(ValidationError::Zero {
            field: "rpc.request_timeout_secs",
        });
    }
    if config.confirmation.commitment.as_str().trim().is_empty() {
        errors.push(ValidationError::EmptyCommitment);
    }

    check_url(&mut errors, "rpc.http_url", &config.rpc.http_url, &["http", "https"], "http/https");
    for url in &config.rpc.failover_urls {
        check_url(&mut errors, "rpc.failover_urls", url, &["http", "https"], "http/https");
    }
    check_url(&mut errors, "rpc.ws_url", &config.rpc.ws_url, &["ws", "wss"], "ws/wss");

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_url(
    errors: &mut Vec<ValidationError>,
    field: &'static str,
    value: &str,
    schemes: &[&str],
    expected: &'static str,
) {
    match url::Url::parse(value) {
        Ok(url) if schemes.contains(&url.scheme()) => {}
        Ok(_) => errors.push(ValidationError::WrongScheme {
            field,
            value: value.to_string(),
            expected,
        }),
        Err(_) => errors.push(ValidationError::InvalidUrl {
            field,
            value: value.to_string(),
        }),
    }
}
