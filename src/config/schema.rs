//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for sigwait.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::blockchain::types::Commitment;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SigwaitConfig {
    /// Ledger RPC endpoints.
    pub rpc: RpcConfig,

    /// Confirmation wait settings.
    pub confirmation: ConfirmationConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Ledger RPC endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RpcConfig {
    /// JSON-RPC HTTP endpoint used for status polling.
    pub http_url: String,

    /// Failover JSON-RPC HTTP endpoints.
    #[serde(default)]
    pub failover_urls: Vec<String>,

    /// WebSocket endpoint used for signature subscriptions.
    pub ws_url: String,

    /// RPC request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            http_url: "https://api.devnet.solana.com".to_string(),
            failover_urls: Vec::new(),
            ws_url: "wss://api.devnet.solana.com".to_string(),
            request_timeout_secs: 10,
        }
    }
}

/// Settings for a single confirmation wait.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ConfirmationConfig {
    /// Overall deadline in milliseconds.
    pub timeout_ms: u64,

    /// Pause between status polls in milliseconds.
    pub poll_interval_ms: u64,

    /// Commitment level used for the signature subscription.
    pub commitment: Commitment,

    /// Poll `getSignatureStatuses` alongside the subscription.
    pub polling_enabled: bool,
}

impl ConfirmationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 15_000,
            poll_interval_ms: 2_000,
            commitment: Commitment::confirmed(),
            polling_enabled: true,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
