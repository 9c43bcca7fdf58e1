//! JSON-RPC HTTP client with timeout and failover.
//!
//! # Responsibilities
//! - Send JSON-RPC 2.0 requests to the primary endpoint, then failovers
//! - Query signature statuses and the current slot
//! - Bound every request with the configured timeout

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::timeout;
use url::Url;

use crate::blockchain::types::{ClientError, ClientResult, Signature, SignatureStatus};
use crate::config::RpcConfig;

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// Node responses that wrap their value with the slot they were evaluated at.
#[derive(Debug, Deserialize)]
struct WithContext<T> {
    value: T,
}

/// JSON-RPC client over HTTP.
#[derive(Debug)]
pub struct RpcClient {
    http: reqwest::Client,
    /// Primary endpoint first, then failovers.
    endpoints: Vec<Url>,
    timeout_duration: Duration,
    next_id: AtomicU64,
}

impl RpcClient {
    /// Create a client for the configured endpoints.
    ///
    /// The primary URL must parse; invalid failover URLs are skipped.
    pub fn new(config: &RpcConfig) -> ClientResult<Self> {
        let primary: Url = config.http_url.parse().map_err(|e: url::ParseError| {
            ClientError::InvalidUrl {
                url: config.http_url.clone(),
                reason: e.to_string(),
            }
        })?;

        let mut endpoints = vec![primary];
        for url_str in &config.failover_urls {
            match url_str.parse() {
                Ok(url) => endpoints.push(url),
                Err(_) => tracing::warn!(url = %url_str, "Ignoring invalid failover RPC URL"),
            }
        }

        Ok(Self {
            http: reqwest::Client::new(),
            endpoints,
            timeout_duration: Duration::from_secs(config.request_timeout_secs),
            next_id: AtomicU64::new(1),
        })
    }

    /// Call `method` with `params`, trying each endpoint in turn.
    ///
    /// Transport failures and timeouts move on to the next endpoint. An error
    /// object from a node is returned as is.
    pub async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> ClientResult<T> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": self.next_id.fetch_add(1, Ordering::Relaxed),
            "method": method,
            "params": params,
        });

        let mut last_error = None;
        for (i, endpoint) in self.endpoints.iter().enumerate() {
            match timeout(self.timeout_duration, self.send::<T>(endpoint, &body)).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(e @ ClientError::Rpc { .. })) => return Err(e),
                Ok(Err(e)) => {
                    tracing::warn!(provider_idx = i, method, error = %e, "RPC error, trying next provider");
                    last_error = Some(e);
                }
                Err(_) => {
                    tracing::warn!(provider_idx = i, method, "RPC timeout, trying next provider");
                    last_error = Some(ClientError::Timeout(self.timeout_duration.as_secs()));
                }
            }
        }
        Err(last_error.unwrap_or_else(|| {
            ClientError::InvalidResponse("no RPC endpoints configured".to_string())
        }))
    }

    async fn send<T: DeserializeOwned>(&self, endpoint: &Url, body: &Value) -> ClientResult<T> {
        let response: RpcResponse<T> = self
            .http
            .post(endpoint.clone())
            .json(body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(error) = response.error {
            return Err(ClientError::Rpc {
                code: error.code,
                message: error.message,
            });
        }
        response
            .result
            .ok_or_else(|| ClientError::InvalidResponse("missing result".to_string()))
    }

    /// Statuses for `signatures`, in order; `None` where the node has no record.
    pub async fn get_signature_statuses(
        &self,
        signatures: &[Signature],
    ) -> ClientResult<Vec<Option<SignatureStatus>>> {
        let params = json!([
            signatures.iter().map(Signature::as_str).collect::<Vec<_>>(),
            { "searchTransactionHistory": false }
        ]);
        let response: WithContext<Vec<Option<SignatureStatus>>> =
            self.call("getSignatureStatuses", params).await?;

        if response.value.len() != signatures.len() {
            return Err(ClientError::InvalidResponse(format!(
                "expected {} statuses, got {}",
                signatures.len(),
                response.value.len()
            )));
        }
        Ok(response.value)
    }

    /// Status of a single signature.
    pub async fn get_signature_status(
        &self,
        signature: &Signature,
    ) -> ClientResult<Option<SignatureStatus>> {
        let mut statuses = self
            .get_signature_statuses(std::slice::from_ref(signature))
            .await?;
        Ok(statuses.pop().flatten())
    }

    /// Current slot of the node.
    pub async fn get_slot(&self) -> ClientResult<u64> {
        self.call("getSlot", json!([])).await
    }

    pub fn endpoints(&self) -> &[Url] {
        &self.endpoints
    }
}
