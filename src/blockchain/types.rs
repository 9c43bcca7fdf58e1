//! Ledger-specific types and error definitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Length in bytes of a decoded transaction signature.
pub const SIGNATURE_BYTES: usize = 64;

/// Transaction signature used as the correlation key for a submitted transaction.
///
/// Stored in its base58 text form, which is what the RPC node expects on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Signature(String);

impl Signature {
    /// Borrow the base58 form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Signature {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| ClientError::InvalidSignature(format!("{}: {}", s, e)))?;
        if bytes.len() != SIGNATURE_BYTES {
            return Err(ClientError::InvalidSignature(format!(
                "{}: expected {} bytes, got {}",
                s,
                SIGNATURE_BYTES,
                bytes.len()
            )));
        }
        Ok(Self(s.to_string()))
    }
}

impl TryFrom<String> for Signature {
    type Error = ClientError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Signature> for String {
    fn from(sig: Signature) -> Self {
        sig.0
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Commitment level requested when subscribing (e.g. "processed", "confirmed").
///
/// Passed through to the node untouched; older nodes still accept legacy names
/// such as "recent" or "singleGossip".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Commitment(String);

impl Commitment {
    pub fn new(level: impl Into<String>) -> Self {
        Self(level.into())
    }

    pub fn processed() -> Self {
        Self::new("processed")
    }

    pub fn confirmed() -> Self {
        Self::new("confirmed")
    }

    pub fn finalized() -> Self {
        Self::new("finalized")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Commitment {
    fn default() -> Self {
        Self::confirmed()
    }
}

impl fmt::Display for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque error payload reported by the ledger for a failed transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionError(pub serde_json::Value);

impl fmt::Display for TransactionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Status of a transaction as reported by `getSignatureStatuses`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureStatus {
    /// Slot the transaction was processed in.
    pub slot: u64,
    /// Blocks since the transaction was processed; `None` once rooted.
    pub confirmations: Option<u64>,
    /// Set when the transaction failed.
    pub err: Option<TransactionError>,
    /// Cluster commitment reached so far.
    #[serde(default)]
    pub confirmation_status: Option<String>,
}

impl SignatureStatus {
    /// Whether the ledger reports at least one confirmation.
    ///
    /// Rooted transactions report `confirmations: null` together with a
    /// `finalized` confirmation status.
    pub fn is_confirmed(&self) -> bool {
        match self.confirmations {
            Some(n) => n > 0,
            None => self.confirmation_status.as_deref() == Some("finalized"),
        }
    }
}

/// Result payload delivered to a signature subscription.
#[derive(Debug, Clone, PartialEq)]
pub struct SignatureNotification {
    /// Slot at which the notification was produced.
    pub slot: u64,
    /// Error if the transaction failed, `None` on success.
    pub err: Option<TransactionError>,
}

/// Handle identifying an active push subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors raised by the ledger client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Malformed signature string.
    #[error("Invalid signature {0}")]
    InvalidSignature(String),

    /// HTTP transport failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// WebSocket transport failed.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Node answered with a JSON-RPC error object.
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// Node response did not match the expected shape.
    #[error("Unexpected RPC response: {0}")]
    InvalidResponse(String),

    /// RPC request timed out.
    #[error("RPC timeout after {0} seconds")]
    Timeout(u64),

    /// Invalid endpoint URL.
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Subscription connection is gone.
    #[error("Subscription connection closed")]
    Closed,
}

/// Result type for ledger client operations.
pub type ClientResult<T> = Result<T, ClientError>;
