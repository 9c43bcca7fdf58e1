//! Ledger integration subsystem.
//!
//! # Data Flow
//! ```text
//! RpcConfig (HTTP + WebSocket endpoints)
//!     → rpc.rs (getSignatureStatuses over HTTP, with failover)
//!     → pubsub.rs (signatureSubscribe over WebSocket)
//!     → client.rs (both behind the SignatureSource trait)
//! ```
//!
//! # Constraints
//! - HTTP calls and the WebSocket handshake have configurable timeouts
//! - Subscribing never blocks on the network
//! - Graceful degradation when the HTTP endpoint is unreachable

pub mod client;
pub mod pubsub;
pub mod rpc;
pub mod types;

pub use client::LedgerClient;
pub use types::{ClientError, Commitment, Signature, SignatureStatus};
