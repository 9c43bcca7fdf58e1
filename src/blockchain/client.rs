//! Ledger client combining HTTP polling and WebSocket subscriptions.
//!
//! # Responsibilities
//! - Connect to the node's JSON-RPC and pubsub endpoints
//! - Expose both as a [`SignatureSource`] for confirmation waits
//! - Provide a health check for node connectivity

use std::time::Duration;

use crate::blockchain::pubsub::PubsubClient;
use crate::blockchain::rpc::RpcClient;
use crate::blockchain::types::{
    ClientResult, Commitment, Signature, SignatureStatus, SubscriptionId,
};
use crate::config::RpcConfig;
use crate::confirmation::{NotificationCallback, SignatureSource};

/// Client for a ledger node.
pub struct LedgerClient {
    rpc: RpcClient,
    pubsub: PubsubClient,
    config: RpcConfig,
}

impl LedgerClient {
    /// Create a client and open the pubsub connection.
    ///
    /// An unreachable HTTP endpoint is only logged; polling recovers on its own.
    pub async fn connect(config: RpcConfig) -> ClientResult<Self> {
        let rpc = RpcClient::new(&config)?;
        let pubsub = PubsubClient::connect(
            &config.ws_url,
            Duration::from_secs(config.request_timeout_secs),
        )
        .await?;

        let client = Self {
            rpc,
            pubsub,
            config,
        };

        match client.rpc.get_slot().await {
            Ok(slot) => tracing::info!(
                rpc_url = %client.config.http_url,
                ws_url = %client.config.ws_url,
                slot,
                "Ledger client initialized"
            ),
            Err(e) => tracing::warn!(
                error = %e,
                "Ledger client initialized but slot query failed"
            ),
        }

        Ok(client)
    }

    /// Check if the node answers RPC requests.
    pub async fn is_healthy(&self) -> bool {
        self.pubsub.is_connected() && self.rpc.get_slot().await.is_ok()
    }

    pub fn rpc(&self) -> &RpcClient {
        &self.rpc
    }

    pub fn pubsub(&self) -> &PubsubClient {
        &self.pubsub
    }

    pub fn config(&self) -> &RpcConfig {
        &self.config
    }
}

impl SignatureSource for LedgerClient {
    fn subscribe(
        &self,
        signature: &Signature,
        commitment: &Commitment,
        callback: NotificationCallback,
    ) -> ClientResult<SubscriptionId> {
        self.pubsub.subscribe_signature(signature, commitment, callback)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> ClientResult<()> {
        self.pubsub.unsubscribe(id)
    }

    async fn signature_status(
        &self,
        signature: &Signature,
    ) -> ClientResult<Option<SignatureStatus>> {
        self.rpc.get_signature_status(signature).await
    }
}

impl std::fmt::Debug for LedgerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerClient")
            .field("rpc_url", &self.config.http_url)
            .field("ws_url", &self.config.ws_url)
            .field("timeout_secs", &self.config.request_timeout_secs)
            .finish()
    }
}
