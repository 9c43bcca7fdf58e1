//! WebSocket signature subscriptions.
//!
//! # Data Flow
//! ```text
//! subscribe_signature() ──▶ command channel ──▶ driver task ──▶ signatureSubscribe
//!                                                   │
//! callback ◀── signatureNotification ◀──────────────┘
//! ```
//!
//! The driver task owns the socket. Handles are allocated locally so that
//! subscribing never waits on the network; the node's subscription number is
//! mapped to the handle once the node acknowledges the request.
//!
//! The node drops a signature subscription after its first notification, so
//! the driver forgets it at that point as well.

use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use crate::blockchain::types::{
    ClientError, ClientResult, Commitment, Signature, SignatureNotification, SubscriptionId,
    TransactionError,
};
use crate::confirmation::NotificationCallback;

enum Command {
    Subscribe {
        handle: SubscriptionId,
        signature: Signature,
        commitment: Commitment,
        callback: NotificationCallback,
    },
    Unsubscribe {
        handle: SubscriptionId,
    },
}

/// Client for the node's WebSocket pubsub endpoint.
pub struct PubsubClient {
    commands: mpsc::UnboundedSender<Command>,
    next_handle: AtomicU64,
}

impl PubsubClient {
    /// Open the WebSocket connection and start the driver task.
    ///
    /// Fails with [`ClientError::Timeout`] if the handshake does not finish
    /// within `connect_timeout`.
    pub async fn connect(url: &str, connect_timeout: Duration) -> ClientResult<Self> {
        let (stream, _response) = timeout(connect_timeout, connect_async(url))
            .await
            .map_err(|_| {
                tracing::warn!(url = %url, "Pubsub handshake timed out");
                ClientError::Timeout(connect_timeout.as_secs())
            })??;
        let (tx, rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            let (mut sink, mut source) = stream.split();
            let mut driver = Driver::default();
            let mut rx = rx;

            loop {
                let outgoing = tokio::select! {
                    command = rx.recv() => match command {
                        Some(command) => driver.handle_command(command),
                        None => {
                            let _ = sink.close().await;
                            break;
                        }
                    },
                    message = source.next() => match message {
                        Some(Ok(Message::Text(text))) => driver.handle_text(text.as_str()),
                        Some(Ok(Message::Close(frame))) => {
                            tracing::warn!(frame = ?frame, "Pubsub connection closed by node");
                            break;
                        }
                        Some(Ok(_)) => None,
                        Some(Err(e)) => {
                            tracing::warn!(error = %e, "Pubsub connection failed");
                            break;
                        }
                        None => break,
                    },
                };

                if let Some(request) = outgoing {
                    if let Err(e) = sink.send(Message::text(request.to_string())).await {
                        tracing::warn!(error = %e, "Failed to send pubsub request");
                        break;
                    }
                }
            }

            tracing::debug!(
                active = driver.active.len(),
                pending = driver.pending.len(),
                "Pubsub driver stopped"
            );
        });

        tracing::info!(url = %url, "Pubsub connection established");
        Ok(Self {
            commands: tx,
            next_handle: AtomicU64::new(1),
        })
    }

    /// Subscribe to the outcome of `signature` at `commitment`.
    ///
    /// Fails with [`ClientError::Closed`] once the connection is gone.
    pub fn subscribe_signature(
        &self,
        signature: &Signature,
        commitment: &Commitment,
        callback: NotificationCallback,
    ) -> ClientResult<SubscriptionId> {
        let handle = SubscriptionId(self.next_handle.fetch_add(1, Ordering::Relaxed));
        self.commands
            .send(Command::Subscribe {
                handle,
                signature: signature.clone(),
                commitment: commitment.clone(),
                callback,
            })
            .map_err(|_| ClientError::Closed)?;
        Ok(handle)
    }

    /// Drop a subscription. Unknown or already finished handles are ignored.
    pub fn unsubscribe(&self, handle: SubscriptionId) -> ClientResult<()> {
        if self.commands.send(Command::Unsubscribe { handle }).is_err() {
            // Nothing is left to release once the connection is gone.
            tracing::debug!(subscription = %handle, "Pubsub connection already closed");
        }
        Ok(())
    }

    /// Whether the driver task is still running.
    pub fn is_connected(&self) -> bool {
        !self.commands.is_closed()
    }
}

impl std::fmt::Debug for PubsubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PubsubClient")
            .field("connected", &self.is_connected())
            .finish()
    }
}

enum Pending {
    Subscribe {
        handle: SubscriptionId,
        callback: NotificationCallback,
    },
    Unsubscribe {
        subscription: u64,
    },
}

struct Active {
    handle: SubscriptionId,
    callback: NotificationCallback,
}

/// Subscription bookkeeping, kept apart from the socket.
#[derive(Default)]
struct Driver {
    next_request_id: u64,
    /// Requests awaiting a response, by JSON-RPC id.
    pending: HashMap<u64, Pending>,
    /// Live subscriptions, by node subscription number.
    active: HashMap<u64, Active>,
    by_handle: HashMap<SubscriptionId, u64>,
    /// Released while the subscribe request was still in flight.
    cancelled: HashSet<SubscriptionId>,
}

#[derive(Debug, Deserialize)]
struct Incoming {
    id: Option<u64>,
    result: Option<Value>,
    error: Option<Value>,
    method: Option<String>,
    params: Option<NotificationParams>,
}

#[derive(Debug, Deserialize)]
struct NotificationParams {
    subscription: u64,
    result: NotificationResult,
}

#[derive(Debug, Deserialize)]
struct NotificationResult {
    context: NotificationContext,
    value: Value,
}

#[derive(Debug, Deserialize)]
struct NotificationContext {
    slot: u64,
}

impl Driver {
    fn request(&mut self, method: &str, params: Value, pending: Pending) -> Value {
        self.next_request_id += 1;
        let id = self.next_request_id;
        self.pending.insert(id, pending);
        json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params })
    }

    fn handle_command(&mut self, command: Command) -> Option<Value> {
        match command {
            Command::Subscribe {
                handle,
                signature,
                commitment,
                callback,
            } => Some(self.request(
                "signatureSubscribe",
                json!([signature.as_str(), { "commitment": commitment.as_str() }]),
                Pending::Subscribe { handle, callback },
            )),
            Command::Unsubscribe { handle } => {
                if let Some(subscription) = self.by_handle.remove(&handle) {
                    self.active.remove(&subscription);
                    return Some(self.unsubscribe_request(subscription));
                }
                let in_flight = self.pending.values().any(
                    |p| matches!(p, Pending::Subscribe { handle: h, .. } if *h == handle),
                );
                if in_flight {
                    self.cancelled.insert(handle);
                }
                None
            }
        }
    }

    fn unsubscribe_request(&mut self, subscription: u64) -> Value {
        self.request(
            "signatureUnsubscribe",
            json!([subscription]),
            Pending::Unsubscribe { subscription },
        )
    }

    fn handle_text(&mut self, text: &str) -> Option<Value> {
        let incoming: Incoming = match serde_json::from_str(text) {
            Ok(incoming) => incoming,
            Err(e) => {
                tracing::warn!(error = %e, "Unparseable pubsub message");
                return None;
            }
        };

        if incoming.method.as_deref() == Some("signatureNotification") {
            if let Some(params) = incoming.params {
                self.handle_notification(params);
            }
            return None;
        }

        let id = incoming.id?;
        match self.pending.remove(&id)? {
            Pending::Subscribe { handle, callback } => {
                if let Some(error) = incoming.error {
                    tracing::warn!(subscription = %handle, error = %error, "Signature subscription refused");
                    self.cancelled.remove(&handle);
                    return None;
                }
                let Some(subscription) = incoming.result.as_ref().and_then(Value::as_u64) else {
                    tracing::warn!(subscription = %handle, "Subscription acknowledgement without a number");
                    self.cancelled.remove(&handle);
                    return None;
                };
                if self.cancelled.remove(&handle) {
                    return Some(self.unsubscribe_request(subscription));
                }
                self.active.insert(subscription, Active { handle, callback });
                self.by_handle.insert(handle, subscription);
                None
            }
            Pending::Unsubscribe { subscription } => {
                if let Some(error) = incoming.error {
                    tracing::debug!(subscription, error = %error, "Unsubscribe refused");
                }
                None
            }
        }
    }

    fn handle_notification(&mut self, params: NotificationParams) {
        let Some(active) = self.active.remove(&params.subscription) else {
            tracing::debug!(subscription = params.subscription, "Notification for unknown subscription");
            return;
        };
        self.by_handle.remove(&active.handle);

        let err = params
            .result
            .value
            .get("err")
            .filter(|err| !err.is_null())
            .cloned()
            .map(TransactionError);

        (active.callback)(SignatureNotification {
            slot: params.result.context.slot,
            err,
        });
    }
}
