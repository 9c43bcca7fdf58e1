//! Shared utilities for integration testing.

#![allow(dead_code)]

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use sigwait::blockchain::types::{
    ClientError, ClientResult, Commitment, Signature, SignatureNotification, SignatureStatus,
    SubscriptionId,
};
use sigwait::confirmation::{NotificationCallback, SignatureSource};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::Message;

pub fn signature() -> Signature {
    "5VERv8NMvzbJMEkV8xnrLkEaWRtSz9CosKDYjCJjBRnbJLgp8uirBgmQpjKhoR4tjF3ZpRzrFmBV6UjKdiSZkQUW"
        .parse()
        .unwrap()
}

pub fn status(confirmations: Option<u64>, err: Option<Value>) -> SignatureStatus {
    SignatureStatus {
        slot: 100,
        confirmations,
        err: err.map(sigwait::blockchain::types::TransactionError),
        confirmation_status: Some("confirmed".into()),
    }
}

/// Assert that `elapsed` is `expected` give or take timer rounding.
pub fn assert_elapsed(elapsed: Duration, expected_ms: u64) {
    let expected = Duration::from_millis(expected_ms);
    assert!(
        elapsed >= expected && elapsed < expected + Duration::from_millis(5),
        "elapsed {:?}, expected {:?}",
        elapsed,
        expected
    );
}

type StatusScript = Box<dyn Fn(Duration) -> ClientResult<Option<SignatureStatus>> + Send + Sync>;

/// In-memory ledger whose poll answers depend on time since creation.
pub struct ScriptedLedger {
    started: Instant,
    script: StatusScript,
    callback: Mutex<Option<NotificationCallback>>,
    released: Mutex<Vec<SubscriptionId>>,
    polls: Mutex<Vec<Duration>>,
    next_id: AtomicU64,
    refuse_subscriptions: bool,
}

impl ScriptedLedger {
    pub fn new<F>(script: F) -> Arc<Self>
    where
        F: Fn(Duration) -> ClientResult<Option<SignatureStatus>> + Send + Sync + 'static,
    {
        Self::build(Box::new(script), false)
    }

    /// A ledger that never has anything to say.
    pub fn silent() -> Arc<Self> {
        Self::new(|_| Ok(None))
    }

    /// A ledger whose subscription endpoint is down.
    pub fn refusing() -> Arc<Self> {
        Self::build(Box::new(|_| Ok(None)), true)
    }

    fn build(script: StatusScript, refuse_subscriptions: bool) -> Arc<Self> {
        Arc::new(Self {
            started: Instant::now(),
            script,
            callback: Mutex::new(None),
            released: Mutex::new(Vec::new()),
            polls: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            refuse_subscriptions,
        })
    }

    /// Deliver a notification to the registered callback, if any.
    pub fn push(&self, notification: SignatureNotification) {
        if let Some(callback) = self.callback.lock().unwrap().as_ref() {
            callback(notification);
        }
    }

    /// Push `notification` after `delay`.
    pub fn push_after(self: &Arc<Self>, delay: Duration, notification: SignatureNotification) {
        let ledger = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            ledger.push(notification);
        });
    }

    pub fn released(&self) -> Vec<SubscriptionId> {
        self.released.lock().unwrap().clone()
    }

    pub fn polls(&self) -> Vec<Duration> {
        self.polls.lock().unwrap().clone()
    }
}

impl SignatureSource for ScriptedLedger {
    fn subscribe(
        &self,
        _signature: &Signature,
        _commitment: &Commitment,
        callback: NotificationCallback,
    ) -> ClientResult<SubscriptionId> {
        if self.refuse_subscriptions {
            return Err(ClientError::Closed);
        }
        *self.callback.lock().unwrap() = Some(callback);
        Ok(SubscriptionId(self.next_id.fetch_add(1, Ordering::SeqCst)))
    }

    fn unsubscribe(&self, id: SubscriptionId) -> ClientResult<()> {
        self.released.lock().unwrap().push(id);
        Ok(())
    }

    async fn signature_status(
        &self,
        _signature: &Signature,
    ) -> ClientResult<Option<SignatureStatus>> {
        let at = self.started.elapsed();
        self.polls.lock().unwrap().push(at);
        (self.script)(at)
    }
}

/// Start a JSON-RPC backend on an ephemeral port.
///
/// `handler` receives the request body and returns an HTTP status and a JSON body.
pub async fn start_rpc_backend<F>(handler: F) -> SocketAddr
where
    F: Fn(Value) -> (u16, Value) + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handler = Arc::new(handler);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let handler = handler.clone();
                    tokio::spawn(async move {
                        let Some(request) = read_json_body(&mut socket).await else {
                            return;
                        };
                        let (status, body) = handler(request);
                        let status_text = match status {
                            200 => "200 OK",
                            500 => "500 Internal Server Error",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };
                        let body = body.to_string();
                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

async fn read_json_body(socket: &mut TcpStream) -> Option<Value> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let headers = String::from_utf8_lossy(&buf[..header_end]).to_ascii_lowercase();
    let content_length = headers
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    serde_json::from_slice(&buf[header_end..header_end + content_length]).ok()
}

/// JSON-RPC success envelope.
pub fn rpc_result(request: &Value, result: Value) -> Value {
    json!({ "jsonrpc": "2.0", "result": result, "id": request["id"] })
}

/// `getSignatureStatuses` answer holding a single status (or `null`).
pub fn statuses_result(request: &Value, status: Value) -> Value {
    rpc_result(request, json!({ "context": { "slot": 100 }, "value": [status] }))
}

/// Accept connections and hold them open without ever answering.
pub async fn start_stalled_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    addr
}

/// Start a pubsub backend on an ephemeral port.
///
/// Every request it receives is recorded. Subscriptions are acknowledged, and
/// when `notify` is set, a notification with that `err` follows after `delay`.
pub async fn start_pubsub_backend(
    notify: Option<(Duration, Value)>,
) -> (SocketAddr, Arc<Mutex<Vec<Value>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let recorded = requests.clone();

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            let recorded = recorded.clone();
            let notify = notify.clone();
            tokio::spawn(async move {
                let Ok(mut ws) = tokio_tungstenite::accept_async(socket).await else {
                    return;
                };
                while let Some(Ok(message)) = ws.next().await {
                    let Message::Text(text) = message else {
                        continue;
                    };
                    let Ok(request) = serde_json::from_str::<Value>(text.as_str()) else {
                        continue;
                    };
                    recorded.lock().unwrap().push(request.clone());

                    let reply = match request["method"].as_str() {
                        Some("signatureSubscribe") => {
                            let subscription = 1000 + request["id"].as_u64().unwrap_or(0);
                            let ack = rpc_result(&request, json!(subscription));
                            if ws.send(Message::text(ack.to_string())).await.is_err() {
                                return;
                            }
                            match &notify {
                                Some((delay, err)) => {
                                    tokio::time::sleep(*delay).await;
                                    json!({
                                        "jsonrpc": "2.0",
                                        "method": "signatureNotification",
                                        "params": {
                                            "result": { "context": { "slot": 321 }, "value": { "err": err } },
                                            "subscription": subscription
                                        }
                                    })
                                }
                                None => continue,
                            }
                        }
                        Some("signatureUnsubscribe") => rpc_result(&request, json!(true)),
                        _ => continue,
                    };
                    if ws.send(Message::text(reply.to_string())).await.is_err() {
                        return;
                    }
                }
            });
        }
    });

    (addr, requests)
}

/// Wait up to one second for `requests` to contain a call to `method`.
pub async fn wait_for_request(requests: &Arc<Mutex<Vec<Value>>>, method: &str) -> bool {
    for _ in 0..100 {
        if requests
            .lock()
            .unwrap()
            .iter()
            .any(|r| r["method"] == method)
        {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}
