//! In-memory signature source for unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use crate::blockchain::types::{
    ClientError, ClientResult, Commitment, Signature, SignatureNotification, SignatureStatus,
    SubscriptionId,
};
use crate::confirmation::source::{NotificationCallback, SignatureSource};

#[derive(Default)]
pub struct FakeSource {
    callback: Mutex<Option<NotificationCallback>>,
    commitments: Mutex<Vec<Commitment>>,
    released: Mutex<Vec<SubscriptionId>>,
    statuses: Mutex<VecDeque<ClientResult<Option<SignatureStatus>>>>,
    polls: AtomicU64,
    next_id: AtomicU64,
    fail_subscribe: AtomicBool,
    fail_unsubscribe: AtomicBool,
}

impl FakeSource {
    pub fn fail_subscribe(&self) {
        self.fail_subscribe.store(true, Ordering::SeqCst);
    }

    pub fn fail_unsubscribe(&self) {
        self.fail_unsubscribe.store(true, Ordering::SeqCst);
    }

    /// Queue a poll response; an empty queue answers `Ok(None)`.
    pub fn push_status(&self, status: ClientResult<Option<SignatureStatus>>) {
        self.statuses.lock().unwrap().push_back(status);
    }

    pub fn notify(&self, notification: SignatureNotification) {
        if let Some(callback) = self.callback.lock().unwrap().as_ref() {
            callback(notification);
        }
    }

    pub fn released(&self) -> Vec<SubscriptionId> {
        self.released.lock().unwrap().clone()
    }

    pub fn commitments(&self) -> Vec<Commitment> {
        self.commitments.lock().unwrap().clone()
    }

    pub fn polls(&self) -> u64 {
        self.polls.load(Ordering::SeqCst)
    }
}

impl SignatureSource for FakeSource {
    fn subscribe(
        &self,
        _signature: &Signature,
        commitment: &Commitment,
        callback: NotificationCallback,
    ) -> ClientResult<SubscriptionId> {
        if self.fail_subscribe.load(Ordering::SeqCst) {
            return Err(ClientError::Closed);
        }
        self.commitments.lock().unwrap().push(commitment.clone());
        *self.callback.lock().unwrap() = Some(callback);
        Ok(SubscriptionId(self.next_id.fetch_add(1, Ordering::SeqCst)))
    }

    fn unsubscribe(&self, id: SubscriptionId) -> ClientResult<()> {
        self.released.lock().unwrap().push(id);
        if self.fail_unsubscribe.load(Ordering::SeqCst) {
            return Err(ClientError::Closed);
        }
        Ok(())
    }

    async fn signature_status(
        &self,
        _signature: &Signature,
    ) -> ClientResult<Option<SignatureStatus>> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        let next = self.statuses.lock().unwrap().pop_front();
        next.unwrap_or(Ok(None))
    }
}

pub fn signature() -> Signature {
    bs58::encode([9u8; 64]).into_string().parse().unwrap()
}
