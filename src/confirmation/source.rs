//! Capabilities the confirmation wait needs from a ledger client.

use std::future::Future;

use crate::blockchain::types::{
    ClientResult, Commitment, Signature, SignatureNotification, SignatureStatus, SubscriptionId,
};

/// Callback invoked for each notification on a signature subscription.
///
/// May run on any thread; keep it short.
pub type NotificationCallback = Box<dyn Fn(SignatureNotification) + Send + Sync + 'static>;

/// Push and pull access to the status of submitted transactions.
pub trait SignatureSource: Send + Sync {
    /// Register `callback` for status changes of `signature` at `commitment`.
    ///
    /// Returns synchronously; the handle must later be passed to [`unsubscribe`].
    ///
    /// [`unsubscribe`]: SignatureSource::unsubscribe
    fn subscribe(
        &self,
        signature: &Signature,
        commitment: &Commitment,
        callback: NotificationCallback,
    ) -> ClientResult<SubscriptionId>;

    /// Release a subscription. Releasing an unknown or finished handle is a no-op.
    fn unsubscribe(&self, id: SubscriptionId) -> ClientResult<()>;

    /// Query the current status; `None` when the node has not seen the signature.
    fn signature_status(
        &self,
        signature: &Signature,
    ) -> impl Future<Output = ClientResult<Option<SignatureStatus>>> + Send;
}
