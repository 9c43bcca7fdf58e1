//! Scoped ownership of a push subscription.

use crate::blockchain::types::SubscriptionId;
use crate::confirmation::source::SignatureSource;
use crate::observability::metrics;

/// Releases its subscription exactly once: explicitly via [`release`] or on drop.
///
/// [`release`]: SubscriptionGuard::release
pub struct SubscriptionGuard<'a, S: SignatureSource> {
    source: &'a S,
    id: Option<SubscriptionId>,
}

impl<'a, S: SignatureSource> SubscriptionGuard<'a, S> {
    pub fn new(source: &'a S, id: SubscriptionId) -> Self {
        Self {
            source,
            id: Some(id),
        }
    }

    /// The handle, while still held.
    pub fn id(&self) -> Option<SubscriptionId> {
        self.id
    }

    /// Release the subscription. Returns `false` if it was already released.
    pub fn release(&mut self) -> bool {
        let Some(id) = self.id.take() else {
            return false;
        };

        match self.source.unsubscribe(id) {
            Ok(()) => tracing::debug!(subscription = %id, "Signature subscription released"),
            Err(e) => tracing::warn!(
                subscription = %id,
                error = %e,
                "Failed to release signature subscription"
            ),
        }
        metrics::record_subscription_released();
        true
    }
}

impl<S: SignatureSource> Drop for SubscriptionGuard<'_, S> {
    fn drop(&mut self) {
        self.release();
    }
}
