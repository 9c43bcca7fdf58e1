//! The three observers racing to resolve a wait.
//!
//! # Data Flow
//! ```text
//! deadline ──────┐
//! push callback ─┼──▶ Resolver (first decisive vote wins)
//! poll loop ─────┘
//! ```

use std::time::Duration;
use tokio::time::{interval, sleep_until, Instant, MissedTickBehavior};

use crate::blockchain::types::{Commitment, Signature, SignatureStatus, TransactionError};
use crate::confirmation::resolver::{Resolver, Vote, VoteSource};
use crate::confirmation::source::{NotificationCallback, SignatureSource};
use crate::observability::metrics;

/// Shortest pause between status polls.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// What a single status poll tells us.
#[derive(Debug, Clone, PartialEq)]
pub enum PollObservation {
    /// The node has not seen the signature yet.
    Unknown,
    /// Seen, but without confirmations.
    Pending(SignatureStatus),
    Rejected(TransactionError),
    Confirmed(SignatureStatus),
}

impl PollObservation {
    pub fn classify(status: Option<SignatureStatus>) -> Self {
        match status {
            None => PollObservation::Unknown,
            Some(status) => match status.err.clone() {
                Some(err) => PollObservation::Rejected(err),
                None if status.is_confirmed() => PollObservation::Confirmed(status),
                None => PollObservation::Pending(status),
            },
        }
    }

    /// The vote this observation casts, if it is decisive.
    pub fn into_vote(self) -> Option<Vote> {
        match self {
            PollObservation::Unknown | PollObservation::Pending(_) => None,
            PollObservation::Rejected(error) => Some(Vote::Rejected {
                error,
                source: VoteSource::Poll,
            }),
            PollObservation::Confirmed(status) => Some(Vote::Confirmed {
                status,
                source: VoteSource::Poll,
            }),
        }
    }
}

/// Vote `TimedOut` once `expires_at` passes. A no-op if the wait already resolved.
pub async fn deadline(resolver: &Resolver, expires_at: Instant, signature: &Signature) {
    sleep_until(expires_at).await;
    if resolver.resolve(Vote::TimedOut) {
        tracing::warn!(signature = %signature, "Deadline reached before confirmation");
    }
}

/// Build the callback registered with the signature subscription.
pub fn push_callback(
    resolver: Resolver,
    signature: Signature,
    commitment: Commitment,
) -> NotificationCallback {
    Box::new(move |notification| {
        if resolver.is_resolved() {
            tracing::debug!(signature = %signature, "Ignoring notification after resolution");
            return;
        }

        match notification.err {
            Some(error) => {
                if resolver.resolve(Vote::Rejected {
                    error: error.clone(),
                    source: VoteSource::Push,
                }) {
                    tracing::warn!(
                        signature = %signature,
                        slot = notification.slot,
                        error = %error,
                        "Rejected via subscription"
                    );
                }
            }
            None => {
                // Notifications carry no confirmation count.
                let status = SignatureStatus {
                    slot: notification.slot,
                    confirmations: None,
                    err: None,
                    confirmation_status: Some(commitment.as_str().to_string()),
                };
                if resolver.resolve(Vote::Confirmed {
                    status,
                    source: VoteSource::Push,
                }) {
                    tracing::debug!(
                        signature = %signature,
                        slot = notification.slot,
                        "Confirmed via subscription"
                    );
                }
            }
        }
    })
}

/// Poll the node every `period` until the wait resolves.
///
/// The first query goes out immediately. Query failures are logged and retried
/// on the next tick; they never decide the outcome. Periods below
/// [`MIN_POLL_INTERVAL`] are raised to it.
pub async fn poll_status<S: SignatureSource>(
    source: &S,
    signature: &Signature,
    period: Duration,
    resolver: &Resolver,
) {
    let mut ticker = interval(period.max(MIN_POLL_INTERVAL));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        if resolver.is_resolved() {
            return;
        }

        let observation = match source.signature_status(signature).await {
            Ok(status) => PollObservation::classify(status),
            Err(e) => {
                if !resolver.is_resolved() {
                    metrics::record_poll_error();
                    tracing::warn!(signature = %signature, error = %e, "Status poll failed");
                }
                continue;
            }
        };

        match &observation {
            PollObservation::Unknown => {
                tracing::debug!(signature = %signature, "No status reported yet");
            }
            PollObservation::Pending(status) => {
                tracing::debug!(
                    signature = %signature,
                    slot = status.slot,
                    confirmation_status = ?status.confirmation_status,
                    "Seen without confirmations"
                );
            }
            PollObservation::Rejected(error) => {
                tracing::debug!(signature = %signature, error = %error, "Poll reports failure");
            }
            PollObservation::Confirmed(status) => {
                tracing::debug!(
                    signature = %signature,
                    confirmations = ?status.confirmations,
                    "Poll reports confirmation"
                );
            }
        }

        if let Some(vote) = observation.into_vote() {
            resolver.resolve(vote);
            return;
        }
    }
}
