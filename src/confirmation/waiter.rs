//! Awaiting confirmation of a submitted transaction.

use std::convert::Infallible;
use std::future::pending;
use std::time::Duration;
use serde::Serialize;
use thiserror::Error;
use tokio::time::Instant;

use crate::blockchain::types::{ClientError, Commitment, Signature, SignatureStatus, TransactionError};
use crate::config::ConfirmationConfig;
use crate::confirmation::observers;
use crate::confirmation::resolver::{Resolver, Vote, VoteSource};
use crate::confirmation::source::SignatureSource;
use crate::confirmation::subscription::SubscriptionGuard;
use crate::observability::metrics;

/// Pause between status polls when none is configured.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2_000);

/// Outcome of a wait that did not fail.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Confirmation {
    /// The transaction landed without error.
    ///
    /// A status from a poll carries the node's confirmation count. A status
    /// from the subscription has `confirmations: None` and the subscribed
    /// commitment as `confirmation_status`, so [`SignatureStatus::is_confirmed`]
    /// is not a reliable re-check of it; the variant itself is the verdict.
    Confirmed(SignatureStatus),
    /// No decisive observation before the deadline; the transaction's fate is unknown.
    TimedOut,
}

impl Confirmation {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, Confirmation::Confirmed(_))
    }
}

/// Failures that end a wait.
#[derive(Debug, Error)]
pub enum ConfirmationError {
    /// The signature subscription could not be set up.
    #[error("Signature subscription failed: {0}")]
    Registration(#[source] ClientError),

    /// The ledger reported the transaction as failed.
    #[error("Transaction {signature} rejected: {error}")]
    Rejected {
        signature: Signature,
        error: TransactionError,
    },
}

/// Parameters of a single wait.
#[derive(Debug, Clone, PartialEq)]
pub struct WaitOptions {
    /// Overall deadline.
    pub timeout: Duration,
    /// Commitment level for the subscription.
    pub commitment: Commitment,
    /// Poll interval; `None` disables polling.
    pub poll_interval: Option<Duration>,
}

impl WaitOptions {
    pub fn new(timeout: Duration, commitment: Commitment) -> Self {
        Self {
            timeout,
            commitment,
            poll_interval: None,
        }
    }

    pub fn with_polling(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }
}

impl From<&ConfirmationConfig> for WaitOptions {
    fn from(config: &ConfirmationConfig) -> Self {
        let options = Self::new(config.timeout(), config.commitment.clone());
        if config.polling_enabled {
            options.with_polling(config.poll_interval())
        } else {
            options
        }
    }
}

/// Wait for `signature` to be confirmed, rejected, or for `timeout` to pass.
///
/// Polls every [`DEFAULT_POLL_INTERVAL`] when `polling_enabled` is set.
pub async fn await_confirmation<S: SignatureSource>(
    source: &S,
    signature: &Signature,
    timeout: Duration,
    commitment: &Commitment,
    polling_enabled: bool,
) -> Result<Confirmation, ConfirmationError> {
    let mut options = WaitOptions::new(timeout, commitment.clone());
    if polling_enabled {
        options = options.with_polling(DEFAULT_POLL_INTERVAL);
    }
    wait_for_confirmation(source, signature, &options).await
}

/// Race the deadline, the signature subscription and (optionally) status polling.
///
/// The first decisive observation wins. The subscription is released before
/// returning on every path, including when this future is dropped.
pub async fn wait_for_confirmation<S: SignatureSource>(
    source: &S,
    signature: &Signature,
    options: &WaitOptions,
) -> Result<Confirmation, ConfirmationError> {
    let started = Instant::now();
    let expires_at = started + options.timeout;
    let (resolver, mut outcome) = Resolver::new();

    tracing::debug!(
        signature = %signature,
        timeout_ms = options.timeout.as_millis() as u64,
        commitment = %options.commitment,
        polling = options.poll_interval.is_some(),
        "Awaiting confirmation"
    );

    let callback =
        observers::push_callback(resolver.clone(), signature.clone(), options.commitment.clone());
    let id = match source.subscribe(signature, &options.commitment, callback) {
        Ok(id) => id,
        Err(e) => {
            tracing::error!(signature = %signature, error = %e, "Signature subscription setup failed");
            metrics::record_outcome("registration_error", VoteSource::Push.as_str(), started.elapsed());
            return Err(ConfirmationError::Registration(e));
        }
    };
    let mut subscription = SubscriptionGuard::new(source, id);

    let observe = async {
        let polling = async {
            match options.poll_interval {
                Some(period) => observers::poll_status(source, signature, period, &resolver).await,
                None => pending::<()>().await,
            }
        };
        tokio::join!(observers::deadline(&resolver, expires_at, signature), polling);
        pending::<Infallible>().await
    };

    let vote = tokio::select! {
        // The sender lives in `resolver`, which outlives this select.
        vote = &mut outcome => vote.unwrap_or(Vote::TimedOut),
        never = observe => match never {},
    };

    subscription.release();

    let elapsed = started.elapsed();
    let source_name = vote.source().as_str();
    match vote {
        Vote::Confirmed { status, .. } => {
            metrics::record_outcome("confirmed", source_name, elapsed);
            tracing::info!(
                signature = %signature,
                slot = status.slot,
                source = source_name,
                elapsed_ms = elapsed.as_millis() as u64,
                "Transaction confirmed"
            );
            Ok(Confirmation::Confirmed(status))
        }
        Vote::Rejected { error, .. } => {
            metrics::record_outcome("rejected", source_name, elapsed);
            tracing::warn!(
                signature = %signature,
                error = %error,
                source = source_name,
                "Transaction rejected"
            );
            Err(ConfirmationError::Rejected {
                signature: signature.clone(),
                error,
            })
        }
        Vote::TimedOut => {
            metrics::record_outcome("timed_out", source_name, elapsed);
            tracing::warn!(
                signature = %signature,
                elapsed_ms = elapsed.as_millis() as u64,
                "Timed out awaiting confirmation"
            );
            Ok(Confirmation::TimedOut)
        }
    }
}

/// Reusable waiter bound to a signature source and configuration.
pub struct ConfirmationWaiter<S> {
    source: S,
    options: WaitOptions,
}

impl<S: SignatureSource> ConfirmationWaiter<S> {
    pub fn new(source: S, config: &ConfirmationConfig) -> Self {
        Self {
            source,
            options: WaitOptions::from(config),
        }
    }

    /// Wait with the configured options.
    pub async fn wait(&self, signature: &Signature) -> Result<Confirmation, ConfirmationError> {
        wait_for_confirmation(&self.source, signature, &self.options).await
    }

    /// Wait with options other than the configured ones.
    pub async fn wait_with(
        &self,
        signature: &Signature,
        options: &WaitOptions,
    ) -> Result<Confirmation, ConfirmationError> {
        wait_for_confirmation(&self.source, signature, options).await
    }

    pub fn options(&self) -> &WaitOptions {
        &self.options
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}
