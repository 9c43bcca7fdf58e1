//! First-vote-wins resolution slot.
//!
//! # State Transitions
//! ```text
//! Pending → Resolved(Confirmed) | Resolved(Rejected) | Resolved(TimedOut)
//! ```
//! Every resolved state is terminal. Votes arriving afterwards are counted and dropped.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

use crate::blockchain::types::{SignatureStatus, TransactionError};
use crate::observability::metrics;

/// Observer that cast a vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteSource {
    Deadline,
    Push,
    Poll,
}

impl VoteSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteSource::Deadline => "deadline",
            VoteSource::Push => "push",
            VoteSource::Poll => "poll",
        }
    }
}

/// A decisive observation.
#[derive(Debug, Clone, PartialEq)]
pub enum Vote {
    Confirmed {
        status: SignatureStatus,
        source: VoteSource,
    },
    Rejected {
        error: TransactionError,
        source: VoteSource,
    },
    TimedOut,
}

impl Vote {
    pub fn source(&self) -> VoteSource {
        match self {
            Vote::Confirmed { source, .. } | Vote::Rejected { source, .. } => *source,
            Vote::TimedOut => VoteSource::Deadline,
        }
    }
}

struct Slot {
    sender: Mutex<Option<oneshot::Sender<Vote>>>,
    resolved: AtomicBool,
    discarded: AtomicU64,
}

/// Shared handle to a single-assignment vote slot.
///
/// Cloned into every observer. The matching receiver is returned by [`Resolver::new`].
#[derive(Clone)]
pub struct Resolver {
    slot: Arc<Slot>,
}

impl Resolver {
    pub fn new() -> (Self, oneshot::Receiver<Vote>) {
        let (tx, rx) = oneshot::channel();
        let resolver = Self {
            slot: Arc::new(Slot {
                sender: Mutex::new(Some(tx)),
                resolved: AtomicBool::new(false),
                discarded: AtomicU64::new(0),
            }),
        };
        (resolver, rx)
    }

    /// Cast a vote. Returns `true` if this vote decided the outcome.
    pub fn resolve(&self, vote: Vote) -> bool {
        let sender = {
            let mut sender = self
                .slot
                .sender
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            let taken = sender.take();
            if taken.is_some() {
                self.slot.resolved.store(true, Ordering::Release);
            }
            taken
        };

        match sender {
            Some(tx) => {
                // The waiter may already be gone if its future was dropped.
                let _ = tx.send(vote);
                true
            }
            None => {
                self.slot.discarded.fetch_add(1, Ordering::Relaxed);
                metrics::record_late_vote(vote.source().as_str());
                tracing::debug!(source = vote.source().as_str(), "Discarding vote after resolution");
                false
            }
        }
    }

    /// Whether a decisive vote has been latched.
    pub fn is_resolved(&self) -> bool {
        self.slot.resolved.load(Ordering::Acquire)
    }

    /// Number of votes dropped because the slot was already set.
    pub fn discarded(&self) -> u64 {
        self.slot.discarded.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("resolved", &self.is_resolved())
            .field("discarded", &self.discarded())
            .finish()
    }
}
