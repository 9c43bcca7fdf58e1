//! Confirmation-awaiting subsystem.
//!
//! # Data Flow
//! ```text
//! wait_for_confirmation(signature, options)
//!     → subscription.rs (subscribe, guard owns the handle)
//!     → observers.rs    (deadline, push callback, poll loop)
//!     → resolver.rs     (first decisive vote wins)
//!     → release subscription → Confirmation | ConfirmationError
//! ```
//!
//! # Design Decisions
//! - A timeout is a result, not an error: the transaction may still land
//! - A remote rejection is an error carrying the ledger's payload
//! - Noise (no status yet, zero confirmations, failed polls) never decides the outcome
//! - No resubmission happens here

pub mod observers;
pub mod resolver;
pub mod source;
pub mod subscription;
pub mod waiter;

#[cfg(test)]
pub(crate) mod fake;

pub use resolver::{Resolver, Vote, VoteSource};
pub use source::{NotificationCallback, SignatureSource};
pub use subscription::SubscriptionGuard;
pub use waiter::{
    await_confirmation, wait_for_confirmation, Confirmation, ConfirmationError, ConfirmationWaiter,
    WaitOptions, DEFAULT_POLL_INTERVAL,
};
