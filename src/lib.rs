//! Transaction confirmation awaiting for ledger RPC nodes.

pub mod blockchain;
pub mod config;
pub mod confirmation;
pub mod observability;

pub use blockchain::LedgerClient;
pub use config::SigwaitConfig;
pub use confirmation::{await_confirmation, Confirmation, ConfirmationError, ConfirmationWaiter};
