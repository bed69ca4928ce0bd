//! Transaction lifecycle coordination for the election contract.
//!
//! An [`ElectionCoordinator`] turns user intents into signed contract
//! transactions. Every write goes through the [`IdempotencyGuard`] first, so a
//! repeated intent observes the transaction already in flight instead of
//! submitting a second one, and through the [`TransactionSubmitter`] which
//! broadcasts it and waits for its receipt.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod guard;
pub mod response;
pub mod retry;
pub mod submitter;

pub use config::*;
pub use coordinator::*;
pub use error::*;
pub use guard::*;
pub use response::*;
pub use retry::*;
pub use submitter::*;

pub use tokio_util::sync::CancellationToken;
