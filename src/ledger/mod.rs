//! Remote ledger access.
//!
//! The ledger is an opaque external system of record reachable only through
//! read, submit, confirmation-wait, and subscribe operations. Everything the
//! sync engine knows about remote state flows through the [`Ledger`] trait;
//! implementations are untrusted network endpoints ([`RpcLedger`]) or
//! in-memory stand-ins for tests ([`MemoryLedger`]).

pub mod memory;
pub mod rpc;

pub use memory::MemoryLedger;
pub use rpc::RpcLedger;

use std::fmt;
use std::sync::Arc;

use crate::error::LedgerError;

/// The two user-initiated operation kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxKind {
    Deposit,
    Withdraw,
}

impl fmt::Display for TxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TxKind::Deposit => write!(f, "deposit"),
            TxKind::Withdraw => write!(f, "withdraw"),
        }
    }
}

/// Opaque handle to an accepted submission, pending confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionHandle(String);

impl SubmissionHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for SubmissionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Settlement outcome reported by the ledger for a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationStatus {
    Confirmed,
    Failed,
}

/// Remote event classes the engine subscribes to, scoped to the tracked
/// contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventClass {
    DepositObserved,
    WithdrawalObserved,
}

/// Callback invoked on every event delivery. Delivery is at-least-once;
/// duplicates must be tolerated by the callee.
pub type EventCallback = Arc<dyn Fn() + Send + Sync>;

/// Capability-typed collaborator for the remote ledger contract.
#[async_trait::async_trait]
pub trait Ledger: Send + Sync {
    /// Current contract balance in wei.
    async fn read_balance(&self) -> Result<u128, LedgerError>;

    /// Unlock timestamp in unix seconds. `0` means no lock is configured.
    async fn read_unlock_time(&self) -> Result<u64, LedgerError>;

    /// Contract owner, if one is set.
    async fn read_owner(&self) -> Result<Option<String>, LedgerError>;

    /// Submit a transaction. Deposits require a positive `value`; withdraws
    /// carry none and move the entire balance per contract convention. May
    /// fail synchronously when the signer declines.
    async fn submit_transaction(
        &self,
        kind: TxKind,
        value: Option<u128>,
    ) -> Result<SubmissionHandle, LedgerError>;

    /// Suspend until the submission settles. May never resolve; callers must
    /// bound the wait themselves.
    async fn await_confirmation(
        &self,
        handle: &SubmissionHandle,
    ) -> Result<ConfirmationStatus, LedgerError>;

    /// Register a persistent event listener. The listener lives until the
    /// returned [`Subscription`] is dropped.
    fn subscribe(&self, class: EventClass, on_event: EventCallback) -> Subscription;
}

/// Owned handle to an active event subscription.
///
/// Dropping it releases the underlying listener, so subscriptions cannot
/// accumulate across attach/detach cycles.
pub struct Subscription {
    release: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub fn new(release: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// Release the listener now instead of at drop time.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}
