//! In-memory ledger for testing.
//!
//! Scriptable stand-in for a remote endpoint: tests set the remote fields
//! directly, emit events, and steer submission/confirmation outcomes.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use crate::error::LedgerError;

use super::{
    ConfirmationStatus, EventCallback, EventClass, Ledger, Subscription, SubmissionHandle, TxKind,
};

type ListenerMap = HashMap<EventClass, HashMap<u64, EventCallback>>;

#[derive(Debug, Default)]
struct RemoteState {
    balance: u128,
    unlock_time: u64,
    owner: Option<String>,
}

#[derive(Default)]
struct Script {
    fail_next_balance_read: Option<String>,
    reject_next_submission: Option<String>,
    fail_next_confirmation: bool,
    confirmation_delay: Option<Duration>,
}

/// A submission recorded by [`MemoryLedger::submit_transaction`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedSubmission {
    pub kind: TxKind,
    pub value: Option<u128>,
}

#[derive(Default)]
pub struct MemoryLedger {
    state: RwLock<RemoteState>,
    script: Mutex<Script>,
    submissions: Mutex<Vec<RecordedSubmission>>,
    pending: Mutex<HashMap<String, RecordedSubmission>>,
    listeners: Arc<Mutex<ListenerMap>>,
    next_handle: AtomicU64,
    next_listener: AtomicU64,
    balance_reads: AtomicUsize,
}

impl MemoryLedger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_balance(&self, wei: u128) {
        self.state.write().unwrap().balance = wei;
    }

    pub fn set_unlock_time(&self, unix_seconds: u64) {
        self.state.write().unwrap().unlock_time = unix_seconds;
    }

    pub fn set_owner(&self, owner: Option<String>) {
        self.state.write().unwrap().owner = owner;
    }

    /// Make the next `read_balance` fail with a transport error.
    pub fn fail_next_balance_read(&self, reason: &str) {
        self.script.lock().unwrap().fail_next_balance_read = Some(reason.to_string());
    }

    /// Make the next `submit_transaction` fail synchronously.
    pub fn reject_next_submission(&self, reason: &str) {
        self.script.lock().unwrap().reject_next_submission = Some(reason.to_string());
    }

    /// Make the next `await_confirmation` settle as failed.
    pub fn fail_next_confirmation(&self) {
        self.script.lock().unwrap().fail_next_confirmation = true;
    }

    /// Delay every confirmation by `delay`; long delays simulate a
    /// submission that never settles.
    pub fn set_confirmation_delay(&self, delay: Duration) {
        self.script.lock().unwrap().confirmation_delay = Some(delay);
    }

    /// Submissions accepted so far, in order.
    pub fn submissions(&self) -> Vec<RecordedSubmission> {
        self.submissions.lock().unwrap().clone()
    }

    /// Number of `read_balance` calls served.
    pub fn balance_reads(&self) -> usize {
        self.balance_reads.load(Ordering::SeqCst)
    }

    /// Number of currently registered listeners across all event classes.
    pub fn listener_count(&self) -> usize {
        self.listeners
            .lock()
            .unwrap()
            .values()
            .map(|class| class.len())
            .sum()
    }

    /// Deliver an event to every listener of `class`.
    pub fn emit(&self, class: EventClass) {
        let callbacks: Vec<EventCallback> = {
            let listeners = self.listeners.lock().unwrap();
            listeners
                .get(&class)
                .map(|class| class.values().cloned().collect())
                .unwrap_or_default()
        };
        for callback in callbacks {
            callback();
        }
    }
}

#[async_trait::async_trait]
impl Ledger for MemoryLedger {
    async fn read_balance(&self) -> Result<u128, LedgerError> {
        self.balance_reads.fetch_add(1, Ordering::SeqCst);
        if let Some(reason) = self.script.lock().unwrap().fail_next_balance_read.take() {
            return Err(LedgerError::Transport(reason));
        }
        Ok(self.state.read().unwrap().balance)
    }

    async fn read_unlock_time(&self) -> Result<u64, LedgerError> {
        Ok(self.state.read().unwrap().unlock_time)
    }

    async fn read_owner(&self) -> Result<Option<String>, LedgerError> {
        Ok(self.state.read().unwrap().owner.clone())
    }

    async fn submit_transaction(
        &self,
        kind: TxKind,
        value: Option<u128>,
    ) -> Result<SubmissionHandle, LedgerError> {
        if let Some(reason) = self.script.lock().unwrap().reject_next_submission.take() {
            return Err(LedgerError::Rejected(reason));
        }

        let submission = RecordedSubmission { kind, value };
        self.submissions.lock().unwrap().push(submission.clone());

        let id = format!("tx-{}", self.next_handle.fetch_add(1, Ordering::SeqCst));
        self.pending.lock().unwrap().insert(id.clone(), submission);
        Ok(SubmissionHandle::new(id))
    }

    async fn await_confirmation(
        &self,
        handle: &SubmissionHandle,
    ) -> Result<ConfirmationStatus, LedgerError> {
        let (failed, delay) = {
            let mut script = self.script.lock().unwrap();
            (
                std::mem::take(&mut script.fail_next_confirmation),
                script.confirmation_delay,
            )
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let submission = self.pending.lock().unwrap().remove(&handle.to_string());
        if failed {
            return Ok(ConfirmationStatus::Failed);
        }

        // Apply the settled effect so a post-confirmation refresh observes it.
        if let Some(submission) = submission {
            let mut state = self.state.write().unwrap();
            match submission.kind {
                TxKind::Deposit => state.balance += submission.value.unwrap_or(0),
                TxKind::Withdraw => state.balance = 0,
            }
        }
        Ok(ConfirmationStatus::Confirmed)
    }

    fn subscribe(&self, class: EventClass, on_event: EventCallback) -> Subscription {
        let id = self.next_listener.fetch_add(1, Ordering::SeqCst);
        self.listeners
            .lock()
            .unwrap()
            .entry(class)
            .or_default()
            .insert(id, on_event);

        let listeners = Arc::clone(&self.listeners);
        Subscription::new(move || {
            if let Some(class_listeners) = listeners.lock().unwrap().get_mut(&class) {
                class_listeners.remove(&id);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_reflect_scripted_state() {
        let ledger = MemoryLedger::new();
        ledger.set_balance(42);
        ledger.set_unlock_time(1_700_000_000);
        ledger.set_owner(Some("0xabc".to_string()));

        assert_eq!(ledger.read_balance().await.unwrap(), 42);
        assert_eq!(ledger.read_unlock_time().await.unwrap(), 1_700_000_000);
        assert_eq!(ledger.read_owner().await.unwrap().as_deref(), Some("0xabc"));
        assert_eq!(ledger.balance_reads(), 1);
    }

    #[tokio::test]
    async fn confirmed_deposit_settles_into_balance() {
        let ledger = MemoryLedger::new();
        let handle = ledger
            .submit_transaction(TxKind::Deposit, Some(10))
            .await
            .unwrap();
        assert_eq!(
            ledger.await_confirmation(&handle).await.unwrap(),
            ConfirmationStatus::Confirmed
        );
        assert_eq!(ledger.read_balance().await.unwrap(), 10);
    }

    #[tokio::test]
    async fn subscription_drop_releases_the_listener() {
        let ledger = MemoryLedger::new();
        let sub = ledger.subscribe(EventClass::DepositObserved, Arc::new(|| {}));
        assert_eq!(ledger.listener_count(), 1);
        drop(sub);
        assert_eq!(ledger.listener_count(), 0);
    }
}
