use std::path::PathBuf;
use std::sync::Arc;

use crate::config::LockboxConfig;
use crate::countdown::{countdown, unix_now, Countdown, CountdownTicker};
use crate::error::{LedgerError, LockboxError};
use crate::ledger::{Ledger, RpcLedger};
use crate::store::{SavedState, SavedStateStore};

use super::events::EventSubscriptions;
use super::mirror::{Snapshot, StateMirror};
use super::tracker::{TxPhase, TxTracker};

/// Lockbox Manager - Orchestration Layer
///
/// Wires the ledger, state mirror, event subscriptions, transaction tracker,
/// and save-state store together and exposes the operations the UI calls.
pub struct LockboxManager {
    pub config: LockboxConfig,
    mirror: StateMirror,
    tracker: TxTracker,
    store: SavedStateStore,
    // Held for its Drop: releases both event listeners with the manager
    _events: EventSubscriptions,
}

impl LockboxManager {
    // ============================================================================
    // Constructors
    // ============================================================================

    /// Build against the configured RPC endpoint. Must be called within a
    /// tokio runtime (event subscriptions spawn polling tasks).
    pub fn new(config: LockboxConfig) -> Result<Self, LockboxError> {
        let address = config.contract_address.clone().unwrap_or_default();
        let ledger: Arc<dyn Ledger> = Arc::new(RpcLedger::new(config.rpc_url.clone(), address));
        let store = SavedStateStore::open_default()?;
        Ok(Self::assemble(config, ledger, store))
    }

    /// Build against a caller-supplied ledger and store directory (tests).
    pub fn with_ledger(
        config: LockboxConfig,
        ledger: Arc<dyn Ledger>,
        store_dir: impl Into<PathBuf>,
    ) -> Result<Self, LockboxError> {
        let store = SavedStateStore::open(store_dir)?;
        Ok(Self::assemble(config, ledger, store))
    }

    fn assemble(config: LockboxConfig, ledger: Arc<dyn Ledger>, store: SavedStateStore) -> Self {
        let mirror = StateMirror::new(Arc::clone(&ledger));
        let events = EventSubscriptions::attach(&ledger, &mirror);
        let tracker = TxTracker::new(
            Arc::clone(&ledger),
            mirror.clone(),
            config.confirmation_timeout,
        );

        Self {
            config,
            mirror,
            tracker,
            store,
            _events: events,
        }
    }

    // ============================================================================
    // Remote state (delegates to the mirror)
    // ============================================================================

    pub fn snapshot(&self) -> Snapshot {
        self.mirror.snapshot()
    }

    pub fn mirror(&self) -> StateMirror {
        self.mirror.clone()
    }

    pub async fn refresh_balance(&self) -> Result<u128, LedgerError> {
        self.mirror.refresh_balance().await
    }

    pub async fn refresh_unlock_time(&self) -> Result<u64, LedgerError> {
        self.mirror.refresh_unlock_time().await
    }

    pub async fn refresh_owner(&self) -> Result<Option<String>, LedgerError> {
        self.mirror.refresh_owner().await
    }

    pub async fn refresh_all(&self) -> Snapshot {
        self.mirror.refresh_all().await
    }

    // ============================================================================
    // Transactions (delegates to the tracker)
    // ============================================================================

    /// Deposit `amount` (decimal ETH string). Hard-blocked locally when no
    /// contract address is configured.
    pub async fn deposit(&self, amount: &str) -> Result<(), LockboxError> {
        self.ensure_address()?;
        self.tracker.submit_deposit(amount).await
    }

    /// Withdraw the entire balance. Hard-blocked locally when no contract
    /// address is configured.
    pub async fn withdraw(&self) -> Result<(), LockboxError> {
        self.ensure_address()?;
        self.tracker.submit_withdraw().await
    }

    pub fn phase(&self) -> TxPhase {
        self.tracker.phase()
    }

    pub fn is_pending(&self) -> bool {
        self.tracker.is_pending()
    }

    pub fn is_confirming(&self) -> bool {
        self.tracker.is_confirming()
    }

    pub fn is_success(&self) -> bool {
        self.tracker.is_success()
    }

    pub fn pending_amount(&self) -> Option<String> {
        self.tracker.pending_amount()
    }

    fn ensure_address(&self) -> Result<(), LockboxError> {
        // Never forward a submission to an unset target; missing address in
        // development only degrades reads.
        if self.config.contract_address.is_none() {
            return Err(LockboxError::MissingContractAddress);
        }
        Ok(())
    }

    // ============================================================================
    // Countdown
    // ============================================================================

    /// One-shot countdown from the current snapshot.
    pub fn countdown(&self) -> Countdown {
        countdown(self.mirror.snapshot().unlock_time, unix_now())
    }

    /// Start a one-second countdown ticker over the mirrored unlock time.
    /// The ticker's task ends when the returned handle is dropped.
    pub fn start_countdown(&self) -> CountdownTicker {
        CountdownTicker::start(self.mirror.clone())
    }

    // ============================================================================
    // Saved states (delegates to the store)
    // ============================================================================

    pub fn save_state(
        &self,
        name: &str,
        amount: &str,
        unlock_time: u64,
    ) -> Result<SavedState, LockboxError> {
        Ok(self.store.save(name, amount, unlock_time)?)
    }

    pub fn saved_states(&self) -> Vec<SavedState> {
        self.store.list_all()
    }

    pub fn load_state(&self, id: &str) -> Option<SavedState> {
        self.store.get(id)
    }

    pub fn delete_state(&self, id: &str) -> Result<(), LockboxError> {
        Ok(self.store.delete(id)?)
    }
}
