/// Common test utilities for lockbox integration tests
///
/// Provides a test environment wiring a scriptable in-memory ledger to a
/// manager with a temp-dir store, plus a gated ledger whose balance reads
/// resolve only when the test releases them (for refresh-ordering tests).
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tempfile::TempDir;
use tokio::sync::oneshot;

use lockbox::error::LedgerError;
use lockbox::ledger::{
    ConfirmationStatus, EventCallback, EventClass, Ledger, MemoryLedger, Subscription,
    SubmissionHandle, TxKind,
};
use lockbox::{LockboxConfig, LockboxManager};

pub const TEST_ADDRESS: &str = "0x1234567890123456789012345678901234567890";
pub const TEST_PROJECT_ID: &str = "12345678901234567890123456789012";

/// Test environment with automatic cleanup (temp dir removes itself)
pub struct TestEnvironment {
    pub temp_dir: TempDir,
    pub ledger: Arc<MemoryLedger>,
    pub manager: LockboxManager,
}

impl TestEnvironment {
    pub fn new() -> anyhow::Result<Self> {
        Self::with_config(test_config())
    }

    /// Environment without a configured contract address (submissions must
    /// be blocked locally).
    pub fn without_contract_address() -> anyhow::Result<Self> {
        let mut config = test_config();
        config.contract_address = None;
        Self::with_config(config)
    }

    pub fn with_config(config: LockboxConfig) -> anyhow::Result<Self> {
        let temp_dir = TempDir::new()?;
        let ledger = MemoryLedger::new();
        let manager = LockboxManager::with_ledger(
            config,
            Arc::clone(&ledger) as Arc<dyn Ledger>,
            temp_dir.path(),
        )?;

        Ok(Self {
            temp_dir,
            ledger,
            manager,
        })
    }
}

pub fn test_config() -> LockboxConfig {
    LockboxConfig {
        project_id: TEST_PROJECT_ID.to_string(),
        contract_address: Some(TEST_ADDRESS.to_string()),
        confirmation_timeout: Duration::from_secs(5),
        ..LockboxConfig::default()
    }
}

/// Ledger whose balance reads block until the test releases a gate armed
/// for them, in arming order. Everything else is inert.
#[derive(Default)]
pub struct GatedLedger {
    gates: Mutex<VecDeque<oneshot::Receiver<u128>>>,
}

impl GatedLedger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Arm a gate for the next unserved balance read; sending on the
    /// returned channel resolves that read with the sent value.
    pub fn arm_balance_gate(&self) -> oneshot::Sender<u128> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().push_back(rx);
        tx
    }
}

#[async_trait::async_trait]
impl Ledger for GatedLedger {
    async fn read_balance(&self) -> Result<u128, LedgerError> {
        let gate = self.gates.lock().unwrap().pop_front();
        match gate {
            Some(gate) => gate
                .await
                .map_err(|_| LedgerError::Transport("gate dropped".to_string())),
            None => Err(LedgerError::Transport("no gate armed".to_string())),
        }
    }

    async fn read_unlock_time(&self) -> Result<u64, LedgerError> {
        Ok(0)
    }

    async fn read_owner(&self) -> Result<Option<String>, LedgerError> {
        Ok(None)
    }

    async fn submit_transaction(
        &self,
        _kind: TxKind,
        _value: Option<u128>,
    ) -> Result<SubmissionHandle, LedgerError> {
        Err(LedgerError::Rejected("gated ledger".to_string()))
    }

    async fn await_confirmation(
        &self,
        _handle: &SubmissionHandle,
    ) -> Result<ConfirmationStatus, LedgerError> {
        Ok(ConfirmationStatus::Failed)
    }

    fn subscribe(&self, _class: EventClass, _on_event: EventCallback) -> Subscription {
        Subscription::new(|| {})
    }
}
