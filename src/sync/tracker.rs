//! Transaction Lifecycle Tracker.
//!
//! Drives the single in-flight user operation through
//! `idle -> awaiting-signature -> awaiting-confirmation -> confirmed | failed`.
//! The phase is one tagged value, so the derived UI flags are mutually
//! exclusive by construction. At most one submission is in flight; a second
//! attempt is rejected without touching the current one.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::countdown::{countdown, unix_now};
use crate::error::LockboxError;
use crate::ledger::{ConfirmationStatus, Ledger, SubmissionHandle, TxKind};
use crate::units::parse_eth;

use super::mirror::StateMirror;

/// Current state of the single live transaction record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TxPhase {
    #[default]
    Idle,
    AwaitingSignature {
        kind: TxKind,
    },
    AwaitingConfirmation {
        kind: TxKind,
        handle: SubmissionHandle,
    },
    Confirmed {
        kind: TxKind,
    },
    Failed {
        kind: TxKind,
        reason: String,
    },
}

#[derive(Default)]
struct TrackerState {
    phase: TxPhase,
    /// Deposit amount as the user typed it; cleared on confirmation
    pending_amount: Option<String>,
}

pub struct TxTracker {
    ledger: Arc<dyn Ledger>,
    mirror: StateMirror,
    confirmation_timeout: Duration,
    state: Mutex<TrackerState>,
}

impl TxTracker {
    pub fn new(ledger: Arc<dyn Ledger>, mirror: StateMirror, confirmation_timeout: Duration) -> Self {
        Self {
            ledger,
            mirror,
            confirmation_timeout,
            state: Mutex::new(TrackerState::default()),
        }
    }

    pub fn phase(&self) -> TxPhase {
        self.state.lock().unwrap().phase.clone()
    }

    /// True while waiting for the signer to accept the submission.
    pub fn is_pending(&self) -> bool {
        matches!(self.phase(), TxPhase::AwaitingSignature { .. })
    }

    /// True while waiting for the accepted submission to settle.
    pub fn is_confirming(&self) -> bool {
        matches!(self.phase(), TxPhase::AwaitingConfirmation { .. })
    }

    /// True only in `Confirmed`, until superseded by the next submission.
    pub fn is_success(&self) -> bool {
        matches!(self.phase(), TxPhase::Confirmed { .. })
    }

    /// The staged deposit amount, if one survives from the last submission.
    pub fn pending_amount(&self) -> Option<String> {
        self.state.lock().unwrap().pending_amount.clone()
    }

    /// Submit a deposit for `amount` (decimal ETH string) and drive it to a
    /// terminal phase. Invalid amounts are rejected locally with no state
    /// transition and no ledger call.
    pub async fn submit_deposit(&self, amount: &str) -> Result<(), LockboxError> {
        let value = parse_eth(amount)?;
        self.begin(TxKind::Deposit, Some(amount))?;
        self.drive(TxKind::Deposit, Some(value)).await
    }

    /// Submit a withdrawal of the entire balance and drive it to a terminal
    /// phase. Guarded locally: the lock must have expired and the mirrored
    /// balance must be loaded and non-zero.
    pub async fn submit_withdraw(&self) -> Result<(), LockboxError> {
        let snapshot = self.mirror.snapshot();
        if !countdown(snapshot.unlock_time, unix_now()).is_unlocked() {
            return Err(LockboxError::StillLocked);
        }
        match snapshot.balance {
            None | Some(0) => return Err(LockboxError::NothingToWithdraw),
            Some(_) => {}
        }

        self.begin(TxKind::Withdraw, None)?;
        self.drive(TxKind::Withdraw, None).await
    }

    /// Enter `AwaitingSignature`, rejecting if a submission is in flight.
    /// Terminal phases are superseded here on the next submission.
    fn begin(&self, kind: TxKind, amount: Option<&str>) -> Result<(), LockboxError> {
        let mut state = self.state.lock().unwrap();
        if matches!(
            state.phase,
            TxPhase::AwaitingSignature { .. } | TxPhase::AwaitingConfirmation { .. }
        ) {
            return Err(LockboxError::SubmissionInFlight);
        }

        state.phase = TxPhase::AwaitingSignature { kind };
        if let Some(amount) = amount {
            state.pending_amount = Some(amount.to_string());
        }
        Ok(())
    }

    async fn drive(&self, kind: TxKind, value: Option<u128>) -> Result<(), LockboxError> {
        let handle = match self.ledger.submit_transaction(kind, value).await {
            Ok(handle) => handle,
            Err(e) => {
                let reason = e.to_string();
                self.fail(kind, reason.clone());
                return Err(LockboxError::TxRejected(reason));
            }
        };
        log::info!("{} accepted, awaiting confirmation: {}", kind, handle);
        self.set_phase(TxPhase::AwaitingConfirmation {
            kind,
            handle: handle.clone(),
        });

        let confirmation = tokio::time::timeout(
            self.confirmation_timeout,
            self.ledger.await_confirmation(&handle),
        )
        .await;

        let status = match confirmation {
            Ok(Ok(status)) => status,
            Ok(Err(e)) => {
                let reason = e.to_string();
                self.fail(kind, reason.clone());
                return Err(LockboxError::TxFailed(reason));
            }
            Err(_) => {
                let secs = self.confirmation_timeout.as_secs();
                self.fail(kind, format!("no confirmation within {}s", secs));
                return Err(LockboxError::ConfirmationTimeout(secs));
            }
        };

        match status {
            ConfirmationStatus::Confirmed => {
                {
                    let mut state = self.state.lock().unwrap();
                    state.phase = TxPhase::Confirmed { kind };
                    if kind == TxKind::Deposit {
                        state.pending_amount = None;
                    }
                }
                log::info!("{} confirmed: {}", kind, handle);
                // The one refresh a confirmation is allowed to trigger. The
                // transaction stays confirmed even if this read fails.
                if let Err(e) = self.mirror.refresh_balance().await {
                    log::warn!("Post-confirmation balance refresh failed: {}", e);
                }
                Ok(())
            }
            ConfirmationStatus::Failed => {
                let reason = "transaction reverted".to_string();
                self.fail(kind, reason.clone());
                Err(LockboxError::TxFailed(reason))
            }
        }
    }

    fn set_phase(&self, phase: TxPhase) {
        self.state.lock().unwrap().phase = phase;
    }

    fn fail(&self, kind: TxKind, reason: String) {
        log::warn!("{} failed: {}", kind, reason);
        self.set_phase(TxPhase::Failed { kind, reason });
    }
}
