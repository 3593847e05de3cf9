//! Remote State Mirror.
//!
//! Holds the last-known values of the three remote fields and applies
//! refresh results under a per-field sequence discipline: each fetch takes a
//! sequence number at start, and a result is applied only if no
//! later-started fetch has already landed. A slow straggler can therefore
//! never overwrite a newer value; its result is discarded on arrival.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::LedgerError;
use crate::ledger::Ledger;

/// Locally cached mirror of the ledger-held fields.
///
/// `None` means "not yet loaded", distinct from a loaded zero: the UI
/// renders a skeleton for the former and "0 ETH" for the latter. Fields are
/// mutated only by the mirror's refresh operations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    /// Contract balance in wei
    pub balance: Option<u128>,
    /// Unlock timestamp in unix seconds; a loaded `0` means no lock is
    /// configured
    pub unlock_time: Option<u64>,
    /// Contract owner address
    pub owner: Option<String>,
}

impl Snapshot {
    /// Whether `account` is the contract owner. Addresses compare
    /// case-insensitively; false while the owner is not loaded.
    pub fn is_owned_by(&self, account: &str) -> bool {
        self.owner
            .as_deref()
            .map(|owner| owner.eq_ignore_ascii_case(account))
            .unwrap_or(false)
    }
}

#[derive(Default)]
struct Cached {
    snapshot: Snapshot,
    balance_applied: u64,
    unlock_applied: u64,
    owner_applied: u64,
}

#[derive(Default)]
struct MirrorInner {
    cached: Mutex<Cached>,
    balance_seq: AtomicU64,
    unlock_seq: AtomicU64,
    owner_seq: AtomicU64,
}

/// Shared handle to the mirrored account state. Cloning is cheap; all clones
/// observe the same snapshot.
#[derive(Clone)]
pub struct StateMirror {
    ledger: Arc<dyn Ledger>,
    inner: Arc<MirrorInner>,
}

impl StateMirror {
    pub fn new(ledger: Arc<dyn Ledger>) -> Self {
        Self {
            ledger,
            inner: Arc::new(MirrorInner::default()),
        }
    }

    /// Current cached values, without triggering a fetch.
    pub fn snapshot(&self) -> Snapshot {
        self.inner.cached.lock().unwrap().snapshot.clone()
    }

    /// Fetch the balance and update the snapshot. Idempotent and safe to
    /// call concurrently; overlapping refreshes settle to the value of the
    /// latest-started fetch that returned. On failure the cached field is
    /// left untouched.
    pub async fn refresh_balance(&self) -> Result<u128, LedgerError> {
        let seq = self.inner.balance_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let balance = self.ledger.read_balance().await.map_err(|e| {
            log::warn!("Balance refresh failed: {}", e);
            e
        })?;

        let mut cached = self.inner.cached.lock().unwrap();
        if seq > cached.balance_applied {
            cached.snapshot.balance = Some(balance);
            cached.balance_applied = seq;
        } else {
            log::debug!("Discarding stale balance fetch (started before the applied one)");
        }
        Ok(balance)
    }

    /// Fetch the unlock time and update the snapshot. Same semantics as
    /// [`Self::refresh_balance`].
    pub async fn refresh_unlock_time(&self) -> Result<u64, LedgerError> {
        let seq = self.inner.unlock_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let unlock_time = self.ledger.read_unlock_time().await.map_err(|e| {
            log::warn!("Unlock-time refresh failed: {}", e);
            e
        })?;

        let mut cached = self.inner.cached.lock().unwrap();
        if seq > cached.unlock_applied {
            cached.snapshot.unlock_time = Some(unlock_time);
            cached.unlock_applied = seq;
        }
        Ok(unlock_time)
    }

    /// Fetch the owner and update the snapshot. Same semantics as
    /// [`Self::refresh_balance`].
    pub async fn refresh_owner(&self) -> Result<Option<String>, LedgerError> {
        let seq = self.inner.owner_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let owner = self.ledger.read_owner().await.map_err(|e| {
            log::warn!("Owner refresh failed: {}", e);
            e
        })?;

        let mut cached = self.inner.cached.lock().unwrap();
        if seq > cached.owner_applied {
            cached.snapshot.owner = owner.clone();
            cached.owner_applied = seq;
        }
        Ok(owner)
    }

    /// Refresh all three fields concurrently. Individual failures leave the
    /// affected field at its previous value; the refreshed snapshot is
    /// returned either way.
    pub async fn refresh_all(&self) -> Snapshot {
        // Failures are logged per field and leave that field untouched.
        let _ = futures::join!(
            self.refresh_balance(),
            self.refresh_unlock_time(),
            self.refresh_owner(),
        );
        self.snapshot()
    }
}
