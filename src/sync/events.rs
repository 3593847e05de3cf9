//! Event Subscription Manager.
//!
//! Keeps two persistent subscriptions on the tracked contract (deposits
//! observed, withdrawals observed) and triggers an unconditional balance
//! refresh on every delivery, whoever initiated the transaction. Delivery
//! may duplicate or race the confirmation-triggered refresh; both paths are
//! safe because refresh is idempotent and the mirror discards stale results.

use std::sync::Arc;

use crate::ledger::{EventCallback, EventClass, Ledger, Subscription};

use super::mirror::StateMirror;

/// Owns the live event subscriptions. Dropping it releases both listeners,
/// so attach/detach cycles cannot accumulate listeners on the ledger.
pub struct EventSubscriptions {
    _subscriptions: Vec<Subscription>,
}

impl EventSubscriptions {
    /// Subscribe to both event classes, wiring each delivery to a balance
    /// refresh. Must be called within a tokio runtime.
    pub fn attach(ledger: &Arc<dyn Ledger>, mirror: &StateMirror) -> Self {
        let subscriptions = [EventClass::DepositObserved, EventClass::WithdrawalObserved]
            .into_iter()
            .map(|class| {
                let mirror = mirror.clone();
                let callback: EventCallback = Arc::new(move || {
                    let mirror = mirror.clone();
                    tokio::spawn(async move {
                        if let Err(e) = mirror.refresh_balance().await {
                            log::warn!("Event-driven balance refresh failed: {}", e);
                        }
                    });
                });
                ledger.subscribe(class, callback)
            })
            .collect();

        Self {
            _subscriptions: subscriptions,
        }
    }
}
