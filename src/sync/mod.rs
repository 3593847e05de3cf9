/// Synchronization Core
///
/// Keeps the local mirror of remote contract state consistent with the
/// ledger and drives the transaction lifecycle:
///
/// - `mirror.rs` - Remote State Mirror (snapshot cache, refresh ordering)
/// - `events.rs` - Event Subscription Manager (event-driven refresh)
/// - `tracker.rs` - Transaction Lifecycle Tracker (single in-flight tx)
/// - `manager.rs` - Orchestrator wiring the pieces together

pub mod events;
pub mod manager;
pub mod mirror;
pub mod tracker;

pub use events::EventSubscriptions;
pub use manager::LockboxManager;
pub use mirror::{Snapshot, StateMirror};
pub use tracker::{TxPhase, TxTracker};
