mod common;

use std::sync::Arc;

use common::{test_config, TestEnvironment};
use lockbox::ledger::{Ledger, MemoryLedger};
use lockbox::LockboxManager;

#[tokio::test]
async fn save_list_delete_round_trip() {
    let env = TestEnvironment::new().unwrap();

    let saved = env
        .manager
        .save_state("Vacation", "0.5", 1_800_000_000)
        .unwrap();

    let all = env.manager.saved_states();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].name, "Vacation");
    assert_eq!(all[0].amount, "0.5");
    assert_eq!(all[0].unlock_time, 1_800_000_000);

    env.manager.delete_state(&saved.id).unwrap();
    assert!(env.manager.saved_states().is_empty());
}

#[tokio::test]
async fn each_save_gets_a_fresh_id() {
    let env = TestEnvironment::new().unwrap();

    let first = env.manager.save_state("Summer fund", "1", 100).unwrap();
    let second = env.manager.save_state("Summer fund", "1", 100).unwrap();
    assert_ne!(first.id, second.id);
    assert_eq!(env.manager.saved_states().len(), 2);
}

#[tokio::test]
async fn load_state_resolves_by_id() {
    let env = TestEnvironment::new().unwrap();
    let saved = env.manager.save_state("Rainy day", "2.5", 42).unwrap();

    let loaded = env.manager.load_state(&saved.id).unwrap();
    assert_eq!(loaded, saved);
    assert!(env.manager.load_state("unknown").is_none());
}

#[tokio::test]
async fn saved_states_survive_a_restart() {
    let env = TestEnvironment::new().unwrap();
    env.manager.save_state("Keep me", "0.25", 7).unwrap();

    // A new manager over the same store directory sees the sequence.
    let ledger = MemoryLedger::new();
    let reopened = LockboxManager::with_ledger(
        test_config(),
        Arc::clone(&ledger) as Arc<dyn Ledger>,
        env.temp_dir.path(),
    )
    .unwrap();

    let all = reopened.saved_states();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].name, "Keep me");
}

#[tokio::test]
async fn saved_states_are_independent_of_remote_state() {
    let env = TestEnvironment::new().unwrap();
    env.ledger.set_balance(1_000);
    env.manager.refresh_balance().await.unwrap();

    // The store records the user's intention, not the contract's state.
    env.manager.save_state("Wish", "99", 1).unwrap();
    assert_eq!(env.manager.snapshot().balance, Some(1_000));
    assert_eq!(env.manager.saved_states()[0].amount, "99");
}
