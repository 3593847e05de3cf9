use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::error::StoreError;

const DEFAULT_BASE_DIR: &str = "./lockbox";
const STORE_FILE: &str = "saved_states.json";

/// A user-named deposit configuration, saved to recall later.
///
/// Stores a user intention (target amount and unlock time), not a
/// contract-observed fact; independent of the account snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedState {
    pub id: String,
    pub name: String,
    /// Decimal ETH string as the user typed it
    pub amount: String,
    /// Target unlock time, unix seconds
    pub unlock_time: u64,
    pub date: DateTime<Utc>,
}

/// Durable, insertion-ordered store of saved states.
///
/// The whole sequence is re-persisted on every mutation; the collection is a
/// small user-authored list, not transaction history.
pub struct SavedStateStore {
    path: PathBuf,
    states: Mutex<Vec<SavedState>>,
}

impl SavedStateStore {
    /// Open the store under `base_dir`, eagerly loading the persisted
    /// sequence. An absent or malformed file loads as the empty sequence.
    pub fn open(base_dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let base_dir: PathBuf = base_dir.into();
        fs::create_dir_all(&base_dir)?;
        let path = base_dir.join(STORE_FILE);

        let states = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(states) => states,
                Err(e) => {
                    log::warn!(
                        "Ignoring malformed saved-state file {}: {}",
                        path.display(),
                        e
                    );
                    Vec::new()
                }
            },
            Err(_) => Vec::new(),
        };

        Ok(Self {
            path,
            states: Mutex::new(states),
        })
    }

    pub fn open_default() -> Result<Self, StoreError> {
        Self::open(DEFAULT_BASE_DIR)
    }

    /// Append a new saved state with a fresh id and persist the sequence.
    pub fn save(&self, name: &str, amount: &str, unlock_time: u64) -> Result<SavedState, StoreError> {
        let state = SavedState {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            amount: amount.to_string(),
            unlock_time,
            date: Utc::now(),
        };

        let mut states = self.states.lock().unwrap();
        states.push(state.clone());
        self.persist(&states)?;
        log::info!("Saved state \"{}\" ({})", state.name, state.id);
        Ok(state)
    }

    /// All saved states in insertion order.
    pub fn list_all(&self) -> Vec<SavedState> {
        self.states.lock().unwrap().clone()
    }

    /// Resolve a saved state by id.
    pub fn get(&self, id: &str) -> Option<SavedState> {
        self.states
            .lock()
            .unwrap()
            .iter()
            .find(|state| state.id == id)
            .cloned()
    }

    /// Remove a saved state by id and persist. Unknown ids are a no-op.
    pub fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut states = self.states.lock().unwrap();
        let before = states.len();
        states.retain(|state| state.id != id);
        if states.len() != before {
            self.persist(&states)?;
        }
        Ok(())
    }

    fn persist(&self, states: &[SavedState]) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(states)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}
