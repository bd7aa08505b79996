//! Persistence bridge between the [`Store`] and [`SnapshotStorage`].
//!
//! Load happens once at startup; afterwards every dispatched action triggers a
//! full serialize-and-overwrite of the snapshot. Storage failures are logged
//! and never propagate: the in-memory state stays authoritative.

use std::collections::BTreeMap;

use anyhow::{Result, bail};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::db::SnapshotStorage;
use crate::models::{AppState, DailyLog, UserProfile};
use crate::store::{Action, StateObserver, Store, SubscriptionId};

/// Fixed storage key for the state snapshot.
pub const STATE_KEY: &str = "cal-ai-clone-state";

/// Blobs written before versioning carry no `version` field and read as 0.
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotOut<'a> {
    version: u32,
    profile: &'a UserProfile,
    daily_logs: &'a BTreeMap<NaiveDate, DailyLog>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotIn {
    #[serde(default)]
    version: u32,
    profile: UserProfile,
    #[serde(default)]
    daily_logs: BTreeMap<NaiveDate, DailyLog>,
}

fn snapshot_of(state: &AppState) -> SnapshotOut<'_> {
    SnapshotOut {
        version: SNAPSHOT_VERSION,
        profile: &state.profile,
        daily_logs: &state.daily_logs,
    }
}

pub fn encode_snapshot(state: &AppState) -> Result<String> {
    Ok(serde_json::to_string(&snapshot_of(state))?)
}

/// Pretty-printed snapshot, in the same shape as the stored blob.
pub fn export_snapshot(state: &AppState) -> Result<String> {
    Ok(serde_json::to_string_pretty(&snapshot_of(state))?)
}

pub fn decode_snapshot(raw: &str) -> Result<AppState> {
    let snapshot: SnapshotIn = serde_json::from_str(raw)?;
    if snapshot.version > SNAPSHOT_VERSION {
        bail!(
            "Snapshot version {} is newer than supported version {SNAPSHOT_VERSION}",
            snapshot.version
        );
    }
    Ok(AppState {
        profile: snapshot.profile,
        daily_logs: snapshot.daily_logs,
    })
}

/// Read the stored snapshot. `None` means "keep the defaults", whether because
/// nothing was stored or because the stored blob could not be used.
pub fn load_snapshot(storage: &dyn SnapshotStorage) -> Option<AppState> {
    let raw = match storage.get_item(STATE_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            tracing::debug!("No saved state found, starting from defaults");
            return None;
        }
        Err(e) => {
            tracing::error!("Failed to load state from storage: {e:#}");
            return None;
        }
    };

    match decode_snapshot(&raw) {
        Ok(state) => {
            tracing::debug!("Loaded state with {} daily log(s)", state.daily_logs.len());
            Some(state)
        }
        Err(e) => {
            tracing::warn!("Failed to parse saved state, using defaults: {e:#}");
            None
        }
    }
}

/// Store observer that writes the full snapshot after every transition.
pub struct PersistenceBridge<S> {
    storage: S,
}

impl<S: SnapshotStorage> PersistenceBridge<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn save(&self, state: &AppState) -> Result<()> {
        let raw = encode_snapshot(state)?;
        self.storage.set_item(STATE_KEY, &raw)
    }
}

impl<S: SnapshotStorage> StateObserver for PersistenceBridge<S> {
    fn on_change(&mut self, state: &AppState) {
        if let Err(e) = self.save(state) {
            tracing::error!("Failed to save state to storage: {e:#}");
        }
    }
}

/// Restore the saved snapshot into `store` and keep `storage` in sync from now on.
pub fn attach<S: SnapshotStorage + 'static>(store: &mut Store, storage: S) -> SubscriptionId {
    let restored = load_snapshot(&storage);
    let id = store.subscribe(Box::new(PersistenceBridge::new(storage)));
    if let Some(state) = restored {
        store.dispatch(Action::LoadState(state));
    }
    id
}
