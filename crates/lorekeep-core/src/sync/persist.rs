//! Persistence of live state into the local store

use serde_json::Value;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::campaign::{CampaignRecord, CURRENT_CAMPAIGN_ID, DEFAULT_CAMPAIGN_NAME};
use crate::storage::{LocalStore, StorageError};
use crate::sync::domains;
use crate::sync::migrate::{migrate_campaign_data, needs_migration};
use crate::sync::state::{LiveState, StateTree};

/// What startup hydration found
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Hydration {
    /// No stored campaign; live state left as is
    Empty,
    /// Stored campaign loaded unchanged
    Loaded,
    /// Stored campaign migrated from an older data version
    Migrated { from: String },
}

/// Bridges live state and the local store
#[derive(Clone)]
pub struct StateSync {
    store: LocalStore,
    state: LiveState,
}

impl StateSync {
    #[must_use]
    pub fn new(store: LocalStore, state: LiveState) -> Self {
        Self { store, state }
    }

    #[must_use]
    pub fn state(&self) -> &LiveState {
        &self.state
    }

    #[must_use]
    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    /// Load the current campaign into live state
    ///
    /// The hydration flag is set whether or not loading succeeds.
    ///
    /// # Errors
    /// Returns an error if the store cannot be read
    pub fn hydrate(&self) -> Result<Hydration, StorageError> {
        let result = self.load_current();
        self.state.mark_hydrated();

        match &result {
            Ok(Hydration::Empty) => info!("no stored campaign, starting fresh"),
            Ok(Hydration::Loaded) => info!("campaign state hydrated"),
            Ok(Hydration::Migrated { from }) => info!(from = %from, "campaign state hydrated after migration"),
            Err(e) => warn!(error = %e, "campaign hydration failed"),
        }

        result
    }

    fn load_current(&self) -> Result<Hydration, StorageError> {
        let Some(record) = self.store.get_campaign(CURRENT_CAMPAIGN_ID)? else {
            return Ok(Hydration::Empty);
        };

        let (data, outcome) = if needs_migration(&record.version) {
            let from = record.version.clone();
            (
                migrate_campaign_data(record.data, &from),
                Hydration::Migrated { from },
            )
        } else {
            (record.data, Hydration::Loaded)
        };

        // Live state and the stored record stay untouched
        let tree = match data {
            Value::Object(map) => map,
            other => {
                return Err(StorageError::Corrupt(format!(
                    "current campaign data is not an object: {}",
                    json_kind(&other)
                )))
            }
        };
        self.state.replace(tree);

        Ok(outcome)
    }

    /// Write one snapshot of live state as the current campaign
    ///
    /// # Errors
    /// Returns an error if the campaign cannot be written
    pub fn persist(&self, tree: &StateTree) -> Result<CampaignRecord, StorageError> {
        persist_tree(&self.store, tree)
    }

    /// Write the current live state immediately
    ///
    /// # Errors
    /// Returns an error if the campaign cannot be written
    pub fn flush(&self) -> Result<CampaignRecord, StorageError> {
        self.persist(&self.state.snapshot())
    }

    /// Start the background consumer that persists every change
    ///
    /// Changes already present when this is called are not replayed.
    #[must_use]
    pub fn spawn(&self) -> PersistenceHandle {
        let (shutdown, shutdown_rx) = watch::channel(false);
        let mut changes = self.state.subscribe();
        changes.borrow_and_update();

        let store = self.store.clone();
        let task = tokio::spawn(run_consumer(store, changes, shutdown_rx));

        PersistenceHandle { shutdown, task }
    }
}

async fn run_consumer(
    store: LocalStore,
    mut changes: watch::Receiver<Arc<StateTree>>,
    mut shutdown: watch::Receiver<bool>,
) {
    debug!("persistence consumer started");
    loop {
        tokio::select! {
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
                let tree = changes.borrow_and_update().clone();
                persist_logged(&store, &tree);
            }
            _ = shutdown.changed() => {
                // Drain the edit that raced the shutdown signal
                if changes.has_changed().unwrap_or(false) {
                    let tree = changes.borrow_and_update().clone();
                    persist_logged(&store, &tree);
                }
                break;
            }
        }
    }
    debug!("persistence consumer stopped");
}

fn persist_logged(store: &LocalStore, tree: &StateTree) {
    match persist_tree(store, tree) {
        Ok(record) => debug!(updated_at = %record.updated_at, "campaign state persisted"),
        // Live state stays authoritative; the next change retries the write
        Err(e) => warn!(error = %e, "failed to persist campaign state"),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn persist_tree(store: &LocalStore, tree: &StateTree) -> Result<CampaignRecord, StorageError> {
    let data = domains::extract_persisted(&Value::Object(tree.clone()));
    let name = domains::campaign_name(&data)
        .unwrap_or(DEFAULT_CAMPAIGN_NAME)
        .to_string();
    store.save_campaign(&CampaignRecord::current(name, data))
}

/// Running persistence consumer
pub struct PersistenceHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl PersistenceHandle {
    /// Persist any pending change and stop the consumer
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            warn!(error = %e, "persistence consumer ended abnormally");
        }
    }
}
