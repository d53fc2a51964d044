//! One-time migration of legacy flat storage into the backend-owned store.
//!
//! Early releases persisted the ownership lists and cache envelopes in a
//! flat key-value document. On startup this service transfers whatever is
//! still usable (both lists plus unexpired cache entries) to the backend in
//! a single call, then marks the migration done and clears the keys it
//! moved. The completion flag only flips after the backend confirms, so a
//! failed transfer is retried on the next startup with the legacy data
//! still intact.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::backend::TrainerBackend;
use crate::cache::{CacheEntry, SEARCH_RESULTS_PREFIX, TRAINER_LIST_PREFIX};
use crate::catalog::{DOWNLOADED_TRAINERS_KEY, INSTALLED_TRAINERS_KEY};
use crate::models::{InstalledTrainer, Trainer};
use crate::storage::Storage;

/// Legacy-store key recording that migration already ran.
pub const MIGRATION_FLAG_KEY: &str = "storage_migrated";

pub struct MigrationService {
    legacy: Arc<dyn Storage>,
}

impl MigrationService {
    pub fn new(legacy: Arc<dyn Storage>) -> Self {
        Self { legacy }
    }

    pub fn is_migrated(&self) -> bool {
        self.legacy
            .get(MIGRATION_FLAG_KEY)
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }

    /// Clear the completion flag so the next `migrate` runs again.
    pub fn reset(&self) -> Result<()> {
        self.legacy.remove(MIGRATION_FLAG_KEY)
    }

    /// Run the migration if it has not completed yet.
    ///
    /// Collection is tolerant: a malformed record type is logged and
    /// skipped without aborting the rest. The backend transfer is a single
    /// call; only its success sets the flag and clears the migrated keys.
    pub async fn migrate<B: TrainerBackend>(&self, backend: &B) -> Result<()> {
        if self.is_migrated() {
            debug!("Storage already migrated");
            return Ok(());
        }

        let payload = self.collect();

        if !payload.is_empty() {
            backend
                .migrate_local_storage(payload.clone())
                .await
                .context("Failed to transfer legacy storage to backend")?;
        }

        self.legacy
            .set(MIGRATION_FLAG_KEY, Value::Bool(true))
            .context("Failed to record migration completion")?;

        for key in payload.keys() {
            if let Err(e) = self.legacy.remove(key) {
                warn!(key, error = %e, "Failed to clear migrated legacy key");
            }
        }

        info!(records = payload.len(), "Storage migration completed");
        Ok(())
    }

    fn collect(&self) -> HashMap<String, Value> {
        let mut payload = HashMap::new();

        if let Some(value) = self.legacy.get(INSTALLED_TRAINERS_KEY) {
            match serde_json::from_value::<Vec<InstalledTrainer>>(value.clone()) {
                Ok(_) => {
                    payload.insert(INSTALLED_TRAINERS_KEY.to_string(), value);
                }
                Err(e) => warn!(error = %e, "Skipping malformed legacy installed list"),
            }
        }

        if let Some(value) = self.legacy.get(DOWNLOADED_TRAINERS_KEY) {
            match serde_json::from_value::<Vec<Trainer>>(value.clone()) {
                Ok(_) => {
                    payload.insert(DOWNLOADED_TRAINERS_KEY.to_string(), value);
                }
                Err(e) => warn!(error = %e, "Skipping malformed legacy downloaded list"),
            }
        }

        // Cache envelopes only travel if still servable at migration time.
        for key in self.legacy.keys() {
            if !key.starts_with(TRAINER_LIST_PREFIX) && !key.starts_with(SEARCH_RESULTS_PREFIX) {
                continue;
            }
            let Some(value) = self.legacy.get(&key) else {
                continue;
            };
            match serde_json::from_value::<CacheEntry<Value>>(value.clone()) {
                Ok(entry) if !entry.is_expired() => {
                    payload.insert(key, value);
                }
                Ok(_) => debug!(key, "Skipping expired legacy cache entry"),
                Err(e) => warn!(key, error = %e, "Skipping malformed legacy cache entry"),
            }
        }

        payload
    }
}
