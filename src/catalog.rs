//! Catalog browsing and ownership state.
//!
//! `CatalogStore` is the single source of truth for the trainer catalog
//! view and the installed/downloaded records. It is handed its backend,
//! storage, and notifier explicitly; nothing here reads ambient globals.
//!
//! Read operations (fetch/search/initialize) are fail-soft: when the
//! backend stays down past the retry budget, the previously displayed list
//! is preserved and the failure is surfaced through the notifier. Write
//! operations (download/delete/launch) are fail-closed: local lists only
//! change after the backend confirms, and every list mutation is persisted
//! before the operation reports success.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::backend::{BackendError, TrainerBackend};
use crate::cache::CacheStore;
use crate::config::Config;
use crate::models::{InstalledTrainer, Trainer, TrainerPage};
use crate::notify::{self, Notifier, RawError};
use crate::retry::with_retry;
use crate::storage::Storage;

/// Catalog page size fixed by the backend.
pub const PAGE_SIZE: u32 = 20;

/// Durable storage key for the installed list.
pub const INSTALLED_TRAINERS_KEY: &str = "installedTrainers";

/// Durable storage key for the downloaded list.
pub const DOWNLOADED_TRAINERS_KEY: &str = "downloadedTrainers";

/// Entries shown in the recently-installed/recently-launched views.
const RECENT_VIEW_LIMIT: usize = 5;

/// State container and orchestrator for the trainer catalog.
pub struct CatalogStore<B> {
    backend: B,
    storage: Arc<dyn Storage>,
    cache: CacheStore,
    notifier: Option<Arc<dyn Notifier>>,
    max_retries: u32,
    base_delay: Duration,

    /// The currently displayed catalog page or search results.
    pub trainers: Vec<Trainer>,
    /// Installed records, at most one per trainer id.
    pub installed: Vec<InstalledTrainer>,
    /// Downloaded trainers, at most one per trainer id.
    pub downloaded: Vec<Trainer>,
    pub is_loading: bool,
    /// User-facing message for the most recent failure.
    pub error: Option<String>,
    /// Active search query; empty means plain catalog browsing.
    pub search_query: String,
    pub current_page: u32,
    pub total_pages: u32,
}

impl<B: TrainerBackend> CatalogStore<B> {
    pub fn new(backend: B, storage: Arc<dyn Storage>, config: &Config) -> Self {
        let cache = CacheStore::with_ttl(storage.clone(), config.cache_ttl());
        Self {
            backend,
            storage,
            cache,
            notifier: None,
            max_retries: config.max_retries,
            base_delay: config.retry_base_delay(),
            trainers: Vec::new(),
            installed: Vec::new(),
            downloaded: Vec::new(),
            is_loading: false,
            error: None,
            search_query: String::new(),
            current_page: 1,
            total_pages: 0,
        }
    }

    /// Attach the presentation channel errors are surfaced through.
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Load the durable lists, sweep expired cache entries, and fetch the
    /// first catalog page.
    ///
    /// Initialization failure is recoverable: it is recorded and reported
    /// but never raised past this boundary, so the UI can retry.
    pub async fn initialize(&mut self) {
        self.is_loading = true;
        self.error = None;

        self.installed = self.load_list(INSTALLED_TRAINERS_KEY);
        self.downloaded = self.load_list(DOWNLOADED_TRAINERS_KEY);
        info!(
            installed = self.installed.len(),
            downloaded = self.downloaded.len(),
            "Loaded local trainer records"
        );

        self.cache.sweep();

        if let Err(e) = self.fetch_trainers(1).await {
            // Already recorded and reported; the UI keeps its retry path.
            debug!(error = %e, "Initial catalog fetch failed");
        }

        self.is_loading = false;
    }

    /// Fetch one catalog page, cache-first.
    ///
    /// A fresh cache entry is served without a remote call. On a miss the
    /// backend is called through the retry executor and the result written
    /// through to the cache. Exhausted retries leave the previous list in
    /// place.
    pub async fn fetch_trainers(&mut self, page: u32) -> Result<()> {
        let key = CacheStore::trainer_list_key(page);
        if let Some(cached) = self.cache.get::<TrainerPage>(&key) {
            debug!(page, count = cached.trainers.len(), "Serving catalog page from cache");
            self.apply_page(cached, page);
            return Ok(());
        }

        let backend = &self.backend;
        let result = with_retry(
            move || backend.fetch_trainers(page),
            self.max_retries,
            self.base_delay,
        )
        .await;

        match result {
            Ok(fetched) => {
                self.write_through(&key, &fetched);
                self.apply_page(fetched, page);
                Ok(())
            }
            Err(e) => Err(self.record_failure(e).into()),
        }
    }

    /// Search the catalog, cache-first under the (query, page) key.
    ///
    /// An empty or whitespace query is plain catalog browsing and delegates
    /// to `fetch_trainers` so it shares the page cache namespace.
    pub async fn search_trainers(&mut self, query: &str, page: u32) -> Result<()> {
        if query.trim().is_empty() {
            self.search_query.clear();
            return self.fetch_trainers(page).await;
        }

        self.search_query = query.to_string();
        let key = CacheStore::search_results_key(query, page);
        if let Some(cached) = self.cache.get::<TrainerPage>(&key) {
            debug!(query, page, "Serving search results from cache");
            self.apply_page(cached, page);
            return Ok(());
        }

        let backend = &self.backend;
        let result = with_retry(
            move || backend.search_trainers(query, page),
            self.max_retries,
            self.base_delay,
        )
        .await;

        match result {
            Ok(found) => {
                self.write_through(&key, &found);
                self.apply_page(found, page);
                Ok(())
            }
            Err(e) => Err(self.record_failure(e).into()),
        }
    }

    /// Fetch full detail for one trainer.
    pub async fn get_trainer_detail(&mut self, id: &str) -> Result<Trainer> {
        let backend = &self.backend;
        let result = with_retry(
            move || backend.get_trainer_detail(id),
            self.max_retries,
            self.base_delay,
        )
        .await;

        match result {
            Ok(trainer) => Ok(trainer),
            Err(e) => Err(self.record_failure(e).into()),
        }
    }

    /// Download a trainer and record it as downloaded and installed.
    ///
    /// The backend download and the local list appends form one unit: the
    /// lists only change after the download confirms. Appends are keyed by
    /// id, so re-downloading an already-held trainer never duplicates a
    /// record.
    pub async fn download_trainer(&mut self, trainer: &Trainer) -> Result<()> {
        let backend = &self.backend;
        let result = with_retry(
            move || backend.download_trainer(trainer),
            self.max_retries,
            self.base_delay,
        )
        .await;

        let path = match result {
            Ok(path) => path,
            Err(e) => return Err(self.record_failure(e).into()),
        };
        info!(id = %trainer.id, path = %path, "Trainer downloaded");

        if !self.downloaded.iter().any(|t| t.id == trainer.id) {
            self.downloaded.push(trainer.clone());
            self.persist_downloaded()?;
        }

        if !self.installed.iter().any(|t| t.id() == trainer.id) {
            self.installed
                .push(InstalledTrainer::new(trainer.clone(), path));
            self.persist_installed()?;
        }

        // Server-side download counters changed; cached pages are stale.
        self.cache.invalidate_catalog();
        Ok(())
    }

    /// Delete a trainer's local files and forget it.
    ///
    /// The backend delete runs first; both lists stay untouched unless it
    /// confirms.
    pub async fn delete_trainer(&mut self, id: &str) -> Result<()> {
        let backend = &self.backend;
        let result = with_retry(
            move || backend.delete_trainer(id),
            self.max_retries,
            self.base_delay,
        )
        .await;

        if let Err(e) = result {
            return Err(self.record_failure(e).into());
        }

        self.downloaded.retain(|t| t.id != id);
        self.persist_downloaded()?;
        self.installed.retain(|t| t.id() != id);
        self.persist_installed()?;
        info!(id, "Trainer deleted");

        self.cache.invalidate_catalog();
        Ok(())
    }

    /// Launch an installed trainer and stamp its last-launch time.
    ///
    /// A missing installed record is a local consistency fault; the remote
    /// call is not issued.
    pub async fn launch_trainer(&mut self, id: &str) -> Result<()> {
        let Some(index) = self.installed.iter().position(|t| t.id() == id) else {
            let err = BackendError::NotFound(format!("no installed trainer with id {}", id));
            return Err(self.record_failure(err).into());
        };

        let backend = &self.backend;
        let result = with_retry(
            move || backend.launch_trainer(id),
            self.max_retries,
            self.base_delay,
        )
        .await;

        if let Err(e) = result {
            return Err(self.record_failure(e).into());
        }

        self.installed[index].last_launch_time = Some(Utc::now());
        self.persist_installed()?;
        info!(id, "Trainer launched");
        Ok(())
    }

    /// Refresh the catalog fields of an installed record after an update,
    /// keeping its install metadata.
    pub fn update_trainer(&mut self, trainer: &Trainer) -> Result<()> {
        let Some(index) = self.installed.iter().position(|t| t.id() == trainer.id) else {
            let err = BackendError::NotFound(format!("no installed trainer with id {}", trainer.id));
            return Err(self.record_failure(err).into());
        };

        self.installed[index].trainer = trainer.clone();
        self.persist_installed()?;
        Ok(())
    }

    /// The installed record for `id`, if any.
    pub fn get_trainer(&self, id: &str) -> Option<&InstalledTrainer> {
        self.installed.iter().find(|t| t.id() == id)
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// The 5 most recently installed trainers, newest first.
    pub fn recently_installed(&self) -> Vec<&InstalledTrainer> {
        let mut records: Vec<&InstalledTrainer> = self.installed.iter().collect();
        records.sort_by(|a, b| b.install_time.cmp(&a.install_time));
        records.truncate(RECENT_VIEW_LIMIT);
        records
    }

    /// The 5 most recently launched trainers, newest first. Records that
    /// were never launched are excluded entirely.
    pub fn recently_launched(&self) -> Vec<&InstalledTrainer> {
        let mut records: Vec<&InstalledTrainer> = self
            .installed
            .iter()
            .filter(|t| t.last_launch_time.is_some())
            .collect();
        records.sort_by(|a, b| b.last_launch_time.cmp(&a.last_launch_time));
        records.truncate(RECENT_VIEW_LIMIT);
        records
    }

    fn apply_page(&mut self, page_data: TrainerPage, page: u32) {
        self.total_pages = page_data.total_pages(PAGE_SIZE);
        self.trainers = page_data.trainers;
        self.current_page = page;
    }

    /// Cache write failure must not fail a fetch that already succeeded.
    fn write_through(&self, key: &str, page_data: &TrainerPage) {
        if let Err(e) = self.cache.set(key, page_data) {
            warn!(key, error = %e, "Failed to write catalog page to cache");
        }
    }

    /// Classify, log, and surface a failure, recording its user-facing
    /// message; the error is handed back for propagation.
    fn record_failure(&mut self, err: BackendError) -> BackendError {
        let raw = RawError::Structured {
            code: err.error_code(),
            message: err.user_message(),
            details: err.to_string(),
        };
        let classified = notify::report(raw, self.notifier.as_deref());
        self.error = Some(classified.message);
        err
    }

    /// Durable lists load fail-soft: a missing or malformed list is logged
    /// and treated as empty.
    fn load_list<T: DeserializeOwned>(&self, key: &str) -> Vec<T> {
        match self.storage.get(key) {
            Some(value) => match serde_json::from_value(value) {
                Ok(list) => list,
                Err(e) => {
                    warn!(key, error = %e, "Stored list is malformed, starting empty");
                    Vec::new()
                }
            },
            None => Vec::new(),
        }
    }

    fn persist_installed(&self) -> Result<()> {
        self.storage
            .set(INSTALLED_TRAINERS_KEY, serde_json::to_value(&self.installed)?)
            .context("Failed to persist installed trainers")
    }

    fn persist_downloaded(&self) -> Result<()> {
        self.storage
            .set(DOWNLOADED_TRAINERS_KEY, serde_json::to_value(&self.downloaded)?)
            .context("Failed to persist downloaded trainers")
    }
}
