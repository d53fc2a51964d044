//! Remote command boundary for the trainer backend.
//!
//! The backend performs the actual network fetch, file download, install,
//! and process launch. This layer only depends on the call/response
//! contracts below; any transport (local IPC, RPC, in-process) can sit
//! behind the trait.

pub mod error;

use std::collections::HashMap;

use serde_json::Value;

use crate::models::{Trainer, TrainerPage};

pub use error::{BackendError, BackendResult, ErrorCode};

/// The seven commands the remote backend answers.
///
/// Futures need not be `Send`; the catalog store drives every call from a
/// single task.
#[allow(async_fn_in_trait)]
pub trait TrainerBackend {
    /// Fetch one catalog page (pages start at 1).
    async fn fetch_trainers(&self, page: u32) -> BackendResult<TrainerPage>;

    /// Search the catalog. Callers are responsible for not passing an
    /// empty query.
    async fn search_trainers(&self, query: &str, page: u32) -> BackendResult<TrainerPage>;

    /// Full detail for one trainer; `NotFound` if the id is unknown.
    async fn get_trainer_detail(&self, id: &str) -> BackendResult<Trainer>;

    /// Download and unpack a trainer, returning the local install path.
    async fn download_trainer(&self, trainer: &Trainer) -> BackendResult<String>;

    /// Remove a trainer's local files. Local bookkeeping must only change
    /// after this confirms.
    async fn delete_trainer(&self, id: &str) -> BackendResult<()>;

    /// Start the trainer's external process.
    async fn launch_trainer(&self, id: &str) -> BackendResult<()>;

    /// One-shot transfer of legacy flat-storage records into the
    /// backend-owned store.
    async fn migrate_local_storage(&self, payload: HashMap<String, Value>) -> BackendResult<()>;
}
