//! Trainerdock core - client-side catalog cache and synchronization layer.
//!
//! This crate keeps a locally addressable view of a remote catalog of
//! downloadable trainers, tracks which of them the user has downloaded and
//! installed, and reconciles that view with the backend that performs the
//! actual network, file, and process work.
//!
//! The pieces, leaves first:
//!
//! - [`storage`]: durable namespaced key-value persistence
//! - [`cache`]: TTL envelopes over storage with lazy sweep
//! - [`retry`]: bounded retries with linear backoff
//! - [`notify`]: error classification and the injected presentation channel
//! - [`migrate`]: one-shot transfer of legacy flat storage to the backend
//! - [`catalog`]: the orchestrating [`CatalogStore`]
//!
//! Everything is injected explicitly: a [`CatalogStore`] is built from a
//! [`TrainerBackend`] implementation, a shared [`Storage`], and a `Config`,
//! and optionally a [`Notifier`] for surfacing failures to the user.

pub mod backend;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod migrate;
pub mod models;
pub mod notify;
pub mod retry;
pub mod storage;

pub use backend::{BackendError, BackendResult, ErrorCode, TrainerBackend};
pub use cache::{CacheEntry, CacheStore};
pub use catalog::CatalogStore;
pub use config::Config;
pub use migrate::MigrationService;
pub use models::{InstalledTrainer, Trainer, TrainerPage};
pub use notify::{Classified, LogNotifier, Notifier, RawError, Severity};
pub use retry::with_retry;
pub use storage::{JsonFileStorage, MemoryStorage, Storage};

/// Install a subscriber for test runs so `RUST_LOG` controls log output.
/// Safe to call from every test; only the first call wins.
#[cfg(test)]
pub(crate) fn init_test_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_test_writer())
        .with(filter)
        .try_init();
}
