//! Data models for trainer catalog entities.
//!
//! This module contains the data structures shared between the catalog
//! store, the cache, and the remote backend boundary:
//!
//! - `Trainer`: one entry in the remote catalog
//! - `InstalledTrainer`: a trainer plus local install/launch metadata
//! - `TrainerPage`: one page of catalog or search results

pub mod trainer;

pub use trainer::{InstalledTrainer, Trainer, TrainerPage};
