//! Domain models for catalog trainers.
//!
//! These types mirror what the remote backend returns, decoupled from any
//! particular transport. `InstalledTrainer` adds the local metadata the
//! catalog store maintains after a download.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One entry in the remote trainer catalog.
///
/// Immutable from the client's perspective; local state lives in
/// `InstalledTrainer`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trainer {
    pub id: String,
    pub name: String,
    pub version: String,
    pub game_version: String,
    pub download_url: String,
    pub description: String,
    pub thumbnail: String,
    #[serde(default)]
    pub download_count: u64,
    #[serde(default)]
    pub last_update: String,
}

/// A trainer plus local install metadata.
///
/// At most one record exists per trainer id. `last_launch_time` stays `None`
/// until the trainer is first launched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstalledTrainer {
    #[serde(flatten)]
    pub trainer: Trainer,
    pub installed_path: String,
    pub install_time: DateTime<Utc>,
    pub last_launch_time: Option<DateTime<Utc>>,
}

impl InstalledTrainer {
    /// Create an installed record for a freshly downloaded trainer.
    pub fn new(trainer: Trainer, installed_path: String) -> Self {
        Self {
            trainer,
            installed_path,
            install_time: Utc::now(),
            last_launch_time: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.trainer.id
    }
}

/// One page of catalog or search results, with the total remote count that
/// drives the page-count estimate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrainerPage {
    pub trainers: Vec<Trainer>,
    pub total: u32,
}

impl TrainerPage {
    /// Number of pages needed to show `total` entries at `page_size` per page.
    pub fn total_pages(&self, page_size: u32) -> u32 {
        self.total.div_ceil(page_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trainer(id: &str) -> Trainer {
        Trainer {
            id: id.to_string(),
            name: format!("Trainer {}", id),
            version: "1.0".to_string(),
            game_version: "1.2.3".to_string(),
            download_url: format!("https://example.com/{}.zip", id),
            description: String::new(),
            thumbnail: String::new(),
            download_count: 0,
            last_update: String::new(),
        }
    }

    #[test]
    fn test_total_pages_rounds_up() {
        let page = TrainerPage { trainers: vec![], total: 2 };
        assert_eq!(page.total_pages(20), 1);

        let page = TrainerPage { trainers: vec![], total: 20 };
        assert_eq!(page.total_pages(20), 1);

        let page = TrainerPage { trainers: vec![], total: 21 };
        assert_eq!(page.total_pages(20), 2);

        let page = TrainerPage { trainers: vec![], total: 0 };
        assert_eq!(page.total_pages(20), 0);
    }

    #[test]
    fn test_installed_trainer_starts_unlaunched() {
        let installed = InstalledTrainer::new(trainer("a"), "/tmp/a".to_string());
        assert_eq!(installed.id(), "a");
        assert!(installed.last_launch_time.is_none());
    }

    #[test]
    fn test_installed_trainer_serializes_flat() {
        let installed = InstalledTrainer::new(trainer("a"), "/tmp/a".to_string());
        let value = serde_json::to_value(&installed).unwrap();
        // Catalog fields sit at the top level alongside install metadata,
        // matching the persisted layout of earlier releases.
        assert_eq!(value["id"], "a");
        assert!(value["installed_path"].is_string());
        assert!(value["last_launch_time"].is_null());
    }
}
