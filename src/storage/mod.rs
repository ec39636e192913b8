//! Filesystem record storage.
//!
//! Layout under the data directory:
//! - `collections/` one JSONL file per keyed collection
//! - `state/` small single-document files (the scratchpad)

pub mod jsonl;
pub mod store;

pub use store::{RecordStore, Scratchpad};

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Unreadable line {line} in {path}; refusing to rewrite")]
    Corrupt { path: String, line: usize },
}

/// The four keyed collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Matches,
    Improvements,
    ArchiveLinks,
    PlayerRanks,
}

impl Collection {
    pub fn filename(&self) -> &'static str {
        match self {
            Collection::Matches => "matches.jsonl",
            Collection::Improvements => "improvements.jsonl",
            Collection::ArchiveLinks => "archive_links.jsonl",
            Collection::PlayerRanks => "player_ranks.jsonl",
        }
    }
}

/// Configuration for storage paths.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl StorageConfig {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    pub fn collections_dir(&self) -> PathBuf {
        self.data_dir.join("collections")
    }

    pub fn state_dir(&self) -> PathBuf {
        self.data_dir.join("state")
    }

    pub fn collection_path(&self, collection: Collection) -> PathBuf {
        self.collections_dir().join(collection.filename())
    }

    pub fn scratchpad_path(&self) -> PathBuf {
        self.state_dir().join("scratchpad.json")
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(PathBuf::from("./data"))
    }
}
