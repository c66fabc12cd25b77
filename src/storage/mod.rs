//! Filesystem data store.
//!
//! JSONL files are the source of truth:
//! - `teams.jsonl` at the root of the data directory
//! - one directory per team under `teams/` holding persons, events,
//!   attendees and stat rows

pub mod jsonl;
pub mod stats;

pub use jsonl::*;
pub use stats::*;

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),
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

    pub fn teams_path(&self) -> PathBuf {
        self.data_dir.join("teams.jsonl")
    }

    pub fn teams_dir(&self) -> PathBuf {
        self.data_dir.join("teams")
    }

    pub fn team_dir(&self, team_id: &str) -> PathBuf {
        self.teams_dir().join(team_id)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(PathBuf::from("./data"))
    }
}
