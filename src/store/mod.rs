//! File access collaborator
//!
//! The resolution core never touches the filesystem directly. It reads,
//! writes and lists preset records through [`ConfigStore`], which keeps the
//! core free of I/O policy and lets tests run against [`MemoryStore`].

mod fs;
mod memory;

pub use fs::FsStore;
pub use memory::MemoryStore;

use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use crate::error::PresetError;

/// Errors reported by a [`ConfigStore`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(PathBuf),

    #[error("parse error in {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("I/O error on {path}: {message}")]
    Io { path: PathBuf, message: String },
}

impl StoreError {
    /// Map a read-side failure into the preset taxonomy.
    pub fn into_read_error(self) -> PresetError {
        match self {
            StoreError::NotFound(path) => PresetError::Read {
                message: "file does not exist".to_string(),
                path,
            },
            StoreError::Parse { path, message } => PresetError::Parse { path, message },
            StoreError::Io { path, message } => PresetError::Read { path, message },
        }
    }

    /// Map a write-side failure into the preset taxonomy.
    pub fn into_write_error(self) -> PresetError {
        match self {
            StoreError::NotFound(path) => PresetError::Write {
                message: "parent directory does not exist".to_string(),
                path,
            },
            StoreError::Parse { path, message } | StoreError::Io { path, message } => {
                PresetError::Write { path, message }
            }
        }
    }
}

/// Storage backend for raw preset records.
///
/// Implementations must be shareable across threads; independent presets
/// may be resolved concurrently against one store.
pub trait ConfigStore: Send + Sync {
    /// Read and parse the record stored at `path`.
    fn read_config(&self, path: &Path) -> Result<Value, StoreError>;

    /// Replace the record stored at `path`.
    fn write_config(&self, path: &Path, properties: &Map<String, Value>) -> Result<(), StoreError>;

    /// Names of the direct children of `dir`, sorted.
    fn list_entries(&self, dir: &Path) -> Result<Vec<String>, StoreError>;

    /// Whether a file or directory exists at `path`.
    fn exists(&self, path: &Path) -> bool;
}

/// Keep only `.json` entries, returned with their file stems.
pub(crate) fn json_entries(entries: Vec<String>) -> Vec<(String, String)> {
    entries
        .into_iter()
        .filter_map(|entry| {
            let stem = entry.strip_suffix(".json")?.to_string();
            Some((entry, stem))
        })
        .collect()
}
