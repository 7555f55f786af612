//! Filesystem-backed store

use serde_json::{Map, Value};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::{ConfigStore, StoreError};

/// Reads and writes JSON preset files on the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsStore;

impl FsStore {
    pub fn new() -> Self {
        Self
    }
}

fn io_error(path: &Path, err: io::Error) -> StoreError {
    if err.kind() == io::ErrorKind::NotFound {
        StoreError::NotFound(path.to_path_buf())
    } else {
        StoreError::Io {
            path: path.to_path_buf(),
            message: format!("{}\nYou may need to relaunch with elevated permissions", err),
        }
    }
}

impl ConfigStore for FsStore {
    fn read_config(&self, path: &Path) -> Result<Value, StoreError> {
        let data = fs::read_to_string(path).map_err(|e| io_error(path, e))?;
        serde_json::from_str(&data).map_err(|e| StoreError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Write pretty-printed JSON atomically (write-then-rename).
    fn write_config(&self, path: &Path, properties: &Map<String, Value>) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(properties).map_err(|e| StoreError::Io {
            path: path.to_path_buf(),
            message: format!("JSON serialization failed: {}", e),
        })?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
            }
        }

        let temp_path = temp_path_for(path);
        fs::write(&temp_path, json).map_err(|e| io_error(&temp_path, e))?;
        fs::rename(&temp_path, path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            io_error(path, e)
        })
    }

    fn list_entries(&self, dir: &Path) -> Result<Vec<String>, StoreError> {
        if !dir.is_dir() {
            return Err(StoreError::NotFound(dir.to_path_buf()));
        }

        let mut names = Vec::new();
        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| StoreError::Io {
                path: dir.to_path_buf(),
                message: e.to_string(),
            })?;
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        Ok(names)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
