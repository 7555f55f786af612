//! In-memory store for tests and embedding

use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{ConfigStore, StoreError};

/// Keeps records in a map keyed by path.
///
/// Directories exist implicitly whenever some record lives below them.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<BTreeMap<PathBuf, Value>>,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a record as-is (it need not be an object).
    pub fn insert(&self, path: impl Into<PathBuf>, value: Value) {
        self.write_guard().insert(path.into(), value);
    }

    pub fn get(&self, path: &Path) -> Option<Value> {
        self.read_guard().get(path).cloned()
    }

    pub fn remove(&self, path: &Path) -> Option<Value> {
        self.write_guard().remove(path)
    }

    /// Make subsequent writes fail with an I/O error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn read_guard(&self) -> RwLockReadGuard<'_, BTreeMap<PathBuf, Value>> {
        self.records.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_guard(&self) -> RwLockWriteGuard<'_, BTreeMap<PathBuf, Value>> {
        self.records.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl ConfigStore for MemoryStore {
    fn read_config(&self, path: &Path) -> Result<Value, StoreError> {
        self.get(path)
            .ok_or_else(|| StoreError::NotFound(path.to_path_buf()))
    }

    fn write_config(&self, path: &Path, properties: &Map<String, Value>) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                message: "simulated write failure".to_string(),
            });
        }
        self.insert(path, Value::Object(properties.clone()));
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn list_entries(&self, dir: &Path) -> Result<Vec<String>, StoreError> {
        let records = self.read_guard();
        let names: BTreeSet<String> = records
            .keys()
            .filter_map(|path| path.strip_prefix(dir).ok())
            .filter_map(|rest| match rest.components().next() {
                Some(Component::Normal(first)) => Some(first.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();

        if names.is_empty() {
            return Err(StoreError::NotFound(dir.to_path_buf()));
        }
        Ok(names.into_iter().collect())
    }

    fn exists(&self, path: &Path) -> bool {
        self.read_guard()
            .keys()
            .any(|p| p == path || p.starts_with(path))
    }
}
