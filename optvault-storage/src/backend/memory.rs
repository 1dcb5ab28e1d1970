//! In-memory option store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use optvault_core::{StorageError, VaultResult};
use serde_json::Value;

use super::OptionStore;

/// In-memory option store for tests and ephemeral hosts.
///
/// Counts every primitive call so tests can assert how many round trips an
/// operation made.
#[derive(Debug, Default)]
pub struct MemoryOptionStore {
    options: RwLock<HashMap<String, Value>>,
    reads: AtomicU64,
    writes: AtomicU64,
    deletes: AtomicU64,
}

impl MemoryOptionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `get` calls so far.
    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }

    /// Number of `set` calls so far.
    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    /// Number of `delete` calls so far.
    pub fn deletes(&self) -> u64 {
        self.deletes.load(Ordering::Relaxed)
    }

    /// Reset the call counters, keeping the data.
    pub fn reset_counters(&self) {
        self.reads.store(0, Ordering::Relaxed);
        self.writes.store(0, Ordering::Relaxed);
        self.deletes.store(0, Ordering::Relaxed);
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.options.read().map(|o| o.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check for a key without touching the read counter.
    pub fn contains_key(&self, key: &str) -> bool {
        self.options
            .read()
            .map(|o| o.contains_key(key))
            .unwrap_or(false)
    }

    /// Sorted snapshot of the stored keys.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .options
            .read()
            .map(|o| o.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }

    /// Clear all stored data.
    pub fn clear(&self) {
        if let Ok(mut options) = self.options.write() {
            options.clear();
        }
    }
}

impl OptionStore for MemoryOptionStore {
    fn get(&self, key: &str) -> VaultResult<Option<Value>> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        let options = self.options.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(options.get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> VaultResult<()> {
        self.writes.fetch_add(1, Ordering::Relaxed);
        let mut options = self.options.write().map_err(|_| StorageError::LockPoisoned)?;
        options.insert(key.to_string(), value);
        Ok(())
    }

    fn delete(&self, key: &str) -> VaultResult<()> {
        self.deletes.fetch_add(1, Ordering::Relaxed);
        let mut options = self.options.write().map_err(|_| StorageError::LockPoisoned)?;
        options.remove(key);
        Ok(())
    }
}
