//! Per-namespace entry cache.

use std::collections::HashMap;

use super::stats::CacheStats;

/// Service → last value read or written through the adapter.
///
/// Owned by a single adapter and mutated through `&mut self`; there is no
/// locking and no expiry. A disabled cache stores nothing and records no
/// hits or misses, so every lookup goes to the backing store.
#[derive(Debug, Clone)]
pub struct EntryCache<T> {
    entries: HashMap<String, T>,
    enabled: bool,
    stats: CacheStats,
}

impl<T: Clone> EntryCache<T> {
    pub fn new(enabled: bool) -> Self {
        Self {
            entries: HashMap::new(),
            enabled,
            stats: CacheStats::default(),
        }
    }

    /// Look up `service`, recording a hit or miss.
    pub fn get(&mut self, service: &str) -> Option<T> {
        if !self.enabled {
            return None;
        }
        match self.entries.get(service) {
            Some(value) => {
                self.stats.hits += 1;
                Some(value.clone())
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    pub fn put(&mut self, service: &str, value: T) {
        if self.enabled {
            self.entries.insert(service.to_string(), value);
        }
    }

    /// Drop the entry for `service`. Returns whether one was cached.
    pub fn evict(&mut self, service: &str) -> bool {
        let removed = self.entries.remove(service).is_some();
        if removed {
            self.stats.evictions += 1;
        }
        removed
    }

    /// Drop every entry. Returns how many were cached.
    pub fn clear(&mut self) -> u64 {
        let dropped = self.entries.len() as u64;
        self.entries.clear();
        self.stats.evictions += dropped;
        dropped
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entry_count: self.entries.len() as u64,
            ..self.stats
        }
    }
}
