//! Backing stores: the host's key/value options table.
//!
//! The adapter only ever needs three primitives, so the trait stays that
//! small. Values are JSON so that tokens, states, and chain lists share one
//! representation regardless of the host.

pub mod lmdb;
pub mod memory;

pub use lmdb::{LmdbOptionStore, LmdbStoreError};
pub use memory::MemoryOptionStore;

use std::sync::Arc;

use optvault_core::VaultResult;
use serde_json::Value;

/// Synchronous key/value primitive provided by the host.
///
/// Implementations serialize concurrent access themselves; callers get no
/// atomicity across calls.
pub trait OptionStore: Send + Sync {
    /// Read the value under `key`, `None` if absent.
    fn get(&self, key: &str) -> VaultResult<Option<Value>>;

    /// Write `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: Value) -> VaultResult<()>;

    /// Remove `key`. Removing an absent key is not an error.
    fn delete(&self, key: &str) -> VaultResult<()>;
}

impl<S: OptionStore + ?Sized> OptionStore for &S {
    fn get(&self, key: &str) -> VaultResult<Option<Value>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: Value) -> VaultResult<()> {
        (**self).set(key, value)
    }

    fn delete(&self, key: &str) -> VaultResult<()> {
        (**self).delete(key)
    }
}

impl<S: OptionStore + ?Sized> OptionStore for Arc<S> {
    fn get(&self, key: &str) -> VaultResult<Option<Value>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: Value) -> VaultResult<()> {
        (**self).set(key, value)
    }

    fn delete(&self, key: &str) -> VaultResult<()> {
        (**self).delete(key)
    }
}

impl<S: OptionStore + ?Sized> OptionStore for Box<S> {
    fn get(&self, key: &str) -> VaultResult<Option<Value>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: Value) -> VaultResult<()> {
        (**self).set(key, value)
    }

    fn delete(&self, key: &str) -> VaultResult<()> {
        (**self).delete(key)
    }
}
