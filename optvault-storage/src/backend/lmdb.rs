//! LMDB-backed option store.
//!
//! Uses the heed crate (Rust bindings for LMDB) to give hosts without an
//! options table of their own a durable, memory-mapped key/value store.
//!
//! # Format
//!
//! Keys are the UTF-8 option names. Values are the JSON encoding of the
//! stored value.
//!
//! # Thread Safety
//!
//! LMDB provides ACID transactions. The store uses:
//! - Read transactions for `get`
//! - Write transactions for `set` and `delete`

use std::path::Path;

use heed::types::{Bytes, Str};
use heed::{Database, Env, EnvOpenOptions};
use optvault_core::{StorageError, VaultError, VaultResult};
use serde_json::Value;

use super::OptionStore;

/// Error type for LMDB store operations.
#[derive(Debug, thiserror::Error)]
pub enum LmdbStoreError {
    /// Failed to open or create the LMDB environment.
    #[error("Failed to open LMDB environment: {0}")]
    EnvOpen(String),

    /// Failed to open the database within the environment.
    #[error("Failed to open database: {0}")]
    DbOpen(String),

    /// Transaction error.
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// Stored bytes are not valid JSON.
    #[error("Deserialization error for {key}: {reason}")]
    Deserialization { key: String, reason: String },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convert LmdbStoreError to VaultError.
impl From<LmdbStoreError> for VaultError {
    fn from(e: LmdbStoreError) -> Self {
        match e {
            LmdbStoreError::Deserialization { key, reason } => {
                VaultError::Storage(StorageError::Serialization { key, reason })
            }
            other => VaultError::Storage(StorageError::Backend {
                reason: other.to_string(),
            }),
        }
    }
}

/// Durable option store on LMDB.
///
/// # Example
///
/// ```ignore
/// use optvault_storage::LmdbOptionStore;
///
/// let store = LmdbOptionStore::open("/var/lib/myapp/options", 10)?;
/// let mut storage = OptionsTokenStorage::new(store, "oauth_token", "oauth_state");
/// ```
pub struct LmdbOptionStore {
    /// The LMDB environment.
    env: Env,
    /// The main database (single unnamed database).
    db: Database<Str, Bytes>,
}

impl LmdbOptionStore {
    /// Open (creating if needed) an LMDB option store.
    ///
    /// # Arguments
    ///
    /// * `path` - Directory where LMDB files will be stored
    /// * `max_size_mb` - Maximum size of the database in megabytes
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The directory cannot be created
    /// - LMDB environment cannot be opened
    /// - Database cannot be created
    pub fn open<P: AsRef<Path>>(path: P, max_size_mb: usize) -> Result<Self, LmdbStoreError> {
        std::fs::create_dir_all(&path)?;

        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(max_size_mb * 1024 * 1024)
                .max_dbs(1)
                .open(path.as_ref())
        }
        .map_err(|e| LmdbStoreError::EnvOpen(e.to_string()))?;

        let mut wtxn = env
            .write_txn()
            .map_err(|e| LmdbStoreError::Transaction(e.to_string()))?;

        let db: Database<Str, Bytes> = env
            .create_database(&mut wtxn, None)
            .map_err(|e| LmdbStoreError::DbOpen(e.to_string()))?;

        wtxn.commit()
            .map_err(|e| LmdbStoreError::Transaction(e.to_string()))?;

        Ok(Self { env, db })
    }

    /// Number of stored options.
    pub fn len(&self) -> Result<u64, LmdbStoreError> {
        let rtxn = self
            .env
            .read_txn()
            .map_err(|e| LmdbStoreError::Transaction(e.to_string()))?;
        self.db
            .len(&rtxn)
            .map_err(|e| LmdbStoreError::Transaction(e.to_string()))
    }

    pub fn is_empty(&self) -> Result<bool, LmdbStoreError> {
        Ok(self.len()? == 0)
    }
}

impl OptionStore for LmdbOptionStore {
    fn get(&self, key: &str) -> VaultResult<Option<Value>> {
        let rtxn = self
            .env
            .read_txn()
            .map_err(|e| LmdbStoreError::Transaction(e.to_string()))?;

        let bytes = self
            .db
            .get(&rtxn, key)
            .map_err(|e| LmdbStoreError::Transaction(e.to_string()))?;

        match bytes {
            Some(bytes) => {
                let value = serde_json::from_slice(bytes).map_err(|e| {
                    LmdbStoreError::Deserialization {
                        key: key.to_string(),
                        reason: e.to_string(),
                    }
                })?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: Value) -> VaultResult<()> {
        let bytes = serde_json::to_vec(&value).map_err(|e| StorageError::Serialization {
            key: key.to_string(),
            reason: e.to_string(),
        })?;

        let mut wtxn = self
            .env
            .write_txn()
            .map_err(|e| LmdbStoreError::Transaction(e.to_string()))?;

        self.db
            .put(&mut wtxn, key, bytes.as_slice())
            .map_err(|e| LmdbStoreError::Transaction(e.to_string()))?;

        wtxn.commit()
            .map_err(|e| LmdbStoreError::Transaction(e.to_string()))?;

        Ok(())
    }

    fn delete(&self, key: &str) -> VaultResult<()> {
        let mut wtxn = self
            .env
            .write_txn()
            .map_err(|e| LmdbStoreError::Transaction(e.to_string()))?;

        self.db
            .delete(&mut wtxn, key)
            .map_err(|e| LmdbStoreError::Transaction(e.to_string()))?;

        wtxn.commit()
            .map_err(|e| LmdbStoreError::Transaction(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn create_test_store() -> (LmdbOptionStore, TempDir) {
        let temp_dir = TempDir::new().expect("TempDir creation should succeed");
        let store = LmdbOptionStore::open(temp_dir.path(), 10).expect("store open should succeed");
        (store, temp_dir)
    }

    #[test]
    fn test_open_empty() {
        let (store, _temp_dir) = create_test_store();
        assert!(store.is_empty().expect("len should succeed"));
    }

    #[test]
    fn test_set_and_get() {
        let (store, _temp_dir) = create_test_store();

        store
            .set("oauth_token_github", json!({ "access_token": "abc" }))
            .expect("set should succeed");

        let value = store.get("oauth_token_github").expect("get should succeed");
        assert_eq!(value, Some(json!({ "access_token": "abc" })));
    }

    #[test]
    fn test_get_nonexistent() {
        let (store, _temp_dir) = create_test_store();
        assert_eq!(store.get("missing").expect("get should succeed"), None);
    }

    #[test]
    fn test_overwrite() {
        let (store, _temp_dir) = create_test_store();
        store.set("k", json!("first")).expect("set should succeed");
        store.set("k", json!("second")).expect("set should succeed");
        assert_eq!(store.get("k").expect("get should succeed"), Some(json!("second")));
        assert_eq!(store.len().expect("len should succeed"), 1);
    }

    #[test]
    fn test_delete() {
        let (store, _temp_dir) = create_test_store();
        store.set("k", json!(1)).expect("set should succeed");
        store.delete("k").expect("delete should succeed");
        assert_eq!(store.get("k").expect("get should succeed"), None);

        // Deleting again is a no-op.
        store.delete("k").expect("delete should succeed");
    }

    #[test]
    fn test_persists_across_reopen() {
        let temp_dir = TempDir::new().expect("TempDir creation should succeed");
        {
            let store =
                LmdbOptionStore::open(temp_dir.path(), 10).expect("store open should succeed");
            store
                .set("_keychain_oauth_token", json!(["github", "google"]))
                .expect("set should succeed");
        }

        let store = LmdbOptionStore::open(temp_dir.path(), 10).expect("reopen should succeed");
        assert_eq!(
            store.get("_keychain_oauth_token").expect("get should succeed"),
            Some(json!(["github", "google"]))
        );
    }

    #[test]
    fn test_error_conversion() {
        let err: VaultError = LmdbStoreError::Transaction("boom".to_string()).into();
        assert!(matches!(err, VaultError::Storage(StorageError::Backend { .. })));

        let err: VaultError = LmdbStoreError::Deserialization {
            key: "k".to_string(),
            reason: "bad".to_string(),
        }
        .into();
        assert!(matches!(
            err,
            VaultError::Storage(StorageError::Serialization { .. })
        ));
    }
}
