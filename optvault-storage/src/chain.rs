//! Chain index: the list of services with an entry in one namespace.
//!
//! A chain is stored as a JSON array of service names under its chain key.
//! It is only read by bulk clears. Every mutation is a read-modify-write of
//! the whole list, so two processes updating the same chain concurrently can
//! lose an update.

use optvault_core::{StorageError, VaultResult};
use serde_json::Value;

use crate::backend::OptionStore;

/// View of one chain in a backing store.
pub struct Chain<'a, S: OptionStore + ?Sized> {
    store: &'a S,
    key: &'a str,
}

impl<'a, S: OptionStore + ?Sized> Chain<'a, S> {
    pub fn new(store: &'a S, key: &'a str) -> Self {
        Self { store, key }
    }

    /// Current members in first-insertion order. Absent chain is empty.
    pub fn members(&self) -> VaultResult<Vec<String>> {
        match self.store.get(self.key)? {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(items)) => items
                .into_iter()
                .map(|item| match item {
                    Value::String(service) => Ok(service),
                    other => Err(self.corrupt(format!("non-string member {other}")).into()),
                })
                .collect(),
            Some(other) => Err(self.corrupt(format!("expected array, found {other}")).into()),
        }
    }

    /// Append `service` unless already present. Returns whether it was added.
    pub fn add(&self, service: &str) -> VaultResult<bool> {
        let mut members = self.members()?;
        if members.iter().any(|s| s == service) {
            return Ok(false);
        }
        members.push(service.to_string());
        self.write(members)?;
        Ok(true)
    }

    /// Remove `service` if present. Returns whether it was removed.
    pub fn remove(&self, service: &str) -> VaultResult<bool> {
        let mut members = self.members()?;
        let Some(index) = members.iter().position(|s| s == service) else {
            return Ok(false);
        };
        members.remove(index);
        self.write(members)?;
        Ok(true)
    }

    /// Delete the chain key itself.
    pub fn delete(&self) -> VaultResult<()> {
        self.store.delete(self.key)
    }

    fn write(&self, members: Vec<String>) -> VaultResult<()> {
        let list = members.into_iter().map(Value::String).collect();
        self.store.set(self.key, Value::Array(list))
    }

    fn corrupt(&self, reason: String) -> StorageError {
        StorageError::CorruptChain {
            key: self.key.to_string(),
            reason,
        }
    }
}
