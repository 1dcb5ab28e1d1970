//! Options-table token storage.
//!
//! [`OptionsTokenStorage`] keeps two collections, tokens and authorization
//! states, in a host [`OptionStore`]. Each collection has its own key prefix,
//! chain index, and entry cache. Writes and deletes made through the adapter
//! update the cache in the same call, so the cache never disagrees with the
//! backing store about anything this instance wrote.

use optvault_core::{
    AccessToken, AuthorizationState, KeyScheme, Namespace, StorageConfig, StorageError,
    VaultError, VaultResult,
};
use serde::Serialize;
use serde_json::Value;

use crate::backend::OptionStore;
use crate::cache::{CacheStats, EntryCache};
use crate::chain::Chain;
use crate::TokenStorage;

/// A value kind the adapter can keep: how it is recognised when read back,
/// and which error reports its absence.
pub(crate) trait StoredEntry: Clone + Serialize {
    const NAMESPACE: Namespace;

    /// Presence predicate applied to raw stored values.
    fn from_stored(value: &Value) -> Option<Self>;

    fn is_present(&self) -> bool;

    fn not_found(service: &str) -> VaultError;
}

impl StoredEntry for AccessToken {
    const NAMESPACE: Namespace = Namespace::Token;

    fn from_stored(value: &Value) -> Option<Self> {
        AccessToken::from_stored(value)
    }

    fn is_present(&self) -> bool {
        true
    }

    fn not_found(service: &str) -> VaultError {
        StorageError::TokenNotFound {
            service: service.to_string(),
        }
        .into()
    }
}

impl StoredEntry for AuthorizationState {
    const NAMESPACE: Namespace = Namespace::State;

    fn from_stored(value: &Value) -> Option<Self> {
        let state = AuthorizationState(value.clone());
        state.is_present().then_some(state)
    }

    fn is_present(&self) -> bool {
        AuthorizationState::is_present(self)
    }

    fn not_found(service: &str) -> VaultError {
        StorageError::AuthorizationStateNotFound {
            service: service.to_string(),
        }
        .into()
    }
}

/// One namespace: its cache plus the operations over it.
#[derive(Debug)]
struct Collection<T> {
    cache: EntryCache<T>,
}

impl<T: StoredEntry> Collection<T> {
    fn new(cache_enabled: bool) -> Self {
        Self {
            cache: EntryCache::new(cache_enabled),
        }
    }

    /// Cached value, else one backing-store read. Present values read from
    /// the store are cached.
    fn lookup<S: OptionStore + ?Sized>(
        &mut self,
        store: &S,
        keys: &KeyScheme,
        service: &str,
    ) -> VaultResult<Option<T>> {
        if let Some(value) = self.cache.get(service) {
            return Ok(Some(value));
        }

        let key = keys.entry_key(T::NAMESPACE, service);
        let found = store.get(&key)?.as_ref().and_then(T::from_stored);
        if let Some(value) = &found {
            self.cache.put(service, value.clone());
        }
        Ok(found)
    }

    fn has<S: OptionStore + ?Sized>(&mut self, store: &S, keys: &KeyScheme, service: &str) -> bool {
        match self.lookup(store, keys, service) {
            Ok(found) => found.is_some(),
            Err(error) => {
                tracing::warn!(
                    namespace = T::NAMESPACE.as_str(),
                    service,
                    %error,
                    "Backing store read failed, reporting entry as absent"
                );
                false
            }
        }
    }

    fn retrieve<S: OptionStore + ?Sized>(
        &mut self,
        store: &S,
        keys: &KeyScheme,
        service: &str,
    ) -> VaultResult<T> {
        self.lookup(store, keys, service)?
            .ok_or_else(|| T::not_found(service))
    }

    fn store<S: OptionStore + ?Sized>(
        &mut self,
        store: &S,
        keys: &KeyScheme,
        chains_enabled: bool,
        service: &str,
        value: T,
    ) -> VaultResult<()> {
        let key = keys.entry_key(T::NAMESPACE, service);
        let encoded = serde_json::to_value(&value).map_err(|e| StorageError::Serialization {
            key: key.clone(),
            reason: e.to_string(),
        })?;

        // An entry is never written before its service is chained.
        let chain = Chain::new(store, keys.chain_key(T::NAMESPACE));
        let chained = chains_enabled && chain.add(service)?;

        if let Err(error) = store.set(&key, encoded) {
            if chained {
                if let Err(rollback) = chain.remove(service) {
                    tracing::warn!(
                        namespace = T::NAMESPACE.as_str(),
                        service,
                        error = %rollback,
                        "Could not unlist service after failed write"
                    );
                }
            }
            return Err(error);
        }

        if value.is_present() {
            self.cache.put(service, value);
        } else {
            self.cache.evict(service);
        }

        tracing::debug!(namespace = T::NAMESPACE.as_str(), service, "Stored entry");
        Ok(())
    }

    fn clear<S: OptionStore + ?Sized>(
        &mut self,
        store: &S,
        keys: &KeyScheme,
        chains_enabled: bool,
        service: &str,
    ) -> VaultResult<()> {
        store.delete(&keys.entry_key(T::NAMESPACE, service))?;
        self.cache.evict(service);

        if chains_enabled {
            Chain::new(store, keys.chain_key(T::NAMESPACE)).remove(service)?;
        }

        tracing::debug!(namespace = T::NAMESPACE.as_str(), service, "Cleared entry");
        Ok(())
    }

    /// Delete every chained entry and the chain itself. Returns how many
    /// entry keys were deleted. Entries deleted before a failure are evicted.
    fn clear_all<S: OptionStore + ?Sized>(
        &mut self,
        store: &S,
        keys: &KeyScheme,
        chains_enabled: bool,
    ) -> VaultResult<usize> {
        if !chains_enabled {
            let dropped = self.cache.clear();
            tracing::warn!(
                namespace = T::NAMESPACE.as_str(),
                dropped,
                "Chains disabled: cleared the cache only, stored entries were left in place"
            );
            return Ok(0);
        }

        let chain = Chain::new(store, keys.chain_key(T::NAMESPACE));
        let services = chain.members()?;
        for service in &services {
            store.delete(&keys.entry_key(T::NAMESPACE, service))?;
            self.cache.evict(service);
        }
        self.cache.clear();
        chain.delete()?;

        tracing::info!(
            namespace = T::NAMESPACE.as_str(),
            removed = services.len(),
            "Cleared all entries"
        );
        Ok(services.len())
    }
}

/// Token and authorization-state storage over a host options table.
///
/// One instance per thread: the caches are plain maps mutated through
/// `&mut self`. Share the backing store (e.g. `Arc<S>`) rather than the
/// adapter when several owners are needed.
///
/// # Example
///
/// ```ignore
/// let mut storage = OptionsTokenStorage::new(MemoryOptionStore::new(), "oauth_token", "oauth_state");
/// storage.store_token("github", AccessToken::new("gho_123"))?;
/// assert_eq!(storage.retrieve_token("github")?.access_token, "gho_123");
/// ```
#[derive(Debug)]
pub struct OptionsTokenStorage<S: OptionStore> {
    store: S,
    keys: KeyScheme,
    chains_enabled: bool,
    tokens: Collection<AccessToken>,
    states: Collection<AuthorizationState>,
}

impl<S: OptionStore> OptionsTokenStorage<S> {
    /// Adapter with caching and chains enabled. Performs no I/O.
    pub fn new(
        store: S,
        token_key_prefix: impl Into<String>,
        state_key_prefix: impl Into<String>,
    ) -> Self {
        Self {
            store,
            keys: KeyScheme::new(token_key_prefix, state_key_prefix),
            chains_enabled: true,
            tokens: Collection::new(true),
            states: Collection::new(true),
        }
    }

    /// Adapter from a validated configuration.
    pub fn with_config(store: S, config: &StorageConfig) -> VaultResult<Self> {
        config.validate()?;
        Ok(Self {
            store,
            keys: config.key_scheme(),
            chains_enabled: config.chains_enabled,
            tokens: Collection::new(config.cache_enabled),
            states: Collection::new(config.cache_enabled),
        })
    }

    pub fn token_key_prefix(&self) -> &str {
        self.keys.prefix(Namespace::Token)
    }

    pub fn state_key_prefix(&self) -> &str {
        self.keys.prefix(Namespace::State)
    }

    pub fn key_scheme(&self) -> &KeyScheme {
        &self.keys
    }

    pub fn backing_store(&self) -> &S {
        &self.store
    }

    /// Consume the adapter, returning the backing store.
    pub fn into_backing_store(self) -> S {
        self.store
    }

    /// Services listed in the token chain.
    pub fn token_services(&self) -> VaultResult<Vec<String>> {
        Chain::new(&self.store, self.keys.chain_key(Namespace::Token)).members()
    }

    /// Services listed in the state chain.
    pub fn state_services(&self) -> VaultResult<Vec<String>> {
        Chain::new(&self.store, self.keys.chain_key(Namespace::State)).members()
    }

    /// Combined statistics of both caches.
    pub fn cache_stats(&self) -> CacheStats {
        self.tokens.cache.stats() + self.states.cache.stats()
    }

    /// Statistics of one namespace's cache.
    pub fn namespace_cache_stats(&self, namespace: Namespace) -> CacheStats {
        match namespace {
            Namespace::Token => self.tokens.cache.stats(),
            Namespace::State => self.states.cache.stats(),
        }
    }
}

impl<S: OptionStore> TokenStorage for OptionsTokenStorage<S> {
    // === Token Operations ===

    fn has_token(&mut self, service: &str) -> bool {
        self.tokens.has(&self.store, &self.keys, service)
    }

    fn retrieve_token(&mut self, service: &str) -> VaultResult<AccessToken> {
        self.tokens.retrieve(&self.store, &self.keys, service)
    }

    fn store_token(&mut self, service: &str, token: AccessToken) -> VaultResult<()> {
        self.tokens
            .store(&self.store, &self.keys, self.chains_enabled, service, token)
    }

    fn clear_token(&mut self, service: &str) -> VaultResult<()> {
        self.tokens
            .clear(&self.store, &self.keys, self.chains_enabled, service)
    }

    fn clear_all_tokens(&mut self) -> VaultResult<()> {
        self.tokens
            .clear_all(&self.store, &self.keys, self.chains_enabled)
            .map(|_| ())
    }

    // === Authorization State Operations ===

    fn has_authorization_state(&mut self, service: &str) -> bool {
        self.states.has(&self.store, &self.keys, service)
    }

    fn retrieve_authorization_state(&mut self, service: &str) -> VaultResult<AuthorizationState> {
        self.states.retrieve(&self.store, &self.keys, service)
    }

    fn store_authorization_state(
        &mut self,
        service: &str,
        state: AuthorizationState,
    ) -> VaultResult<()> {
        self.states
            .store(&self.store, &self.keys, self.chains_enabled, service, state)
    }

    fn clear_authorization_state(&mut self, service: &str) -> VaultResult<()> {
        self.states
            .clear(&self.store, &self.keys, self.chains_enabled, service)
    }

    fn clear_all_authorization_states(&mut self) -> VaultResult<()> {
        self.states
            .clear_all(&self.store, &self.keys, self.chains_enabled)
            .map(|_| ())
    }
}
