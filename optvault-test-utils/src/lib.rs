//! optvault Test Utilities
//!
//! Centralized test infrastructure for the optvault workspace:
//! - Proptest generators for tokens, states, and service names
//! - Backing-store fixtures (failure injection)
//! - Test fixtures for common scenarios
//! - Custom assertions for storage-specific validation

// Re-export storage types from their source crate
pub use optvault_storage::{
    CacheStats, Chain, MemoryOptionStore, OptionStore, OptionsTokenStorage, TokenStorage,
};

// Re-export core types for convenience
pub use optvault_core::{
    AccessToken, AuthorizationState, EndOfLife, KeyScheme, Namespace, StorageConfig,
    StorageError, VaultError, VaultResult,
};

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Once, PoisonError};

use serde_json::Value;

// ============================================================================
// BACKING-STORE FIXTURES
// ============================================================================

/// Wraps a [`MemoryOptionStore`] and fails selected primitives on demand.
///
/// Failures are either per primitive (`fail_reads` etc.) or per key
/// (`fail_mutations_of`), the latter failing `set` and `delete` on that key
/// while reads keep working.
#[derive(Debug, Default)]
pub struct FailingOptionStore {
    inner: MemoryOptionStore,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    fail_deletes: AtomicBool,
    frozen_keys: Mutex<HashSet<String>>,
}

impl FailingOptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::Relaxed);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::Relaxed);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::Relaxed);
    }

    /// Fail every `set` and `delete` of `key` until [`Self::allow_all_mutations`].
    pub fn fail_mutations_of(&self, key: &str) {
        self.frozen_keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string());
    }

    pub fn allow_all_mutations(&self) {
        self.frozen_keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn is_frozen(&self, key: &str) -> bool {
        self.frozen_keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(key)
    }

    /// The wrapped store, for inspecting what actually landed.
    pub fn inner(&self) -> &MemoryOptionStore {
        &self.inner
    }

    /// The error every injected failure returns.
    pub fn injected_error(operation: &str) -> VaultError {
        VaultError::backend(format!("injected {operation} failure"))
    }
}

impl OptionStore for FailingOptionStore {
    fn get(&self, key: &str) -> VaultResult<Option<Value>> {
        if self.fail_reads.load(Ordering::Relaxed) {
            return Err(Self::injected_error("get"));
        }
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: Value) -> VaultResult<()> {
        if self.fail_writes.load(Ordering::Relaxed) || self.is_frozen(key) {
            return Err(Self::injected_error("set"));
        }
        self.inner.set(key, value)
    }

    fn delete(&self, key: &str) -> VaultResult<()> {
        if self.fail_deletes.load(Ordering::Relaxed) || self.is_frozen(key) {
            return Err(Self::injected_error("delete"));
        }
        self.inner.delete(key)
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub mod fixtures {
    use super::*;

    pub const TOKEN_PREFIX: &str = "oauth_token";
    pub const STATE_PREFIX: &str = "oauth_state";

    /// Adapter over a shared in-memory store, plus a handle to that store.
    pub fn memory_storage() -> (
        OptionsTokenStorage<Arc<MemoryOptionStore>>,
        Arc<MemoryOptionStore>,
    ) {
        let store = Arc::new(MemoryOptionStore::new());
        let storage = OptionsTokenStorage::new(Arc::clone(&store), TOKEN_PREFIX, STATE_PREFIX);
        (storage, store)
    }

    /// Adapter over a store whose primitives can be made to fail.
    pub fn failing_storage() -> (
        OptionsTokenStorage<Arc<FailingOptionStore>>,
        Arc<FailingOptionStore>,
    ) {
        let store = Arc::new(FailingOptionStore::new());
        let storage = OptionsTokenStorage::new(Arc::clone(&store), TOKEN_PREFIX, STATE_PREFIX);
        (storage, store)
    }

    /// A token with a refresh token and a one-hour lifetime.
    pub fn github_token(access: &str) -> AccessToken {
        AccessToken::new(access)
            .with_refresh_token(format!("{access}-refresh"))
            .with_lifetime(chrono::Duration::hours(1))
            .with_extra_param("token_type", Value::String("bearer".to_string()))
    }

    /// Install a fmt subscriber honouring `RUST_LOG`, once per process.
    pub fn init_test_tracing() {
        static INIT: Once = Once::new();
        INIT.call_once(|| {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
                .with_test_writer()
                .try_init();
        });
    }
}

// ============================================================================
// GENERATORS
// ============================================================================

pub mod generators {
    use super::*;
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;

    /// Generate a service identifier.
    pub fn arb_service() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9_-]{0,20}".prop_map(|s| s)
    }

    /// Generate a key prefix (non-empty, no whitespace).
    pub fn arb_prefix() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9_]{0,12}".prop_map(|s| s)
    }

    /// Generate an EndOfLife value.
    pub fn arb_end_of_life() -> impl Strategy<Value = EndOfLife> {
        prop_oneof![
            Just(EndOfLife::Unknown),
            Just(EndOfLife::Never),
            (0i64..4_102_444_800).prop_map(|secs| {
                EndOfLife::At(Utc.timestamp_opt(secs, 0).single().unwrap_or_default())
            }),
        ]
    }

    /// Generate an AccessToken.
    pub fn arb_access_token() -> impl Strategy<Value = AccessToken> {
        (
            "[A-Za-z0-9._-]{1,64}",
            prop::option::of("[A-Za-z0-9._-]{1,64}"),
            arb_end_of_life(),
            prop::collection::btree_map("[a-z_]{1,10}", "[a-z ]{0,20}", 0..3),
        )
            .prop_map(|(access, refresh, end_of_life, extra)| {
                let mut token = AccessToken::new(access).with_end_of_life(end_of_life);
                token.refresh_token = refresh;
                for (key, value) in extra {
                    token = token.with_extra_param(key, Value::String(value));
                }
                token
            })
    }

    /// Generate a present AuthorizationState.
    pub fn arb_authorization_state() -> impl Strategy<Value = AuthorizationState> {
        prop_oneof![
            "[A-Za-z0-9]{0,32}".prop_map(AuthorizationState::from),
            any::<i64>().prop_map(|n| AuthorizationState::from(Value::from(n))),
            any::<bool>().prop_map(|b| AuthorizationState::from(Value::Bool(b))),
        ]
    }

    /// Generate a StorageConfig that passes validation.
    pub fn arb_storage_config() -> impl Strategy<Value = StorageConfig> {
        (arb_prefix(), arb_prefix(), any::<bool>(), any::<bool>())
            .prop_filter("prefixes must differ", |(token, state, _, _)| token != state)
            .prop_map(|(token, state, cache, chains)| {
                StorageConfig::new(token, state)
                    .with_cache(cache)
                    .with_chains(chains)
            })
    }
}

// ============================================================================
// ASSERTIONS
// ============================================================================

pub mod assertions {
    use super::*;

    /// Assert that `result` failed with `TokenNotFound` for `service`.
    pub fn assert_token_not_found<T: std::fmt::Debug>(result: VaultResult<T>, service: &str) {
        match result {
            Err(VaultError::Storage(StorageError::TokenNotFound { service: s })) => {
                assert_eq!(s, service, "not-found reported for the wrong service");
            }
            other => panic!("expected TokenNotFound for {service}, got {other:?}"),
        }
    }

    /// Assert that `result` failed with `AuthorizationStateNotFound` for `service`.
    pub fn assert_state_not_found<T: std::fmt::Debug>(result: VaultResult<T>, service: &str) {
        match result {
            Err(VaultError::Storage(StorageError::AuthorizationStateNotFound { service: s })) => {
                assert_eq!(s, service, "not-found reported for the wrong service");
            }
            other => panic!("expected AuthorizationStateNotFound for {service}, got {other:?}"),
        }
    }

    /// Assert that each service appears exactly once in `chain`.
    pub fn assert_chain_is_set(chain: &[String]) {
        for (i, service) in chain.iter().enumerate() {
            assert!(
                !chain[i + 1..].contains(service),
                "service {service} appears more than once in chain {chain:?}"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_failing_store_injects_errors() {
        let store = FailingOptionStore::new();
        store.set("k", Value::Bool(true)).unwrap();

        store.fail_reads(true);
        assert_eq!(
            store.get("k").unwrap_err(),
            FailingOptionStore::injected_error("get")
        );
        store.fail_reads(false);
        assert_eq!(store.get("k").unwrap(), Some(Value::Bool(true)));

        store.fail_writes(true);
        assert!(store.set("k", Value::Null).is_err());
        store.fail_deletes(true);
        assert!(store.delete("k").is_err());
        assert!(store.inner().contains_key("k"));
    }

    #[test]
    fn test_failing_store_freezes_single_key() {
        let store = FailingOptionStore::new();
        store.set("frozen", Value::Bool(true)).unwrap();
        store.fail_mutations_of("frozen");

        assert!(store.set("frozen", Value::Null).is_err());
        assert!(store.delete("frozen").is_err());
        assert_eq!(store.get("frozen").unwrap(), Some(Value::Bool(true)));
        store.set("other", Value::Bool(false)).unwrap();

        store.allow_all_mutations();
        store.delete("frozen").unwrap();
        assert!(!store.inner().contains_key("frozen"));
    }

    #[test]
    fn test_chain_set_assertion_accepts_unique() {
        assertions::assert_chain_is_set(&["a".to_string(), "b".to_string()]);
    }

    #[test]
    #[should_panic(expected = "appears more than once")]
    fn test_chain_set_assertion_rejects_duplicates() {
        assertions::assert_chain_is_set(&["a".to_string(), "a".to_string()]);
    }

    proptest! {
        #[test]
        fn prop_generated_configs_validate(config in generators::arb_storage_config()) {
            prop_assert!(config.validate().is_ok());
        }

        #[test]
        fn prop_generated_tokens_pass_predicate(token in generators::arb_access_token()) {
            let stored = serde_json::to_value(&token).unwrap();
            prop_assert_eq!(AccessToken::from_stored(&stored), Some(token));
        }

        #[test]
        fn prop_generated_states_are_present(state in generators::arb_authorization_state()) {
            prop_assert!(state.is_present());
        }
    }
}
