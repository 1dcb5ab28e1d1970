//! optvault Storage - Token Storage Trait and Options-Table Adapter
//!
//! Defines the storage surface OAuth flow code talks to, the backing-store
//! abstraction hosts implement, and the adapter that joins the two.

pub mod adapter;
pub mod backend;
pub mod cache;
pub mod chain;

pub use adapter::OptionsTokenStorage;
pub use backend::{LmdbOptionStore, LmdbStoreError, MemoryOptionStore, OptionStore};
pub use cache::{CacheStats, EntryCache};
pub use chain::Chain;

use optvault_core::{AccessToken, AuthorizationState, VaultResult};

// ============================================================================
// STORAGE TRAIT
// ============================================================================

/// Storage for OAuth access tokens and authorization states, keyed by service.
///
/// Absence is reported as `TokenNotFound` / `AuthorizationStateNotFound`;
/// every other error comes from the backing store unchanged.
pub trait TokenStorage {
    // === Token Operations ===

    /// Whether a valid token is stored. Never fails; read errors count as absent.
    fn has_token(&mut self, service: &str) -> bool;

    /// Get the token for a service.
    fn retrieve_token(&mut self, service: &str) -> VaultResult<AccessToken>;

    /// Store (overwrite) the token for a service.
    fn store_token(&mut self, service: &str, token: AccessToken) -> VaultResult<()>;

    /// Remove the token for a service. Idempotent.
    fn clear_token(&mut self, service: &str) -> VaultResult<()>;

    /// Remove every token stored through this storage.
    fn clear_all_tokens(&mut self) -> VaultResult<()>;

    // === Authorization State Operations ===

    /// Whether a non-null state is stored.
    fn has_authorization_state(&mut self, service: &str) -> bool;

    /// Get the state for a service.
    fn retrieve_authorization_state(&mut self, service: &str) -> VaultResult<AuthorizationState>;

    /// Store (overwrite) the state for a service.
    fn store_authorization_state(
        &mut self,
        service: &str,
        state: AuthorizationState,
    ) -> VaultResult<()>;

    /// Remove the state for a service. Idempotent.
    fn clear_authorization_state(&mut self, service: &str) -> VaultResult<()>;

    /// Remove every state stored through this storage.
    fn clear_all_authorization_states(&mut self) -> VaultResult<()>;
}

// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================

#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeSet;
    use std::sync::Arc;

    fn make_storage() -> (OptionsTokenStorage<Arc<MemoryOptionStore>>, Arc<MemoryOptionStore>) {
        let store = Arc::new(MemoryOptionStore::new());
        let storage = OptionsTokenStorage::new(Arc::clone(&store), "oauth_token", "oauth_state");
        (storage, store)
    }

    fn arb_service() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9_]{0,15}"
    }

    fn arb_token() -> impl Strategy<Value = AccessToken> {
        (
            "[A-Za-z0-9]{1,40}",
            prop::option::of("[A-Za-z0-9]{1,40}"),
        )
            .prop_map(|(access, refresh)| {
                let token = AccessToken::new(access);
                match refresh {
                    Some(refresh) => token.with_refresh_token(refresh),
                    None => token,
                }
            })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Never-stored services have no token and retrieve reports not-found.
        #[test]
        fn prop_unknown_service_not_found(service in arb_service()) {
            let (mut storage, _) = make_storage();
            prop_assert!(!storage.has_token(&service));
            let err = storage.retrieve_token(&service).unwrap_err();
            prop_assert!(err.is_not_found());
        }

        /// Store then retrieve returns the stored token.
        #[test]
        fn prop_store_retrieve_roundtrip(service in arb_service(), token in arb_token()) {
            let (mut storage, _) = make_storage();
            storage.store_token(&service, token.clone()).unwrap();
            prop_assert!(storage.has_token(&service));
            prop_assert_eq!(storage.retrieve_token(&service).unwrap(), token);
        }

        /// A second store replaces the first, through the cache and on disk.
        #[test]
        fn prop_store_overwrites(
            service in arb_service(),
            first in arb_token(),
            second in arb_token(),
        ) {
            let (mut storage, store) = make_storage();
            storage.store_token(&service, first).unwrap();
            storage.store_token(&service, second.clone()).unwrap();
            prop_assert_eq!(storage.retrieve_token(&service).unwrap(), second.clone());

            let mut fresh = OptionsTokenStorage::new(store, "oauth_token", "oauth_state");
            prop_assert_eq!(fresh.retrieve_token(&service).unwrap(), second);
        }

        /// Clear is idempotent and always leaves the service without a token.
        #[test]
        fn prop_clear_is_idempotent(
            service in arb_service(),
            token in prop::option::of(arb_token()),
        ) {
            let (mut storage, _) = make_storage();
            if let Some(token) = token {
                storage.store_token(&service, token).unwrap();
            }
            storage.clear_token(&service).unwrap();
            storage.clear_token(&service).unwrap();
            prop_assert!(!storage.has_token(&service));
            prop_assert!(storage.retrieve_token(&service).unwrap_err().is_not_found());
        }

        /// Bulk clear removes every stored service.
        #[test]
        fn prop_clear_all_removes_everything(
            services in prop::collection::btree_set(arb_service(), 1..8),
            token in arb_token(),
        ) {
            let (mut storage, _) = make_storage();
            for service in &services {
                storage.store_token(service, token.clone()).unwrap();
            }
            storage.clear_all_tokens().unwrap();
            for service in &services {
                prop_assert!(!storage.has_token(service));
            }
        }

        /// The chain holds each stored service exactly once, in first-store order.
        #[test]
        fn prop_chain_is_a_set(
            services in prop::collection::vec(arb_service(), 1..12),
            token in arb_token(),
        ) {
            let (mut storage, _) = make_storage();
            for service in &services {
                storage.store_token(service, token.clone()).unwrap();
            }

            let chain = storage.token_services().unwrap();
            let mut seen = BTreeSet::new();
            let expected: Vec<String> = services
                .iter()
                .filter(|s| seen.insert((*s).clone()))
                .cloned()
                .collect();
            prop_assert_eq!(chain, expected);
        }

        /// A warm cache answers repeated retrieves without touching the store.
        #[test]
        fn prop_warm_cache_needs_no_reads(
            service in arb_service(),
            token in arb_token(),
            repeats in 1usize..5,
        ) {
            let (mut storage, store) = make_storage();
            storage.store_token(&service, token).unwrap();
            store.reset_counters();
            for _ in 0..repeats {
                storage.retrieve_token(&service).unwrap();
            }
            prop_assert_eq!(store.reads(), 0);
        }
    }
}
