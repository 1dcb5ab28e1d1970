//! Configuration types

use crate::*;
use serde::{Deserialize, Serialize};

/// Adapter configuration.
///
/// The prefixes are part of the on-disk key format (see [`crate::keys`]), so
/// changing them orphans previously stored entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Prefix for token entries and the token chain.
    pub token_key_prefix: String,
    /// Prefix for authorization-state entries and the state chain.
    pub state_key_prefix: String,
    /// Keep an in-process copy of values read or written through the adapter.
    #[serde(default = "default_true")]
    pub cache_enabled: bool,
    /// Maintain the chain indexes that bulk clears enumerate.
    #[serde(default = "default_true")]
    pub chains_enabled: bool,
}

fn default_true() -> bool {
    true
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new("oauth_token", "oauth_state")
    }
}

impl StorageConfig {
    /// Config with caching and chains enabled.
    pub fn new(token_key_prefix: impl Into<String>, state_key_prefix: impl Into<String>) -> Self {
        Self {
            token_key_prefix: token_key_prefix.into(),
            state_key_prefix: state_key_prefix.into(),
            cache_enabled: true,
            chains_enabled: true,
        }
    }

    /// Enable or disable the in-process cache.
    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.cache_enabled = enabled;
        self
    }

    /// Enable or disable chain maintenance.
    pub fn with_chains(mut self, enabled: bool) -> Self {
        self.chains_enabled = enabled;
        self
    }

    /// Key scheme derived from the configured prefixes.
    pub fn key_scheme(&self) -> KeyScheme {
        KeyScheme::new(&self.token_key_prefix, &self.state_key_prefix)
    }

    /// Create from environment variables with fallback to defaults.
    ///
    /// Environment variables:
    /// - `OPTVAULT_TOKEN_KEY_PREFIX`: token prefix (default: oauth_token)
    /// - `OPTVAULT_STATE_KEY_PREFIX`: state prefix (default: oauth_state)
    /// - `OPTVAULT_CACHE_ENABLED`: true/false (default: true)
    /// - `OPTVAULT_CHAINS_ENABLED`: true/false (default: true)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            token_key_prefix: std::env::var("OPTVAULT_TOKEN_KEY_PREFIX")
                .unwrap_or(defaults.token_key_prefix),
            state_key_prefix: std::env::var("OPTVAULT_STATE_KEY_PREFIX")
                .unwrap_or(defaults.state_key_prefix),
            cache_enabled: std::env::var("OPTVAULT_CACHE_ENABLED")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.cache_enabled),
            chains_enabled: std::env::var("OPTVAULT_CHAINS_ENABLED")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.chains_enabled),
        }
    }

    /// Validate the configuration.
    ///
    /// Validates:
    /// - both prefixes are non-empty
    /// - neither prefix contains whitespace
    /// - the prefixes differ, otherwise token and state entries share keys
    pub fn validate(&self) -> VaultResult<()> {
        for (field, value) in [
            ("token_key_prefix", &self.token_key_prefix),
            ("state_key_prefix", &self.state_key_prefix),
        ] {
            if value.is_empty() {
                return Err(VaultError::Config(ConfigError::MissingRequired {
                    field: field.to_string(),
                }));
            }
            if value.chars().any(char::is_whitespace) {
                return Err(VaultError::Config(ConfigError::InvalidValue {
                    field: field.to_string(),
                    value: value.clone(),
                    reason: format!("{field} must not contain whitespace"),
                }));
            }
        }

        if self.token_key_prefix == self.state_key_prefix {
            return Err(VaultError::Config(ConfigError::IncompatibleOptions {
                option_a: "token_key_prefix".to_string(),
                option_b: "state_key_prefix".to_string(),
            }));
        }

        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
