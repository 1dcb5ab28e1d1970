//! Storage key scheme for tokens, states, and their chains.
//!
//! The formats here are shared with data already written by other hosts and
//! must stay byte-for-byte stable:
//!
//! - token entry: `{token_key_prefix}_{service}`
//! - state entry: `{state_key_prefix}_{service}`
//! - token chain: `_keychain_{token_key_prefix}`
//! - state chain: `_statechain_{state_key_prefix}`

use serde::{Deserialize, Serialize};

/// Which of the two logical collections a key belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Namespace {
    Token,
    State,
}

impl Namespace {
    /// Human-readable name used in log fields.
    pub fn as_str(self) -> &'static str {
        match self {
            Namespace::Token => "token",
            Namespace::State => "state",
        }
    }
}

/// Composes backing-store keys from the two configured prefixes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyScheme {
    token_key_prefix: String,
    state_key_prefix: String,
    token_chain_key: String,
    state_chain_key: String,
}

impl KeyScheme {
    pub fn new(token_key_prefix: impl Into<String>, state_key_prefix: impl Into<String>) -> Self {
        let token_key_prefix = token_key_prefix.into();
        let state_key_prefix = state_key_prefix.into();
        Self {
            token_chain_key: format!("_keychain_{token_key_prefix}"),
            state_chain_key: format!("_statechain_{state_key_prefix}"),
            token_key_prefix,
            state_key_prefix,
        }
    }

    pub fn prefix(&self, namespace: Namespace) -> &str {
        match namespace {
            Namespace::Token => &self.token_key_prefix,
            Namespace::State => &self.state_key_prefix,
        }
    }

    /// Key of the entry for `service` in `namespace`.
    pub fn entry_key(&self, namespace: Namespace, service: &str) -> String {
        format!("{}_{}", self.prefix(namespace), service)
    }

    /// Key of the chain index for `namespace`.
    pub fn chain_key(&self, namespace: Namespace) -> &str {
        match namespace {
            Namespace::Token => &self.token_chain_key,
            Namespace::State => &self.state_chain_key,
        }
    }
}
