//! Error types for optvault operations

use thiserror::Error;

/// Storage layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Token not found for service {service}")]
    TokenNotFound { service: String },

    #[error("Authorization state not found for service {service}")]
    AuthorizationStateNotFound { service: String },

    #[error("Backing store failure: {reason}")]
    Backend { reason: String },

    #[error("Serialization failed for key {key}: {reason}")]
    Serialization { key: String, reason: String },

    #[error("Chain {key} is corrupt: {reason}")]
    CorruptChain { key: String, reason: String },

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Incompatible options: {option_a} and {option_b}")]
    IncompatibleOptions { option_a: String, option_b: String },
}

/// Master error type for all optvault errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VaultError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl VaultError {
    /// True for the recoverable "nothing stored" kinds.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            VaultError::Storage(
                StorageError::TokenNotFound { .. } | StorageError::AuthorizationStateNotFound { .. }
            )
        )
    }

    /// Wrap a backing-store failure.
    pub fn backend(reason: impl Into<String>) -> Self {
        VaultError::Storage(StorageError::Backend {
            reason: reason.into(),
        })
    }
}

/// Result type alias for optvault operations.
pub type VaultResult<T> = Result<T, VaultError>;

// =============================================================================
// TESTS
// =============================================================================
