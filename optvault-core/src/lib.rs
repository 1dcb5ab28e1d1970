//! optvault Core - Payload Types, Key Scheme, Errors, Configuration
//!
//! Pure data structures shared by every other crate in the workspace.
//! No I/O happens here; the storage adapter lives in optvault-storage.

pub mod config;
pub mod error;
pub mod keys;
pub mod token;

pub use config::StorageConfig;
pub use error::{ConfigError, StorageError, VaultError, VaultResult};
pub use keys::{KeyScheme, Namespace};
pub use token::{AccessToken, AuthorizationState, EndOfLife};

/// Timestamp type using UTC timezone.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================
