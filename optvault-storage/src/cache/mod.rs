//! In-process cache layered over the backing store.
//!
//! The cache only ever sees writes made through its own adapter. Writes by
//! other processes sharing the same backing store are invisible to it until
//! the entry is cleared.

pub mod entries;
pub mod stats;

pub use entries::EntryCache;
pub use stats::CacheStats;
