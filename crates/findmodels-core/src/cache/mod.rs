//! Search-result caching.
//!
//! [`SearchCache`] holds per-model search results for [`crate::config::CacheConfig::TTL`]
//! on top of any [`KeyValueStore`]: [`SqliteStore`] for persistence across
//! sessions, [`MemoryStore`] for a single run.

mod memory;
mod sqlite;
mod store;
mod traits;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use store::{cache_key, SearchCache, SweepBatch};
pub use traits::KeyValueStore;
