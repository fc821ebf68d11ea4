//! Persistent, invalidation-aware vector cache.
//!
//! One versioned `rkyv` file holds every entry. The file is memory-mapped and validated on
//! open; anything unusable (corrupt bytes, schema version mismatch) is discarded with a
//! warning and rebuilt, never surfaced as an error. A lookup only hits when both the
//! document's modification time and the backend tag match the stored entry.
//!
//! Invalidation is modification-time only: a content edit that leaves the timestamp
//! unchanged (coarse filesystem resolution, restored mtimes) is not detected.

pub mod error;
pub mod store;
pub mod types;


pub use error::{CacheError, CacheResult};
pub use store::SimilarityCache;
pub use types::{CacheRecord, CacheStats, LoadOutcome, VectorPayload};
