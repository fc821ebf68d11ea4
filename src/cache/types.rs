use std::collections::HashMap;

use rkyv::{Archive, Deserialize, Serialize};

/// Vector payload produced by a vector-based similarity backend.
///
/// Stored as `rkyv` bytes inside the cache file.
#[derive(Archive, Deserialize, Serialize, Debug, Clone, PartialEq)]
pub enum VectorPayload {
    /// Dense, L2-normalised embedding.
    Dense(Vec<f32>),
    /// Sparse vector: strictly increasing `indices` with matching `values`.
    Sparse { indices: Vec<u32>, values: Vec<f32> },
}

impl VectorPayload {
    /// Number of stored components.
    pub fn len(&self) -> usize {
        match self {
            VectorPayload::Dense(values) => values.len(),
            VectorPayload::Sparse { values, .. } => values.len(),
        }
    }

    /// Returns `true` if no components are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One cached vector.
///
/// Valid for a lookup only when both `modified` and `backend` match exactly.
#[derive(Archive, Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct CacheRecord {
    /// Document modification time (ns since epoch) when the vector was computed.
    pub modified: i64,
    /// Tag of the backend that produced the vector.
    pub backend: String,
    /// The vector.
    pub vector: VectorPayload,
}

/// On-disk layout: `{ version, entries: { id: { modified, backend, vector } } }`.
#[derive(Archive, Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
pub(crate) struct CacheFile {
    pub version: u32,
    pub entries: HashMap<String, CacheRecord>,
}

/// How the cache came to hold its current entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// No backing file (or in-memory cache): started empty.
    Fresh,
    /// Entries were loaded from disk.
    Loaded { entries: usize },
    /// The backing file was unusable and will be rewritten on the next save.
    Rebuilt { reason: String },
}

/// Per-run counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    /// Lookups that returned a vector.
    pub hits: u64,
    /// Lookups that found nothing usable.
    pub misses: u64,
    /// Vectors written through `set`.
    pub writes: u64,
}
