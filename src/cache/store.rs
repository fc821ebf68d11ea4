use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use memmap2::Mmap;
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use super::error::{CacheError, CacheResult};
use super::types::{CacheFile, CacheRecord, CacheStats, LoadOutcome, VectorPayload};
use crate::constants::CACHE_SCHEMA_VERSION;
use crate::corpus::Document;

/// Persistent vector cache keyed by document identity.
///
/// Reads take a shared lock and may run concurrently; writes are serialized through an
/// exclusive lock so the single in-memory map is the only owner of the data that
/// [`save`](Self::save) flushes. Nothing touches disk until `save` is called.
pub struct SimilarityCache {
    path: Option<PathBuf>,
    entries: RwLock<HashMap<String, CacheRecord>>,
    dirty: AtomicBool,
    outcome: LoadOutcome,
    hits: AtomicU64,
    misses: AtomicU64,
    writes: AtomicU64,
}

impl std::fmt::Debug for SimilarityCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimilarityCache")
            .field("path", &self.path)
            .field("entries", &self.entries.read().len())
            .field("outcome", &self.outcome)
            .finish()
    }
}

impl SimilarityCache {
    /// Opens the cache backed by `path`.
    ///
    /// Never fails: a missing file starts empty, and a corrupt, unreadable or
    /// version-mismatched file is discarded with a warning and rebuilt on the next save.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let (entries, outcome) = match load_file(&path) {
            Ok(Some(entries)) => {
                let count = entries.len();
                debug!(path = %path.display(), entries = count, "Similarity cache loaded");
                (entries, LoadOutcome::Loaded { entries: count })
            }
            Ok(None) => (HashMap::new(), LoadOutcome::Fresh),
            Err(reason) => {
                warn!(
                    path = %path.display(),
                    reason = %reason,
                    "Similarity cache unusable, rebuilding"
                );
                (HashMap::new(), LoadOutcome::Rebuilt { reason })
            }
        };

        let dirty = matches!(outcome, LoadOutcome::Rebuilt { .. });
        Self {
            path: Some(path),
            entries: RwLock::new(entries),
            dirty: AtomicBool::new(dirty),
            outcome,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            writes: AtomicU64::new(0),
        }
    }

    /// Creates a cache with no backing file; [`save`](Self::save) is a no-op.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            entries: RwLock::new(HashMap::new()),
            dirty: AtomicBool::new(false),
            outcome: LoadOutcome::Fresh,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            writes: AtomicU64::new(0),
        }
    }

    /// Returns the cached vector for `doc` if it was computed by `backend_tag` at the
    /// document's current modification time.
    pub fn get(&self, doc: &Document, backend_tag: &str) -> Option<VectorPayload> {
        let entries = self.entries.read();
        let hit = entries
            .get(doc.id())
            .filter(|r| r.modified == doc.modified() && r.backend == backend_tag)
            .map(|r| r.vector.clone());

        if hit.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        hit
    }

    /// Stores `vector` for `doc`, replacing any previous entry for the same identity.
    pub fn set(&self, doc: &Document, vector: VectorPayload, backend_tag: &str) {
        let record = CacheRecord {
            modified: doc.modified(),
            backend: backend_tag.to_string(),
            vector,
        };
        self.entries.write().insert(doc.id().to_string(), record);
        self.writes.fetch_add(1, Ordering::Relaxed);
        // Release: pairs with the Acquire swap in save() so the flush sees this entry.
        self.dirty.store(true, Ordering::Release);
    }

    /// Flushes all entries to disk (atomic replace). No-op when nothing changed or when
    /// the cache has no backing file.
    pub fn save(&self) -> CacheResult<()> {
        let Some(path) = self.path.as_deref() else {
            return Ok(());
        };
        if !self.dirty.swap(false, Ordering::AcqRel) {
            return Ok(());
        }

        let file = CacheFile {
            version: CACHE_SCHEMA_VERSION,
            entries: self.entries.read().clone(),
        };
        let count = file.entries.len();

        if let Err(e) = write_file(path, &file) {
            self.dirty.store(true, Ordering::Release);
            return Err(e);
        }

        debug!(path = %path.display(), entries = count, "Similarity cache flushed");
        Ok(())
    }

    /// Drops every entry. The backing file is rewritten on the next save.
    pub fn clear(&self) {
        self.entries.write().clear();
        self.dirty.store(true, Ordering::Release);
    }

    /// Drops entries whose identity is not in `live`. Returns the number removed.
    pub fn prune(&self, live: &HashSet<&str>) -> usize {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|id, _| live.contains(id.as_str()));
        let removed = before - entries.len();
        if removed > 0 {
            info!(removed, "Pruned stale similarity cache entries");
            self.dirty.store(true, Ordering::Release);
        }
        removed
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns `true` if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Returns `true` if there are unsaved changes.
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    /// How the cache was initialised.
    pub fn load_outcome(&self) -> &LoadOutcome {
        &self.outcome
    }

    /// Backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Counters for this run.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
        }
    }
}

/// `Ok(None)` when there is no file, `Err(reason)` when the file exists but is unusable.
fn load_file(path: &Path) -> Result<Option<HashMap<String, CacheRecord>>, String> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(format!("unreadable: {e}")),
    };

    let len = file
        .metadata()
        .map_err(|e| format!("unreadable: {e}"))?
        .len();
    if len == 0 {
        return Err("empty file".to_string());
    }

    // SAFETY: the map is read-only and dropped before this function returns; the file is
    // only replaced by atomic rename, never truncated in place.
    let mmap = unsafe { Mmap::map(&file) }.map_err(|e| format!("mmap failed: {e}"))?;

    let decoded = rkyv::from_bytes::<CacheFile, rkyv::rancor::Error>(&mmap[..])
        .map_err(|e| format!("corrupt: {e}"))?;

    if decoded.version != CACHE_SCHEMA_VERSION {
        return Err(format!(
            "schema version {} does not match {}",
            decoded.version, CACHE_SCHEMA_VERSION
        ));
    }

    Ok(Some(decoded.entries))
}

fn write_file(path: &Path, file: &CacheFile) -> CacheResult<()> {
    let bytes = rkyv::to_bytes::<rkyv::rancor::Error>(file).map_err(|e| {
        CacheError::Serialization {
            reason: e.to_string(),
        }
    })?;

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent).map_err(|source| CacheError::Io {
        path: parent.clone(),
        source,
    })?;

    let mut tmp = tempfile::NamedTempFile::new_in(&parent).map_err(|source| CacheError::Io {
        path: parent.clone(),
        source,
    })?;
    tmp.write_all(&bytes)
        .and_then(|_| tmp.flush())
        .map_err(|source| CacheError::Io {
            path: tmp.path().to_path_buf(),
            source,
        })?;
    tmp.persist(path).map_err(|e| CacheError::Io {
        path: path.to_path_buf(),
        source: e.error,
    })?;

    Ok(())
}
