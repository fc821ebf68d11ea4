//! Documents and corpus loading.
//!
//! A [`Document`] is read once per run and never mutated. Identity is the path relative
//! to an identity root with `/` separators, so the same corpus produces the same keys on
//! every platform and the similarity cache stays valid across checkouts. When two corpora
//! are loaded together they share one identity root (their common ancestor), which keeps
//! `README.md` and `docs/README.md` distinct.

pub mod error;

#[cfg(test)]
mod tests;

pub use error::CorpusError;

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::Serialize;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Bytes inspected when sniffing for binary content.
const BINARY_SNIFF_LEN: usize = 8192;

/// One document snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    id: String,
    content: String,
    modified: i64,
    source: Option<PathBuf>,
}

impl Document {
    /// Creates a document from already-loaded parts.
    ///
    /// `modified` is the modification time in nanoseconds since the Unix epoch.
    pub fn new(id: impl Into<String>, content: impl Into<String>, modified: i64) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            modified,
            source: None,
        }
    }

    /// Reads a document from disk under the given identity.
    ///
    /// Binary or non-UTF-8 files load with empty content rather than failing; they
    /// normalize to nothing and score near zero against everything.
    pub fn read(path: &Path, id: impl Into<String>) -> Result<Self, CorpusError> {
        let metadata = std::fs::metadata(path).map_err(|source| CorpusError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let bytes = std::fs::read(path).map_err(|source| CorpusError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let modified = metadata
            .modified()
            .map(system_time_to_nanos)
            .unwrap_or_default();

        let content = decode_text(&bytes).unwrap_or_else(|| {
            debug!(path = %path.display(), "Treating binary or non-UTF-8 file as empty text");
            String::new()
        });

        Ok(Self {
            id: id.into(),
            content,
            modified,
            source: Some(std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())),
        })
    }

    /// Stable identity (relative path or content-addressed key).
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Raw text content.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Modification time in nanoseconds since the Unix epoch.
    pub fn modified(&self) -> i64 {
        self.modified
    }

    /// Canonical path the document was read from, if it came from disk.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Whether `other` is this same file.
    ///
    /// Compares canonical source paths when both documents were read from disk, and
    /// identities otherwise.
    pub fn is_same_file(&self, other: &Document) -> bool {
        match (self.source(), other.source()) {
            (Some(a), Some(b)) => a == b,
            _ => self.id == other.id,
        }
    }

    /// File name component of the identity.
    pub fn file_name(&self) -> &str {
        self.id.rsplit('/').next().unwrap_or(&self.id)
    }

    /// Returns a copy with a different modification time (content untouched).
    pub fn with_modified(mut self, modified: i64) -> Self {
        self.modified = modified;
        self
    }
}

/// A file the loader could not turn into a [`Document`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedDocument {
    /// Identity (or path, when no identity could be derived).
    pub id: String,
    /// Human-readable reason.
    pub reason: String,
}

/// Result of loading a corpus.
#[derive(Debug, Clone, Default)]
pub struct CorpusLoad {
    /// Readable documents, sorted by identity.
    pub documents: Vec<Document>,
    /// Files that were found but could not be read.
    pub skipped: Vec<SkippedDocument>,
}

/// Walks `root` recursively and reads every file whose extension is in `extensions`.
///
/// Identities are relative to `root`. Only a missing root is an error. Unreadable entries
/// are recorded in [`CorpusLoad::skipped`] and the walk continues.
pub fn load_corpus(root: &Path, extensions: &[String]) -> Result<CorpusLoad, CorpusError> {
    load_corpus_within(root, root, extensions)
}

/// Like [`load_corpus`], with identities relative to `identity_root` instead of `root`.
///
/// `identity_root` should be an ancestor of `root`; otherwise identities fall back to the
/// full path.
pub fn load_corpus_within(
    root: &Path,
    identity_root: &Path,
    extensions: &[String],
) -> Result<CorpusLoad, CorpusError> {
    if !root.exists() {
        return Err(CorpusError::RootNotFound {
            path: root.to_path_buf(),
        });
    }

    let mut load = CorpusLoad::default();

    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let id = e
                    .path()
                    .map(|p| identity_for(identity_root, p))
                    .unwrap_or_else(|| root.display().to_string());
                warn!(id = %id, error = %e, "Skipping unreadable corpus entry");
                load.skipped.push(SkippedDocument {
                    id,
                    reason: e.to_string(),
                });
                continue;
            }
        };

        if !entry.file_type().is_file() || !has_extension(entry.path(), extensions) {
            continue;
        }

        let id = identity_for(identity_root, entry.path());
        match Document::read(entry.path(), id.clone()) {
            Ok(doc) => load.documents.push(doc),
            Err(e) => {
                warn!(id = %id, error = %e, "Skipping unreadable document");
                load.skipped.push(SkippedDocument {
                    id,
                    reason: e.to_string(),
                });
            }
        }
    }

    load.documents.sort_by(|a, b| a.id.cmp(&b.id));

    debug!(
        root = %root.display(),
        documents = load.documents.len(),
        skipped = load.skipped.len(),
        "Corpus loaded"
    );

    Ok(load)
}

/// Identity of `path` relative to `root`, `/`-separated.
pub fn identity_for(root: &Path, path: &Path) -> String {
    let relative: PathBuf = path.strip_prefix(root).unwrap_or(path).to_path_buf();
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Canonical form of a corpus root.
pub fn canonical_root(root: &Path) -> Result<PathBuf, CorpusError> {
    std::fs::canonicalize(root).map_err(|_| CorpusError::RootNotFound {
        path: root.to_path_buf(),
    })
}

/// Deepest directory that contains both `a` and `b`.
///
/// Both paths should be canonical. Paths with nothing in common (different drive
/// prefixes) yield an empty path, and identities then keep the full path.
pub fn common_root(a: &Path, b: &Path) -> PathBuf {
    a.components()
        .zip(b.components())
        .take_while(|(x, y)| x == y)
        .map(|(x, _)| x)
        .collect()
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    if extensions.is_empty() {
        return true;
    }
    path.extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .is_some_and(|ext| extensions.iter().any(|e| *e == ext))
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

fn decode_text(bytes: &[u8]) -> Option<String> {
    let sniff = &bytes[..bytes.len().min(BINARY_SNIFF_LEN)];
    if sniff.contains(&0) {
        return None;
    }
    String::from_utf8(bytes.to_vec()).ok()
}

fn system_time_to_nanos(time: SystemTime) -> i64 {
    time.duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_nanos()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
