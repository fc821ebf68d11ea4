use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use moka::sync::Cache;
use tracing::{debug, info, warn};

use super::backend::{BackendKind, SimilarityScore};
use super::lexical::LexicalVectorizer;
use super::sequence::sequence_ratio;
use super::vector::cosine;
use crate::cache::{SimilarityCache, VectorPayload};
use crate::config::Config;
use crate::corpus::Document;
use crate::embedding::{SentenceEncoder, TextEmbedder};
use crate::hashing::document_key;
use crate::normalize::normalize;

/// Upper bound on memoized normalized texts and vectors per engine.
pub const MEMO_CAPACITY: u64 = 8_192;

/// Version suffix for the lexical backend tag. Bump when tokenization or weighting changes.
const LEXICAL_TAG: &str = "lexical:v1";
const SEQUENCE_TAG: &str = "sequence:v1";

/// Inputs to backend negotiation.
#[derive(Debug, Clone, Default)]
pub struct EngineOptions {
    /// Sentence-encoder model directory; `None` skips the embedding probe.
    pub model_dir: Option<PathBuf>,
    /// Allow the lexical backend (also requires the `lexical` feature).
    pub lexical_enabled: bool,
}

impl EngineOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            model_dir: config.model_dir.clone(),
            lexical_enabled: config.lexical_enabled,
        }
    }
}

enum Backend {
    Embedding(Arc<dyn TextEmbedder>),
    Lexical(LexicalVectorizer),
    SequenceOverlap,
}

impl Backend {
    fn kind(&self) -> BackendKind {
        match self {
            Backend::Embedding(_) => BackendKind::Embedding,
            Backend::Lexical(_) => BackendKind::Lexical,
            Backend::SequenceOverlap => BackendKind::SequenceOverlap,
        }
    }

    fn tag(&self) -> String {
        match self {
            Backend::Embedding(embedder) => format!("embedding:{}", embedder.model_id()),
            Backend::Lexical(_) => LEXICAL_TAG.to_string(),
            Backend::SequenceOverlap => SEQUENCE_TAG.to_string(),
        }
    }
}

/// Pairwise document comparator with a backend fixed at construction.
///
/// `compare` takes `&self` and is safe to call from many threads at once; the only
/// shared mutable state is the injected [`SimilarityCache`] and two in-memory memos.
pub struct SimilarityEngine {
    backend: Backend,
    tag: String,
    cache: Arc<SimilarityCache>,
    texts: Cache<u64, Arc<str>>,
    vectors: Cache<u64, Arc<VectorPayload>>,
    vector_failures: AtomicU64,
}

impl std::fmt::Debug for SimilarityEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimilarityEngine")
            .field("backend", &self.backend.kind())
            .field("tag", &self.tag)
            .field("cache", &self.cache)
            .finish()
    }
}

impl SimilarityEngine {
    /// Probes backends in [`BackendKind::PROBE_ORDER`] and keeps the first that works.
    ///
    /// Never fails: the sequence-overlap baseline has no dependencies.
    pub fn probe(options: &EngineOptions, cache: Arc<SimilarityCache>) -> Self {
        let backend = select_backend(options);
        let engine = Self::from_backend(backend, cache);
        info!(backend = %engine.kind(), tag = %engine.tag, "Similarity backend selected");
        engine
    }

    /// Builds an embedding-backed engine around an already loaded embedder.
    pub fn with_embedder(embedder: Arc<dyn TextEmbedder>, cache: Arc<SimilarityCache>) -> Self {
        Self::from_backend(Backend::Embedding(embedder), cache)
    }

    /// Builds a lexical engine regardless of configuration.
    pub fn lexical(cache: Arc<SimilarityCache>) -> Self {
        Self::from_backend(Backend::Lexical(LexicalVectorizer::new()), cache)
    }

    /// Builds a sequence-overlap engine.
    pub fn sequence_overlap(cache: Arc<SimilarityCache>) -> Self {
        Self::from_backend(Backend::SequenceOverlap, cache)
    }

    fn from_backend(backend: Backend, cache: Arc<SimilarityCache>) -> Self {
        let tag = backend.tag();
        Self {
            backend,
            tag,
            cache,
            texts: Cache::new(MEMO_CAPACITY),
            vectors: Cache::new(MEMO_CAPACITY),
            vector_failures: AtomicU64::new(0),
        }
    }

    /// Compares two documents. Symmetric; identical normalized text scores `1.0`.
    pub fn compare(&self, a: &Document, b: &Document) -> SimilarityScore {
        let ta = self.normalized(a);
        let tb = self.normalized(b);

        let value = if ta == tb {
            1.0
        } else if ta.is_empty() || tb.is_empty() {
            0.0
        } else {
            match &self.backend {
                Backend::SequenceOverlap => sequence_ratio(&ta, &tb),
                Backend::Embedding(_) | Backend::Lexical(_) => {
                    match (self.vector(a, &ta), self.vector(b, &tb)) {
                        (Some(va), Some(vb)) => cosine(&va, &vb),
                        _ => 0.0,
                    }
                }
            }
        };

        SimilarityScore::new(value, self.kind())
    }

    /// Normalized text for `doc`, computed once per (identity, mtime).
    pub fn normalized(&self, doc: &Document) -> Arc<str> {
        self.texts
            .get_with(document_key(doc.id(), doc.modified()), || {
                Arc::from(normalize(doc.content()))
            })
    }

    pub fn kind(&self) -> BackendKind {
        self.backend.kind()
    }

    /// Backend tag stored with cached vectors, e.g. `embedding:all-MiniLM-L6-v2`.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn cache(&self) -> &Arc<SimilarityCache> {
        &self.cache
    }

    /// Documents whose vector could not be computed this run.
    pub fn vector_failures(&self) -> u64 {
        self.vector_failures.load(Ordering::Relaxed)
    }

    /// Memo, then persistent cache, then compute (written back to both).
    fn vector(&self, doc: &Document, text: &str) -> Option<Arc<VectorPayload>> {
        let key = document_key(doc.id(), doc.modified());
        if let Some(vector) = self.vectors.get(&key) {
            return Some(vector);
        }

        if let Some(vector) = self.cache.get(doc, &self.tag) {
            let vector = Arc::new(vector);
            self.vectors.insert(key, Arc::clone(&vector));
            return Some(vector);
        }

        let computed = match &self.backend {
            Backend::Embedding(embedder) => embedder
                .embed(text)
                .map(VectorPayload::Dense)
                .map_err(|e| e.to_string()),
            Backend::Lexical(vectorizer) => Ok(vectorizer.vectorize(text)),
            Backend::SequenceOverlap => return None,
        };

        match computed {
            Ok(vector) => {
                self.cache.set(doc, vector.clone(), &self.tag);
                let vector = Arc::new(vector);
                self.vectors.insert(key, Arc::clone(&vector));
                Some(vector)
            }
            Err(reason) => {
                self.vector_failures.fetch_add(1, Ordering::Relaxed);
                warn!(doc = %doc.id(), reason = %reason, "Vector computation failed, scoring as dissimilar");
                None
            }
        }
    }
}

fn select_backend(options: &EngineOptions) -> Backend {
    for kind in BackendKind::PROBE_ORDER {
        match probe_backend(kind, options) {
            Ok(backend) => return backend,
            Err(reason) => debug!(backend = %kind, reason = %reason, "Similarity backend unavailable"),
        }
    }
    Backend::SequenceOverlap
}

fn probe_backend(kind: BackendKind, options: &EngineOptions) -> Result<Backend, String> {
    match kind {
        BackendKind::Embedding => {
            let dir = options
                .model_dir
                .as_deref()
                .ok_or_else(|| "no model directory configured".to_string())?;
            match SentenceEncoder::load(dir) {
                Ok(encoder) => Ok(Backend::Embedding(Arc::new(encoder))),
                Err(e) => {
                    warn!(model_dir = %dir.display(), error = %e, "Sentence encoder failed to load");
                    Err(e.to_string())
                }
            }
        }
        BackendKind::Lexical => {
            if !cfg!(feature = "lexical") {
                Err("built without the `lexical` feature".to_string())
            } else if !options.lexical_enabled {
                Err("disabled by configuration".to_string())
            } else {
                Ok(Backend::Lexical(LexicalVectorizer::new()))
            }
        }
        BackendKind::SequenceOverlap => Ok(Backend::SequenceOverlap),
    }
}
