use std::sync::atomic::{AtomicUsize, Ordering};

use super::TextEmbedder;
use super::encoder::l2_normalize;
use super::error::EmbeddingError;
use crate::hashing::feature_bucket;

/// Default width of stub vectors.
pub const STUB_EMBEDDING_DIM: usize = 256;

/// Deterministic embedder for tests: hashed bag of words, no model files.
#[derive(Debug)]
pub struct StubEmbedder {
    dim: usize,
    fail: bool,
    calls: AtomicUsize,
}

impl StubEmbedder {
    pub fn new() -> Self {
        Self::with_dim(STUB_EMBEDDING_DIM)
    }

    pub fn with_dim(dim: usize) -> Self {
        Self {
            dim,
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    /// An embedder whose every call fails with an inference error.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    /// Number of `embed` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for StubEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

impl TextEmbedder for StubEmbedder {
    fn model_id(&self) -> &str {
        "stub"
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(EmbeddingError::InferenceFailed {
                reason: "stub embedder configured to fail".to_string(),
            });
        }

        let mut v = vec![0.0f32; self.dim];
        for word in text.split_whitespace() {
            v[feature_bucket(word, self.dim as u32) as usize] += 1.0;
        }
        Ok(l2_normalize(v))
    }
}
