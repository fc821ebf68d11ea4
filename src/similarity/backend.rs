use std::fmt;

use serde::Serialize;

/// Comparison strategy selected once per engine.
///
/// Listed from highest fidelity to the dependency-free baseline; the engine probes them
/// in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Dense sentence embeddings, compared by cosine.
    Embedding,
    /// Sparse term-frequency vectors, compared by cosine.
    Lexical,
    /// Token sequence-overlap ratio on normalized text.
    SequenceOverlap,
}

impl BackendKind {
    /// Probe order.
    pub const PROBE_ORDER: [BackendKind; 3] = [
        BackendKind::Embedding,
        BackendKind::Lexical,
        BackendKind::SequenceOverlap,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Embedding => "embedding",
            BackendKind::Lexical => "lexical",
            BackendKind::SequenceOverlap => "sequence",
        }
    }

    /// Whether this backend produces vectors that go through the cache.
    pub fn is_vector_backed(&self) -> bool {
        !matches!(self, BackendKind::SequenceOverlap)
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Similarity between two documents plus the backend that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SimilarityScore {
    value: f32,
    backend: BackendKind,
}

impl SimilarityScore {
    /// Clamps `value` into `[0.0, 1.0]`; NaN becomes `0.0`.
    pub fn new(value: f32, backend: BackendKind) -> Self {
        let value = if value.is_nan() {
            0.0
        } else {
            value.clamp(0.0, 1.0)
        };
        Self { value, backend }
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn backend(&self) -> BackendKind {
        self.backend
    }
}
