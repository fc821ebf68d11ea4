//! Supersede: finds documents in a corpus that another document has superseded,
//! absorbed or duplicated.
//!
//! Data flows one way:
//!
//! [`normalize`] → [`similarity`] (backed by [`cache`]) → [`detector`] → [`verifier`]
//!
//! [`pipeline`] wires them together for a run; the `supersede` binary prints its
//! [`PipelineReport`] as JSON.
//!
//! ## Test/Mock Support
//! [`StubEmbedder`](embedding::StubEmbedder) and [`MockReasoner`](verifier::MockReasoner)
//! are available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod cache;
pub mod config;
pub mod constants;
pub mod corpus;
pub mod detector;
pub mod embedding;
pub mod hashing;
pub mod normalize;
pub mod pipeline;
pub mod similarity;
pub mod verifier;

pub use cache::{CacheError, CacheStats, LoadOutcome, SimilarityCache, VectorPayload};
pub use config::{Config, ConfigError};
pub use constants::{
    CANDIDATE_FLOOR, HIGH_CONFIDENCE_FLOOR, MAX_BATCH_SIZE, TRANSIENT_HIGH_CONFIDENCE_FLOOR,
    Thresholds, VERIFIED_CONFIDENCE,
};
pub use corpus::{CorpusError, Document, SkippedDocument, load_corpus, load_corpus_within};
pub use detector::{
    Candidate, DetectionType, DetectorConfig, DetectorError, LifecycleDetector, ScanReport, Tier,
    VerificationStatus,
};
pub use embedding::{EmbeddingError, SentenceEncoder, TextEmbedder};
pub use normalize::normalize;
pub use pipeline::{Inputs, Pipeline, PipelineError, PipelineReport, Summary, load_inputs};
pub use similarity::{BackendKind, EngineOptions, SimilarityEngine, SimilarityScore};
pub use verifier::{
    BatchVerdict, BatchVerifier, GenaiReasoner, ReasoningService, Verdict, VerifierError,
};
#[cfg(any(test, feature = "mock"))]
pub use verifier::{MockReasoner, MockReply};
