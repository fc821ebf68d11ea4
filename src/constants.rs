//! Cross-cutting, shared constants.
//!
//! Every confidence value in the crate is an `f32` in `[0.0, 1.0]`. Integer percentages
//! only appear in human-readable reason strings.
//!
//! # Classification Invariants
//!
//! The tier boundaries are fixed, documented constants. If a caller needs different
//! boundaries (tests, experiments), pass a [`Thresholds`] through the detector and use
//! [`Thresholds::validate`] at the boundary so an inverted band is caught early.

/// Best-match score at or above which a candidate is HIGH confidence.
pub const HIGH_CONFIDENCE_FLOOR: f32 = 0.75;

/// Relaxed HIGH floor for documents named like transient lifecycle artifacts
/// (drafts, analyses, plans). Structural similarity to the absorbing document is
/// inherently lower for these even when the relationship is certain.
pub const TRANSIENT_HIGH_CONFIDENCE_FLOOR: f32 = 0.70;

/// Scores below this are discarded and never surfaced as candidates.
pub const CANDIDATE_FLOOR: f32 = 0.40;

/// Confidence assigned to a MEDIUM candidate the verifier confirmed.
pub const VERIFIED_CONFIDENCE: f32 = 0.90;

/// Maximum number of candidates per verification request (context budget of the
/// reasoning service).
pub const MAX_BATCH_SIZE: usize = 10;

/// Default timeout for a single verification request.
pub const DEFAULT_VERIFIER_TIMEOUT_SECS: u64 = 60;

/// On-disk schema version of the similarity cache. Bump on any layout change.
pub const CACHE_SCHEMA_VERSION: u32 = 1;

/// Number of feature-hash buckets used by the lexical backend (2^20).
pub const LEXICAL_BUCKETS: u32 = 1 << 20;

/// Per-side token cap for the sequence-overlap backend.
pub const SEQUENCE_TOKEN_CAP: usize = 4000;

/// Maximum number of model windows averaged per document by the embedding backend.
pub const MAX_EMBEDDING_WINDOWS: usize = 8;

/// Runtime classification boundaries for the lifecycle detector.
///
/// Defaults to the fixed constants above.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// HIGH floor for ordinary documents.
    pub high: f32,
    /// HIGH floor for transient-lifecycle documents.
    pub transient_high: f32,
    /// Minimum score for a document to be surfaced at all.
    pub candidate: f32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            high: HIGH_CONFIDENCE_FLOOR,
            transient_high: TRANSIENT_HIGH_CONFIDENCE_FLOOR,
            candidate: CANDIDATE_FLOOR,
        }
    }
}

impl Thresholds {
    /// Validates that all floors are in range and ordered `candidate <= transient_high <= high`.
    pub fn validate(&self) -> Result<(), ThresholdError> {
        for (name, value) in [
            ("high", self.high),
            ("transient_high", self.transient_high),
            ("candidate", self.candidate),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ThresholdError::OutOfRange { name, value });
            }
        }
        if self.candidate > self.transient_high || self.transient_high > self.high {
            return Err(ThresholdError::Unordered {
                candidate: self.candidate,
                transient_high: self.transient_high,
                high: self.high,
            });
        }
        Ok(())
    }

    /// Returns the HIGH floor that applies to a document.
    pub fn high_floor(&self, transient: bool) -> f32 {
        if transient {
            self.transient_high
        } else {
            self.high
        }
    }
}

/// Error returned when threshold validation fails.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ThresholdError {
    /// A floor is outside `[0.0, 1.0]`.
    #[error("threshold '{name}' = {value} is outside [0.0, 1.0]")]
    OutOfRange { name: &'static str, value: f32 },
    /// Floors are not ordered `candidate <= transient_high <= high`.
    #[error(
        "thresholds must satisfy candidate ({candidate}) <= transient_high ({transient_high}) <= high ({high})"
    )]
    Unordered {
        candidate: f32,
        transient_high: f32,
        high: f32,
    },
}
