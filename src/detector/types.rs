use std::fmt;

use serde::Serialize;

use crate::constants::Thresholds;
use crate::corpus::SkippedDocument;
use crate::similarity::BackendKind;

/// Confidence band. Derived from a confidence value, never set on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Tier {
    High,
    Medium,
    Low,
}

impl Tier {
    pub fn from_confidence(confidence: f32, high_floor: f32, candidate_floor: f32) -> Self {
        if confidence >= high_floor {
            Tier::High
        } else if confidence >= candidate_floor {
            Tier::Medium
        } else {
            Tier::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::High => "HIGH",
            Tier::Medium => "MEDIUM",
            Tier::Low => "LOW",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a document was flagged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DetectionType {
    /// The identity matches a transient lifecycle naming convention (the relaxed HIGH
    /// floor applied).
    TransientNaming { pattern: String },
    /// Flagged on content similarity alone.
    ContentOnly,
}

/// Where a candidate stands with respect to external verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationStatus {
    /// HIGH at classification time.
    NotNeeded,
    /// MEDIUM, waiting for the verifier.
    Pending,
    VerifiedYes,
    VerifiedNo,
    VerifiedPartial,
    #[serde(rename = "VERIFICATION_UNAVAILABLE")]
    Unavailable,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::NotNeeded => "NOT_NEEDED",
            VerificationStatus::Pending => "PENDING",
            VerificationStatus::VerifiedYes => "VERIFIED_YES",
            VerificationStatus::VerifiedNo => "VERIFIED_NO",
            VerificationStatus::VerifiedPartial => "VERIFIED_PARTIAL",
            VerificationStatus::Unavailable => "VERIFICATION_UNAVAILABLE",
        }
    }
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A document flagged as possibly superseded by a baseline document.
///
/// Only the verifier mutates a candidate after creation, and only through
/// crate-internal setters that keep `tier` consistent with `confidence`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    path: String,
    matched: Option<String>,
    confidence: f32,
    tier: Tier,
    detection: DetectionType,
    reason: String,
    verification: VerificationStatus,
    backend: BackendKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    note: Option<String>,
    #[serde(skip)]
    high_floor: f32,
    #[serde(skip)]
    candidate_floor: f32,
}

impl Candidate {
    /// Classifies a best match. Returns `None` when the score falls below the candidate
    /// floor: such documents are discarded, not surfaced as LOW.
    pub fn classify(
        path: impl Into<String>,
        matched: Option<String>,
        confidence: f32,
        backend: BackendKind,
        detection: DetectionType,
        thresholds: &Thresholds,
    ) -> Option<Self> {
        let confidence = clamp_unit(confidence);
        let transient = matches!(detection, DetectionType::TransientNaming { .. });
        let high_floor = thresholds.high_floor(transient);

        let tier = Tier::from_confidence(confidence, high_floor, thresholds.candidate);
        let verification = match tier {
            Tier::High => VerificationStatus::NotNeeded,
            Tier::Medium => VerificationStatus::Pending,
            Tier::Low => return None,
        };

        let reason = describe(matched.as_deref(), confidence, backend, &detection, high_floor);

        Some(Self {
            path: path.into(),
            matched,
            confidence,
            tier,
            detection,
            reason,
            verification,
            backend,
            note: None,
            high_floor,
            candidate_floor: thresholds.candidate,
        })
    }

    /// Identity of the flagged document.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Identity of the best-matching baseline document.
    pub fn matched(&self) -> Option<&str> {
        self.matched.as_deref()
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    pub fn tier(&self) -> Tier {
        self.tier
    }

    pub fn detection(&self) -> &DetectionType {
        &self.detection
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn verification(&self) -> VerificationStatus {
        self.verification
    }

    pub fn backend(&self) -> BackendKind {
        self.backend
    }

    /// Verifier reasoning kept for audit (e.g. a PARTIAL scope annotation).
    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    /// HIGH floor that applied when this candidate was classified.
    pub fn high_floor(&self) -> f32 {
        self.high_floor
    }

    pub fn is_pending(&self) -> bool {
        self.verification == VerificationStatus::Pending
    }

    /// Sets confidence and re-derives the tier.
    pub(crate) fn set_confidence(&mut self, confidence: f32) {
        self.confidence = clamp_unit(confidence);
        self.tier = Tier::from_confidence(self.confidence, self.high_floor, self.candidate_floor);
    }

    pub(crate) fn set_verification(&mut self, status: VerificationStatus) {
        self.verification = status;
    }

    pub(crate) fn set_note(&mut self, note: Option<String>) {
        self.note = note;
    }
}

/// HIGH first, then confidence descending, then path ascending.
pub(crate) fn output_order(a: &Candidate, b: &Candidate) -> std::cmp::Ordering {
    a.tier
        .cmp(&b.tier)
        .then_with(|| b.confidence.total_cmp(&a.confidence))
        .then_with(|| a.path.cmp(&b.path))
}

fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

fn describe(
    matched: Option<&str>,
    confidence: f32,
    backend: BackendKind,
    detection: &DetectionType,
    high_floor: f32,
) -> String {
    let pct = (confidence * 100.0).round() as u32;
    let mut reason = match matched {
        Some(baseline) => format!("{pct}% similar to {baseline} ({backend})"),
        None => format!("{pct}% best similarity ({backend})"),
    };
    if let DetectionType::TransientNaming { pattern } = detection {
        let floor = (high_floor * 100.0).round() as u32;
        reason.push_str(&format!(
            "; transient '{pattern}' name, HIGH floor {floor}%"
        ));
    }
    reason
}

/// Candidates plus documents the scan could not evaluate.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanReport {
    /// Candidates in output order.
    pub candidates: Vec<Candidate>,
    /// Candidate documents skipped with a recorded reason.
    pub skipped: Vec<SkippedDocument>,
    /// Candidate documents compared against the baseline.
    pub evaluated: usize,
}
