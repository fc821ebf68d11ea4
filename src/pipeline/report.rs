use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::cache::{CacheStats, LoadOutcome};
use crate::corpus::SkippedDocument;
use crate::detector::{Candidate, Tier, VerificationStatus};
use crate::similarity::BackendKind;
use crate::verifier::VerifyStats;

/// Counts over the final candidate list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub candidates: usize,
    pub high: usize,
    pub medium: usize,
    pub verified_yes: usize,
    pub verified_no: usize,
    pub verified_partial: usize,
    pub unavailable: usize,
    pub skipped: usize,
    pub evaluated: usize,
}

impl Summary {
    pub fn tally(candidates: &[Candidate], skipped: usize, evaluated: usize) -> Self {
        let mut summary = Summary {
            candidates: candidates.len(),
            skipped,
            evaluated,
            ..Default::default()
        };
        for candidate in candidates {
            match candidate.tier() {
                Tier::High => summary.high += 1,
                Tier::Medium => summary.medium += 1,
                Tier::Low => {}
            }
            match candidate.verification() {
                VerificationStatus::VerifiedYes => summary.verified_yes += 1,
                VerificationStatus::VerifiedNo => summary.verified_no += 1,
                VerificationStatus::VerifiedPartial => summary.verified_partial += 1,
                VerificationStatus::Unavailable => summary.unavailable += 1,
                VerificationStatus::NotNeeded | VerificationStatus::Pending => {}
            }
        }
        summary
    }
}

/// Cache state at the end of a run.
#[derive(Debug, Clone, Serialize)]
pub struct CacheSummary {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub writes: u64,
    pub pruned: usize,
    /// `loaded`, `fresh` or `rebuilt: <reason>`.
    pub load: String,
    pub saved: bool,
}

impl CacheSummary {
    pub(crate) fn new(
        entries: usize,
        stats: CacheStats,
        outcome: &LoadOutcome,
        pruned: usize,
        saved: bool,
    ) -> Self {
        let load = match outcome {
            LoadOutcome::Fresh => "fresh".to_string(),
            LoadOutcome::Loaded { .. } => "loaded".to_string(),
            LoadOutcome::Rebuilt { reason } => format!("rebuilt: {reason}"),
        };
        Self {
            entries,
            hits: stats.hits,
            misses: stats.misses,
            writes: stats.writes,
            pruned,
            load,
            saved,
        }
    }
}

/// Everything one run produced, ready for an external renderer.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub backend: BackendKind,
    pub backend_tag: String,
    pub verifier_available: bool,
    pub summary: Summary,
    pub verification: VerifyStats,
    pub cache: CacheSummary,
    /// Candidates in output order.
    pub candidates: Vec<Candidate>,
    pub skipped: Vec<SkippedDocument>,
}
