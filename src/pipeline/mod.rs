//! End-to-end run: detect, verify, flush the cache, report.

mod error;
mod report;

#[cfg(test)]
mod tests;

pub use error::PipelineError;
pub use report::{CacheSummary, PipelineReport, Summary};

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::cache::SimilarityCache;
use crate::config::Config;
use crate::corpus::{
    Document, SkippedDocument, canonical_root, common_root, load_corpus_within,
};
use crate::detector::{DetectorConfig, LifecycleDetector, output_order};
use crate::similarity::{EngineOptions, SimilarityEngine};
use crate::verifier::BatchVerifier;

/// Documents for one run.
#[derive(Debug, Clone, Default)]
pub struct Inputs {
    pub candidates: Vec<Document>,
    pub baselines: Vec<Document>,
    /// Files either corpus could not read.
    pub skipped: Vec<SkippedDocument>,
}

/// Loads both corpora described by `config`.
///
/// Identities in both corpora are relative to the directory the two roots have in common,
/// so same-named files in different corpora stay distinct in matching and in the cache.
/// Files under the baseline directory are removed from the candidate set, so the default
/// layout (baseline nested inside the candidate root) never matches a file against itself.
pub fn load_inputs(config: &Config) -> Result<Inputs, PipelineError> {
    let candidate_root = canonical_root(&config.candidate_dir)?;
    let baseline_root = canonical_root(&config.baseline_dir)?;
    let identity_root = common_root(&candidate_root, &baseline_root);
    debug!(root = %identity_root.display(), "Resolved identity root");

    let candidates = load_corpus_within(&candidate_root, &identity_root, &config.extensions)?;
    let baselines = load_corpus_within(&baseline_root, &identity_root, &config.extensions)?;

    let mut kept = Vec::with_capacity(candidates.documents.len());
    for doc in candidates.documents {
        if doc.source().is_some_and(|p| p.starts_with(&baseline_root)) {
            debug!(doc = %doc.id(), "Candidate lives in the baseline corpus, excluded");
            continue;
        }
        kept.push(doc);
    }

    let mut skipped = candidates.skipped;
    skipped.extend(baselines.skipped);

    info!(
        candidates = kept.len(),
        baselines = baselines.documents.len(),
        unreadable = skipped.len(),
        "Corpora loaded"
    );

    Ok(Inputs {
        candidates: kept,
        baselines: baselines.documents,
        skipped,
    })
}

/// Detector, verifier and the cache they share.
#[derive(Debug)]
pub struct Pipeline {
    detector: LifecycleDetector,
    verifier: BatchVerifier,
    cache: Arc<SimilarityCache>,
}

impl Pipeline {
    pub fn new(detector: LifecycleDetector, verifier: BatchVerifier) -> Self {
        let cache = Arc::clone(detector.engine().cache());
        Self {
            detector,
            verifier,
            cache,
        }
    }

    /// Opens the cache, probes the similarity backend and sets up the verifier.
    pub fn from_config(config: &Config) -> Result<Self, PipelineError> {
        let cache = Arc::new(SimilarityCache::open(&config.cache_path));
        let engine = SimilarityEngine::probe(&EngineOptions::from_config(config), cache);
        let detector = LifecycleDetector::new(
            Arc::new(engine),
            DetectorConfig {
                workers: config.workers,
                ..DetectorConfig::default()
            },
        )?;
        Ok(Self::new(detector, BatchVerifier::from_config(config)))
    }

    pub fn detector(&self) -> &LifecycleDetector {
        &self.detector
    }

    pub fn verifier(&self) -> &BatchVerifier {
        &self.verifier
    }

    pub fn cache(&self) -> &Arc<SimilarityCache> {
        &self.cache
    }

    /// Runs over a full corpus load: unreadable files are reported and cache entries for
    /// documents that no longer exist are pruned.
    pub async fn run_inputs(&self, inputs: Inputs) -> PipelineReport {
        let live: HashSet<&str> = inputs
            .candidates
            .iter()
            .chain(&inputs.baselines)
            .map(|d| d.id())
            .collect();
        let pruned = self.cache.prune(&live);

        self.execute(&inputs.candidates, &inputs.baselines, inputs.skipped, pruned)
            .await
    }

    /// Scans, verifies and flushes the cache. Always returns a complete report.
    pub async fn run(&self, candidates: &[Document], baselines: &[Document]) -> PipelineReport {
        self.execute(candidates, baselines, Vec::new(), 0).await
    }

    async fn execute(
        &self,
        candidates: &[Document],
        baselines: &[Document],
        mut skipped: Vec<SkippedDocument>,
        pruned: usize,
    ) -> PipelineReport {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let engine = self.detector.engine();
        info!(run_id = %run_id, backend = %engine.kind(), "Pipeline run started");

        let scan = self.detector.scan_report(candidates, baselines).await;
        skipped.extend(scan.skipped);
        skipped.sort_by(|a, b| a.id.cmp(&b.id));

        let verified = self.verifier.verify_report(scan.candidates).await;
        let mut final_candidates = verified.candidates;
        final_candidates.sort_by(output_order);

        let saved = match self.cache.save() {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Failed to save similarity cache");
                false
            }
        };

        let summary = Summary::tally(&final_candidates, skipped.len(), scan.evaluated);
        info!(
            run_id = %run_id,
            candidates = summary.candidates,
            high = summary.high,
            medium = summary.medium,
            verified_yes = summary.verified_yes,
            verified_no = summary.verified_no,
            verified_partial = summary.verified_partial,
            unavailable = summary.unavailable,
            skipped = summary.skipped,
            backend = %engine.kind(),
            "Pipeline run complete"
        );

        PipelineReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            backend: engine.kind(),
            backend_tag: engine.tag().to_string(),
            verifier_available: self.verifier.is_available(),
            summary,
            verification: verified.stats,
            cache: CacheSummary::new(
                self.cache.len(),
                self.cache.stats(),
                self.cache.load_outcome(),
                pruned,
                saved,
            ),
            candidates: final_candidates,
            skipped,
        }
    }
}
