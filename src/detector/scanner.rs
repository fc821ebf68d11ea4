use std::sync::Arc;

use futures_util::StreamExt;
use futures_util::stream;
use tracing::{debug, info, warn};

use super::error::DetectorError;
use super::naming::transient_pattern;
use super::types::{Candidate, DetectionType, ScanReport, output_order};
use crate::constants::Thresholds;
use crate::corpus::{Document, SkippedDocument};
use crate::similarity::{SimilarityEngine, SimilarityScore};

/// Detector settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectorConfig {
    pub thresholds: Thresholds,
    /// Candidate documents evaluated concurrently.
    pub workers: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
            workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
        }
    }
}

/// Finds candidate documents that a baseline document appears to supersede.
#[derive(Debug)]
pub struct LifecycleDetector {
    engine: Arc<SimilarityEngine>,
    config: DetectorConfig,
}

enum Evaluation {
    Flagged(Candidate),
    Discarded,
    Skipped(SkippedDocument),
}

impl LifecycleDetector {
    pub fn new(engine: Arc<SimilarityEngine>, config: DetectorConfig) -> Result<Self, DetectorError> {
        config.thresholds.validate()?;
        if config.workers == 0 {
            return Err(DetectorError::NoWorkers);
        }
        Ok(Self { engine, config })
    }

    pub fn engine(&self) -> &Arc<SimilarityEngine> {
        &self.engine
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Candidates in output order: HIGH first, then confidence descending, then path.
    pub async fn scan(&self, candidates: &[Document], baselines: &[Document]) -> Vec<Candidate> {
        self.scan_report(candidates, baselines).await.candidates
    }

    /// Like [`scan`](Self::scan), also returning skipped documents.
    ///
    /// Each candidate is compared against every baseline on the blocking pool, at most
    /// `workers` at a time. Nothing here aborts the scan.
    pub async fn scan_report(&self, candidates: &[Document], baselines: &[Document]) -> ScanReport {
        let mut sorted_baselines = baselines.to_vec();
        sorted_baselines.sort_by(|a, b| a.id().cmp(b.id()));
        let baselines = Arc::new(sorted_baselines);
        let thresholds = self.config.thresholds;

        info!(
            candidates = candidates.len(),
            baselines = baselines.len(),
            backend = %self.engine.kind(),
            workers = self.config.workers,
            "Starting lifecycle scan"
        );

        let evaluations: Vec<(String, Result<Evaluation, tokio::task::JoinError>)> =
            stream::iter(candidates.iter().cloned())
                .map(|candidate| {
                    let engine = Arc::clone(&self.engine);
                    let baselines = Arc::clone(&baselines);
                    let id = candidate.id().to_string();
                    async move {
                        let result = tokio::task::spawn_blocking(move || {
                            evaluate(&engine, &candidate, &baselines, &thresholds)
                        })
                        .await;
                        (id, result)
                    }
                })
                .buffer_unordered(self.config.workers)
                .collect()
                .await;

        let mut report = ScanReport::default();
        for (id, evaluation) in evaluations {
            match evaluation {
                Ok(Evaluation::Flagged(candidate)) => {
                    report.evaluated += 1;
                    report.candidates.push(candidate);
                }
                Ok(Evaluation::Discarded) => report.evaluated += 1,
                Ok(Evaluation::Skipped(skipped)) => report.skipped.push(skipped),
                Err(e) => {
                    warn!(doc = %id, error = %e, "Comparison task failed, skipping document");
                    report.skipped.push(SkippedDocument {
                        id,
                        reason: format!("comparison task failed: {e}"),
                    });
                }
            }
        }

        report.candidates.sort_by(output_order);
        report.skipped.sort_by(|a, b| a.id.cmp(&b.id));

        info!(
            flagged = report.candidates.len(),
            evaluated = report.evaluated,
            skipped = report.skipped.len(),
            "Lifecycle scan complete"
        );
        report
    }
}

fn evaluate(
    engine: &SimilarityEngine,
    candidate: &Document,
    baselines: &[Document],
    thresholds: &Thresholds,
) -> Evaluation {
    if engine.normalized(candidate).is_empty() {
        warn!(doc = %candidate.id(), "No comparable text after normalization, skipping");
        return Evaluation::Skipped(SkippedDocument {
            id: candidate.id().to_string(),
            reason: "no comparable text after normalization".to_string(),
        });
    }

    // Baselines are sorted by identity; a strict `>` keeps the earliest on ties.
    let mut best: Option<(&Document, SimilarityScore)> = None;
    for baseline in baselines {
        if baseline.is_same_file(candidate) {
            continue;
        }
        let score = engine.compare(candidate, baseline);
        if best.is_none_or(|(_, current)| score.value() > current.value()) {
            best = Some((baseline, score));
        }
    }

    let Some((baseline, score)) = best else {
        debug!(doc = %candidate.id(), "No baseline to compare against");
        return Evaluation::Discarded;
    };

    let detection = match transient_pattern(candidate.id()) {
        Some(pattern) => DetectionType::TransientNaming { pattern },
        None => DetectionType::ContentOnly,
    };

    match Candidate::classify(
        candidate.id(),
        Some(baseline.id().to_string()),
        score.value(),
        score.backend(),
        detection,
        thresholds,
    ) {
        Some(flagged) => {
            debug!(
                doc = %candidate.id(),
                matched = %baseline.id(),
                score = score.value(),
                tier = %flagged.tier(),
                "Candidate flagged"
            );
            Evaluation::Flagged(flagged)
        }
        None => {
            debug!(
                doc = %candidate.id(),
                best = %baseline.id(),
                score = score.value(),
                "Below candidate floor, discarded"
            );
            Evaluation::Discarded
        }
    }
}
