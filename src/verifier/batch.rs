use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::error::VerifierError;
use super::parse::{BatchVerdict, Verdict, parse_verdicts};
use super::prompt::build_prompt;
use super::service::{GenaiReasoner, ReasoningService};
use crate::config::Config;
use crate::constants::{DEFAULT_VERIFIER_TIMEOUT_SECS, MAX_BATCH_SIZE, VERIFIED_CONFIDENCE};
use crate::detector::{Candidate, VerificationStatus};

/// Request counters for one `verify` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct VerifyStats {
    /// Batch requests sent.
    pub batches: usize,
    /// Batch requests that failed or timed out.
    pub failed_batches: usize,
    /// Single-candidate fallback requests sent.
    pub individual: usize,
    /// Single-candidate requests that failed, timed out or carried no verdict.
    pub failed_individual: usize,
}

/// Candidates after verification plus request counters.
#[derive(Debug, Clone, Default)]
pub struct VerifyReport {
    pub candidates: Vec<Candidate>,
    pub stats: VerifyStats,
}

/// Adjudicates MEDIUM candidates through an external reasoning service.
///
/// Fallback ladder: a short batch reply resubmits the missing candidates one by one; a
/// failed or timed-out batch resubmits every candidate in it; with no service at all,
/// every pending candidate becomes [`VerificationStatus::Unavailable`].
pub struct BatchVerifier {
    service: Option<Arc<dyn ReasoningService>>,
    timeout: Duration,
    batch_size: usize,
}

impl std::fmt::Debug for BatchVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchVerifier")
            .field("service", &self.service.as_ref().map(|s| s.name().to_string()))
            .field("timeout", &self.timeout)
            .field("batch_size", &self.batch_size)
            .finish()
    }
}

impl BatchVerifier {
    pub fn new(service: Option<Arc<dyn ReasoningService>>, timeout: Duration) -> Self {
        Self {
            service,
            timeout,
            batch_size: MAX_BATCH_SIZE,
        }
    }

    /// A verifier with no service; every pending candidate ends `Unavailable`.
    pub fn unavailable() -> Self {
        Self::new(None, Duration::from_secs(DEFAULT_VERIFIER_TIMEOUT_SECS))
    }

    /// Builds a `genai`-backed verifier when a model is configured and its provider key
    /// is present; otherwise an unavailable verifier.
    pub fn from_config(config: &Config) -> Self {
        let Some(model) = config.verifier_model.as_deref() else {
            info!("No verifier model configured, verification disabled");
            return Self::new(None, config.verifier_timeout);
        };

        match GenaiReasoner::checked(model) {
            Ok(reasoner) => {
                info!(model = %model, "Verifier available");
                Self::new(Some(Arc::new(reasoner)), config.verifier_timeout)
            }
            Err(e) => {
                warn!(error = %e, "Verification disabled");
                Self::new(None, config.verifier_timeout)
            }
        }
    }

    pub fn is_available(&self) -> bool {
        self.service.is_some()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Verifies every pending candidate; others pass through untouched. Order is kept.
    pub async fn verify(&self, candidates: Vec<Candidate>) -> Vec<Candidate> {
        self.verify_report(candidates).await.candidates
    }

    pub async fn verify_report(&self, mut candidates: Vec<Candidate>) -> VerifyReport {
        let mut stats = VerifyStats::default();
        let pending: Vec<usize> = candidates
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_pending())
            .map(|(i, _)| i)
            .collect();

        if pending.is_empty() {
            return VerifyReport { candidates, stats };
        }

        let Some(service) = self.service.as_ref() else {
            info!(
                pending = pending.len(),
                "Verification unavailable, leaving MEDIUM candidates unverified"
            );
            for &i in &pending {
                candidates[i].set_verification(VerificationStatus::Unavailable);
            }
            return VerifyReport { candidates, stats };
        };

        info!(
            pending = pending.len(),
            batch_size = self.batch_size,
            service = %service.name(),
            "Verifying MEDIUM candidates"
        );

        for chunk in pending.chunks(self.batch_size) {
            let batch: Vec<&Candidate> = chunk.iter().map(|&i| &candidates[i]).collect();
            let prompt = build_prompt(&batch);

            stats.batches += 1;
            let mut verdicts = match self.request(service.as_ref(), &prompt).await {
                Ok(response) => {
                    let parsed = parse_verdicts(&response, chunk.len());
                    let missing = parsed.iter().filter(|v| v.is_none()).count();
                    if missing > 0 {
                        warn!(
                            missing,
                            submitted = chunk.len(),
                            "Batch response incomplete, resubmitting missing candidates"
                        );
                    }
                    parsed
                }
                Err(e) => {
                    stats.failed_batches += 1;
                    warn!(
                        error = %e,
                        submitted = chunk.len(),
                        "Batch verification failed, resubmitting individually"
                    );
                    vec![None; chunk.len()]
                }
            };

            for (slot, &i) in chunk.iter().enumerate() {
                let verdict = match verdicts[slot].take() {
                    Some(verdict) => Some(verdict),
                    None => {
                        stats.individual += 1;
                        let single = self.verify_single(service.as_ref(), &candidates[i]).await;
                        if single.is_none() {
                            stats.failed_individual += 1;
                        }
                        single
                    }
                };

                match verdict {
                    Some(verdict) => apply_verdict(&mut candidates[i], verdict),
                    None => candidates[i].set_verification(VerificationStatus::Unavailable),
                }
            }
        }

        info!(
            batches = stats.batches,
            failed_batches = stats.failed_batches,
            individual = stats.individual,
            failed_individual = stats.failed_individual,
            "Verification complete"
        );
        VerifyReport { candidates, stats }
    }

    async fn verify_single(
        &self,
        service: &dyn ReasoningService,
        candidate: &Candidate,
    ) -> Option<BatchVerdict> {
        let prompt = build_prompt(&[candidate]);
        match self.request(service, &prompt).await {
            Ok(response) => {
                let verdict = parse_verdicts(&response, 1).into_iter().next().flatten();
                if verdict.is_none() {
                    warn!(doc = %candidate.path(), "No verdict in individual response");
                }
                verdict
            }
            Err(e) => {
                warn!(doc = %candidate.path(), error = %e, "Individual verification failed");
                None
            }
        }
    }

    async fn request(
        &self,
        service: &dyn ReasoningService,
        prompt: &str,
    ) -> Result<String, VerifierError> {
        match tokio::time::timeout(self.timeout, service.complete(prompt)).await {
            Ok(result) => result,
            Err(_) => Err(VerifierError::Timeout {
                millis: self.timeout.as_millis(),
            }),
        }
    }
}

/// YES sets the fixed verified confidence (tier re-derived as HIGH); NO and PARTIAL
/// leave confidence unchanged.
fn apply_verdict(candidate: &mut Candidate, verdict: BatchVerdict) {
    debug!(doc = %candidate.path(), verdict = ?verdict.verdict, "Verdict applied");
    match verdict.verdict {
        Verdict::Yes => {
            candidate.set_confidence(VERIFIED_CONFIDENCE);
            candidate.set_verification(VerificationStatus::VerifiedYes);
        }
        Verdict::No => candidate.set_verification(VerificationStatus::VerifiedNo),
        Verdict::Partial { .. } => candidate.set_verification(VerificationStatus::VerifiedPartial),
    }
    candidate.set_note(Some(verdict.reasoning));
}
