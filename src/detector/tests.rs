use std::sync::Arc;

use super::*;
use crate::cache::SimilarityCache;
use crate::constants::{Thresholds, VERIFIED_CONFIDENCE};
use crate::corpus::Document;
use crate::similarity::{BackendKind, SimilarityEngine};

/// `n` tokens; positions listed in `replaced` get a token that appears nowhere else.
fn text(n: usize, replaced: &[usize]) -> String {
    (0..n)
        .map(|i| {
            if replaced.contains(&i) {
                format!("other{i}")
            } else {
                format!("tok{i}")
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn doc(id: &str, content: impl Into<String>) -> Document {
    Document::new(id, content, 1)
}

fn detector() -> LifecycleDetector {
    let engine = SimilarityEngine::sequence_overlap(Arc::new(SimilarityCache::in_memory()));
    LifecycleDetector::new(
        Arc::new(engine),
        DetectorConfig {
            thresholds: Thresholds::default(),
            workers: 4,
        },
    )
    .unwrap()
}

#[tokio::test]
async fn test_near_duplicate_is_high_without_verification() {
    let baseline = doc("final.md", text(20, &[]));
    let candidate = doc("archive/old.md", text(20, &[3, 11]));

    let found = detector().scan(&[candidate], &[baseline]).await;

    assert_eq!(found.len(), 1);
    let c = &found[0];
    assert_eq!(c.tier(), Tier::High);
    assert_eq!(c.verification(), VerificationStatus::NotNeeded);
    assert!((c.confidence() - 0.9).abs() < 1e-6);
    assert_eq!(c.matched(), Some("final.md"));
    assert_eq!(c.backend(), BackendKind::SequenceOverlap);
}

#[tokio::test]
async fn test_gray_zone_is_medium_and_pending() {
    let baseline = doc("final.md", text(20, &[]));
    let candidate = doc("old.md", text(20, &[0, 2, 4, 6, 8, 10, 12, 14, 16]));

    let found = detector().scan(&[candidate], &[baseline]).await;

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].tier(), Tier::Medium);
    assert_eq!(found[0].verification(), VerificationStatus::Pending);
    assert!((found[0].confidence() - 0.55).abs() < 1e-6);
    assert!(found[0].is_pending());
}

#[tokio::test]
async fn test_low_similarity_is_absent() {
    let baseline = doc("final.md", text(20, &[]));
    let replaced: Vec<usize> = (0..16).collect();
    let candidate = doc("old.md", text(20, &replaced));

    let report = detector().scan_report(&[candidate], &[baseline]).await;

    assert!(report.candidates.is_empty());
    assert!(report.skipped.is_empty());
    assert_eq!(report.evaluated, 1);
}

#[tokio::test]
async fn test_no_candidate_below_floor() {
    let baseline = doc("final.md", text(20, &[]));
    let candidates: Vec<Document> = (0..20)
        .map(|k| {
            let replaced: Vec<usize> = (0..k).collect();
            doc(&format!("c{k:02}.md"), text(20, &replaced))
        })
        .collect();

    let found = detector().scan(&candidates, &[baseline]).await;

    assert!(!found.is_empty());
    assert!(found.iter().all(|c| c.confidence() >= 0.40));
    assert!(found.iter().all(|c| c.tier() != Tier::Low));
}

#[tokio::test]
async fn test_transient_name_relaxes_high_floor() {
    let baseline = doc("design.md", text(25, &[]));
    let body = text(25, &[1, 5, 9, 13, 17, 21, 24]);

    let found = detector()
        .scan(
            &[doc("migration-plan.md", body.clone()), doc("migration.md", body)],
            &[baseline],
        )
        .await;

    assert_eq!(found.len(), 2);
    let plan = found.iter().find(|c| c.path() == "migration-plan.md").unwrap();
    let plain = found.iter().find(|c| c.path() == "migration.md").unwrap();

    assert!((plan.confidence() - 0.72).abs() < 1e-6);
    assert_eq!(plan.tier(), Tier::High);
    assert_eq!(
        plan.detection(),
        &DetectionType::TransientNaming {
            pattern: "plan".to_string()
        }
    );
    assert!((plan.high_floor() - 0.70).abs() < 1e-6);

    assert_eq!(plain.tier(), Tier::Medium);
    assert_eq!(plain.detection(), &DetectionType::ContentOnly);
}

#[tokio::test]
async fn test_ties_prefer_earliest_baseline() {
    let body = text(20, &[]);
    let candidate = doc("old.md", text(20, &[7]));

    let found = detector()
        .scan(
            &[candidate],
            &[doc("zeta.md", body.clone()), doc("alpha.md", body.clone()), doc("mid.md", body)],
        )
        .await;

    assert_eq!(found[0].matched(), Some("alpha.md"));
}

#[tokio::test]
async fn test_document_is_never_matched_against_itself() {
    let body = text(20, &[]);
    let candidate = doc("shared.md", body.clone());
    let baselines = [
        doc("shared.md", body),
        doc("other.md", text(20, &[0, 2, 4, 6, 8, 10, 12, 14, 16])),
    ];

    let found = detector().scan(&[candidate], &baselines).await;

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].matched(), Some("other.md"));
    assert_eq!(found[0].tier(), Tier::Medium);
}

#[tokio::test]
async fn test_distinct_files_sharing_an_identity_are_compared() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("docs")).unwrap();
    std::fs::write(dir.path().join("README.md"), text(20, &[])).unwrap();
    std::fs::write(dir.path().join("docs/README.md"), text(20, &[])).unwrap();
    let candidate = Document::read(&dir.path().join("README.md"), "README.md").unwrap();
    let baseline = Document::read(&dir.path().join("docs/README.md"), "README.md").unwrap();

    let found = detector().scan(&[candidate], &[baseline]).await;

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].confidence(), 1.0);
    assert_eq!(found[0].tier(), Tier::High);
}

#[tokio::test]
async fn test_empty_candidate_is_skipped_with_reason() {
    let baseline = doc("final.md", text(20, &[]));
    let candidates = [doc("blank.md", "   \n\n"), doc("old.md", text(20, &[1]))];

    let report = detector().scan_report(&candidates, &[baseline]).await;

    assert_eq!(report.candidates.len(), 1);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].id, "blank.md");
    assert_eq!(report.evaluated, 1);
}

#[tokio::test]
async fn test_empty_baseline_set_flags_nothing() {
    let found = detector().scan(&[doc("old.md", text(10, &[]))], &[]).await;
    assert!(found.is_empty());
}

#[tokio::test]
async fn test_output_order_is_deterministic() {
    let baseline = doc("final.md", text(20, &[]));
    let candidates = [
        doc("b-medium.md", text(20, &[0, 2, 4, 6, 8, 10, 12, 14, 16])),
        doc("a-medium.md", text(20, &[0, 2, 4, 6, 8, 10, 12, 14, 16])),
        doc("high-lower.md", text(20, &[1, 2, 3])),
        doc("high-top.md", text(20, &[5])),
        doc("medium-top.md", text(20, &[0, 1, 2, 3, 4, 5])),
    ];

    let found = detector().scan(&candidates, &[baseline]).await;
    let order: Vec<&str> = found.iter().map(|c| c.path()).collect();

    assert_eq!(
        order,
        vec![
            "high-top.md",
            "high-lower.md",
            "medium-top.md",
            "a-medium.md",
            "b-medium.md"
        ]
    );
}

#[test]
fn test_invalid_configuration_is_rejected() {
    let engine = Arc::new(SimilarityEngine::sequence_overlap(Arc::new(
        SimilarityCache::in_memory(),
    )));

    let inverted = DetectorConfig {
        thresholds: Thresholds {
            high: 0.5,
            transient_high: 0.6,
            candidate: 0.4,
        },
        workers: 1,
    };
    assert!(matches!(
        LifecycleDetector::new(Arc::clone(&engine), inverted),
        Err(DetectorError::InvalidThresholds(_))
    ));

    let no_workers = DetectorConfig {
        workers: 0,
        ..DetectorConfig::default()
    };
    assert!(matches!(
        LifecycleDetector::new(engine, no_workers),
        Err(DetectorError::NoWorkers)
    ));
}

#[test]
fn test_classify_discards_below_floor() {
    let t = Thresholds::default();
    assert!(
        Candidate::classify("a.md", None, 0.39, BackendKind::Lexical, DetectionType::ContentOnly, &t)
            .is_none()
    );
    assert!(
        Candidate::classify("a.md", None, 0.40, BackendKind::Lexical, DetectionType::ContentOnly, &t)
            .is_some()
    );
}

#[test]
fn test_tier_is_rederived_when_confidence_changes() {
    let mut c = Candidate::classify(
        "a.md",
        Some("b.md".to_string()),
        0.55,
        BackendKind::Lexical,
        DetectionType::ContentOnly,
        &Thresholds::default(),
    )
    .unwrap();
    assert_eq!(c.tier(), Tier::Medium);

    c.set_confidence(VERIFIED_CONFIDENCE);
    assert_eq!(c.tier(), Tier::High);

    c.set_confidence(1.7);
    assert_eq!(c.confidence(), 1.0);
}

#[test]
fn test_reason_mentions_match_and_backend() {
    let c = Candidate::classify(
        "drafts/intro.md",
        Some("intro.md".to_string()),
        0.712,
        BackendKind::Embedding,
        DetectionType::TransientNaming {
            pattern: "drafts".to_string(),
        },
        &Thresholds::default(),
    )
    .unwrap();

    assert_eq!(
        c.reason(),
        "71% similar to intro.md (embedding); transient 'drafts' name, HIGH floor 70%"
    );
}

#[test]
fn test_candidate_serializes_tags() {
    let c = Candidate::classify(
        "old.md",
        Some("final.md".to_string()),
        0.8,
        BackendKind::Lexical,
        DetectionType::ContentOnly,
        &Thresholds::default(),
    )
    .unwrap();

    let json = serde_json::to_value(&c).unwrap();
    assert_eq!(json["tier"], "HIGH");
    assert_eq!(json["verification"], "NOT_NEEDED");
    assert_eq!(json["detection"]["kind"], "content_only");
    assert_eq!(json["backend"], "lexical");
    assert!(json.get("note").is_none());
}

#[test]
fn test_transient_patterns() {
    assert_eq!(transient_pattern("migration-plan.md").as_deref(), Some("plan"));
    assert_eq!(transient_pattern("DRAFT_api.md").as_deref(), Some("draft"));
    assert_eq!(transient_pattern("docs/drafts/intro.md").as_deref(), Some("drafts"));
    assert_eq!(transient_pattern("perf analysis.md").as_deref(), Some("analysis"));
    assert_eq!(transient_pattern("planet.md"), None);
    assert_eq!(transient_pattern("airplane.md"), None);
    assert_eq!(transient_pattern("README.md"), None);
    assert_eq!(transient_pattern("release-notes.md"), None);
    assert_eq!(transient_pattern("meeting-notes/2024-05-01.md"), None);
    assert_eq!(
        transient_pattern("meeting-notes/api-draft.md").as_deref(),
        Some("draft")
    );
}
