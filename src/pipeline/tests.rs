use std::sync::Arc;
use std::time::Duration;

use super::*;
use crate::cache::{LoadOutcome, SimilarityCache};
use crate::corpus::Document;
use crate::detector::{DetectorConfig, LifecycleDetector, Tier, VerificationStatus};
use crate::similarity::{BackendKind, SimilarityEngine};
use crate::verifier::{BatchVerifier, MockReasoner, MockReply, ReasoningService};

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

fn pipeline(engine: SimilarityEngine, verifier: BatchVerifier) -> Pipeline {
    let detector = LifecycleDetector::new(
        Arc::new(engine),
        DetectorConfig {
            workers: 2,
            ..DetectorConfig::default()
        },
    )
    .unwrap();
    Pipeline::new(detector, verifier)
}

fn corpus() -> (Vec<Document>, Vec<Document>) {
    let baselines = vec![Document::new("final.md", text(20, &[]), 1)];
    let candidates = vec![
        Document::new("dup.md", text(20, &[4]), 1),
        Document::new("gray.md", text(20, &[0, 2, 4, 6, 8, 10, 12, 14, 16]), 1),
        Document::new("unrelated.md", text(20, &(0..18).collect::<Vec<_>>()), 1),
        Document::new("empty.md", "", 1),
    ];
    (candidates, baselines)
}

#[tokio::test]
async fn test_run_without_verifier_reports_everything() {
    let (candidates, baselines) = corpus();
    let p = pipeline(
        SimilarityEngine::sequence_overlap(Arc::new(SimilarityCache::in_memory())),
        BatchVerifier::unavailable(),
    );

    let report = p.run(&candidates, &baselines).await;

    assert_eq!(report.backend, BackendKind::SequenceOverlap);
    assert!(!report.verifier_available);
    assert_eq!(report.summary.candidates, 2);
    assert_eq!(report.summary.high, 1);
    assert_eq!(report.summary.medium, 1);
    assert_eq!(report.summary.unavailable, 1);
    assert_eq!(report.summary.skipped, 1);
    assert_eq!(report.summary.evaluated, 3);
    assert_eq!(report.skipped[0].id, "empty.md");
    assert_eq!(report.candidates[0].path(), "dup.md");
}

#[tokio::test]
async fn test_verified_candidate_moves_ahead_in_order() {
    let baselines = vec![Document::new("final.md", text(20, &[]), 1)];
    let candidates = vec![
        Document::new("high.md", text(20, &[1, 2, 3]), 1),
        Document::new("gray.md", text(20, &[0, 2, 4, 6, 8, 10, 12, 14, 16]), 1),
    ];
    let mock = Arc::new(MockReasoner::scripted(vec![MockReply::text("1. YES")]));
    let p = pipeline(
        SimilarityEngine::sequence_overlap(Arc::new(SimilarityCache::in_memory())),
        BatchVerifier::new(
            Some(Arc::clone(&mock) as Arc<dyn ReasoningService>),
            Duration::from_secs(5),
        ),
    );

    let report = p.run(&candidates, &baselines).await;

    assert_eq!(mock.calls(), 1);
    assert_eq!(report.summary.verified_yes, 1);
    assert_eq!(report.summary.high, 2);
    let order: Vec<&str> = report.candidates.iter().map(|c| c.path()).collect();
    assert_eq!(order, vec!["gray.md", "high.md"]);
    assert_eq!(report.candidates[0].tier(), Tier::High);
    assert_eq!(
        report.candidates[0].verification(),
        VerificationStatus::VerifiedYes
    );
}

#[tokio::test]
async fn test_run_flushes_cache_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cache.rkyv");
    let (candidates, baselines) = corpus();

    let first = pipeline(
        SimilarityEngine::lexical(Arc::new(SimilarityCache::open(&path))),
        BatchVerifier::unavailable(),
    );
    let report = first.run(&candidates, &baselines).await;
    assert!(report.cache.saved);
    assert!(report.cache.writes > 0);
    assert!(path.exists());

    let reopened = Arc::new(SimilarityCache::open(&path));
    assert!(matches!(reopened.load_outcome(), LoadOutcome::Loaded { .. }));
    let second = pipeline(
        SimilarityEngine::lexical(Arc::clone(&reopened)),
        BatchVerifier::unavailable(),
    );
    let again = second.run(&candidates, &baselines).await;
    assert_eq!(again.cache.writes, 0);
    assert_eq!(again.summary, report.summary);
}

#[tokio::test]
async fn test_run_inputs_prunes_stale_entries() {
    let cache = Arc::new(SimilarityCache::in_memory());
    cache.set(
        &Document::new("deleted.md", "gone", 1),
        crate::cache::VectorPayload::Dense(vec![1.0]),
        "lexical:v1",
    );
    let (candidates, baselines) = corpus();
    let p = pipeline(
        SimilarityEngine::lexical(Arc::clone(&cache)),
        BatchVerifier::unavailable(),
    );

    let report = p
        .run_inputs(Inputs {
            candidates,
            baselines,
            skipped: Vec::new(),
        })
        .await;

    assert_eq!(report.cache.pruned, 1);
    assert!(cache.get(&Document::new("deleted.md", "gone", 1), "lexical:v1").is_none());
}

#[tokio::test]
async fn test_report_serializes_to_json() {
    let (candidates, baselines) = corpus();
    let p = pipeline(
        SimilarityEngine::sequence_overlap(Arc::new(SimilarityCache::in_memory())),
        BatchVerifier::unavailable(),
    );

    let report = p.run(&candidates, &baselines).await;
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["backend"], "sequence_overlap");
    assert_eq!(json["backend_tag"], "sequence:v1");
    assert_eq!(json["candidates"][1]["verification"], "VERIFICATION_UNAVAILABLE");
    assert!(json["run_id"].is_string());
}

#[test]
fn test_load_inputs_excludes_nested_baseline() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    std::fs::create_dir_all(root.join("docs")).unwrap();
    std::fs::create_dir_all(root.join("notes")).unwrap();
    std::fs::write(root.join("docs/final.md"), "final").unwrap();
    std::fs::write(root.join("notes/draft.md"), "draft").unwrap();
    std::fs::write(root.join("readme.md"), "readme").unwrap();

    let config = Config {
        candidate_dir: root.to_path_buf(),
        baseline_dir: root.join("docs"),
        ..Config::default()
    };

    let inputs = load_inputs(&config).unwrap();
    let ids: Vec<&str> = inputs.candidates.iter().map(|d| d.id()).collect();

    assert_eq!(ids, vec!["notes/draft.md", "readme.md"]);
    assert_eq!(inputs.baselines.len(), 1);
    assert_eq!(inputs.baselines[0].id(), "docs/final.md");
}

#[tokio::test]
async fn test_same_named_files_in_both_corpora_are_compared() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let readme = (0..30).map(|i| format!("setup{i}")).collect::<Vec<_>>().join(" ");
    let guide = (0..30).map(|i| format!("usage{i}")).collect::<Vec<_>>().join(" ");
    std::fs::create_dir_all(root.join("docs")).unwrap();
    std::fs::write(root.join("README.md"), &readme).unwrap();
    std::fs::write(root.join("docs/README.md"), &readme).unwrap();
    std::fs::write(root.join("guide.md"), &guide).unwrap();
    std::fs::write(root.join("docs/guide.md"), format!("{guide} appendix")).unwrap();

    let config = Config {
        candidate_dir: root.to_path_buf(),
        baseline_dir: root.join("docs"),
        cache_path: root.join("state/cache.rkyv"),
        model_dir: None,
        lexical_enabled: true,
        verifier_model: None,
        ..Config::default()
    };

    let inputs = load_inputs(&config).unwrap();
    let candidate_ids: Vec<&str> = inputs.candidates.iter().map(|d| d.id()).collect();
    let baseline_ids: Vec<&str> = inputs.baselines.iter().map(|d| d.id()).collect();
    assert_eq!(candidate_ids, vec!["README.md", "guide.md"]);
    assert_eq!(baseline_ids, vec!["docs/README.md", "docs/guide.md"]);

    let report = Pipeline::from_config(&config)
        .unwrap()
        .run_inputs(inputs)
        .await;

    assert_eq!(report.candidates.len(), 2);
    let readme = report.candidates.iter().find(|c| c.path() == "README.md").unwrap();
    assert_eq!(readme.matched(), Some("docs/README.md"));
    assert_eq!(readme.confidence(), 1.0);
    let guide = report.candidates.iter().find(|c| c.path() == "guide.md").unwrap();
    assert_eq!(guide.matched(), Some("docs/guide.md"));
    assert_eq!(guide.tier(), Tier::High);

    // One cache entry per file; same-named files do not overwrite each other.
    assert_eq!(report.cache.entries, 4);
}

#[test]
fn test_load_inputs_sibling_roots_share_identity_root() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    std::fs::create_dir_all(root.join("drafts")).unwrap();
    std::fs::create_dir_all(root.join("final")).unwrap();
    std::fs::write(root.join("drafts/guide.md"), "draft").unwrap();
    std::fs::write(root.join("final/guide.md"), "final").unwrap();

    let config = Config {
        candidate_dir: root.join("drafts"),
        baseline_dir: root.join("final"),
        ..Config::default()
    };

    let inputs = load_inputs(&config).unwrap();

    assert_eq!(inputs.candidates[0].id(), "drafts/guide.md");
    assert_eq!(inputs.baselines[0].id(), "final/guide.md");
}

#[test]
fn test_load_inputs_missing_root_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        candidate_dir: dir.path().join("missing"),
        baseline_dir: dir.path().to_path_buf(),
        ..Config::default()
    };
    assert!(matches!(
        load_inputs(&config),
        Err(PipelineError::Corpus(_))
    ));
}
