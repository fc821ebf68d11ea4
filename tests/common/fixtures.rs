//! Test fixtures for integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use supersede::config::Config;
use tempfile::TempDir;

/// `n` tokens; positions in `replaced` get a token that appears nowhere else.
///
/// Under the sequence-overlap backend two such texts of length `n` score
/// `(n - replaced) / n`.
pub fn words(n: usize, replaced: &[usize]) -> String {
    (0..n)
        .map(|i| {
            if replaced.contains(&i) {
                format!("unique{i}")
            } else {
                format!("shared{i}")
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Positions `0, 2, 4, ...` (`count` of them).
pub fn every_other(count: usize) -> Vec<usize> {
    (0..count).map(|i| i * 2).collect()
}

/// On-disk candidate and baseline corpora under one temp directory.
pub struct CorpusBuilder {
    dir: TempDir,
}

impl CorpusBuilder {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("temp dir");
        std::fs::create_dir_all(dir.path().join("candidates")).expect("candidates dir");
        std::fs::create_dir_all(dir.path().join("baseline")).expect("baseline dir");
        Self { dir }
    }

    pub fn candidate(self, id: &str, content: impl AsRef<[u8]>) -> Self {
        write(&self.candidate_dir().join(id), content.as_ref());
        self
    }

    pub fn baseline(self, id: &str, content: impl AsRef<[u8]>) -> Self {
        write(&self.baseline_dir().join(id), content.as_ref());
        self
    }

    pub fn candidate_dir(&self) -> PathBuf {
        self.dir.path().join("candidates")
    }

    pub fn baseline_dir(&self) -> PathBuf {
        self.dir.path().join("baseline")
    }

    pub fn cache_path(&self) -> PathBuf {
        self.dir.path().join("state/cache.rkyv")
    }

    /// Config pointing at this corpus: no model, no verifier, sequence backend unless
    /// `lexical` is set.
    pub fn config(&self, lexical: bool) -> Config {
        Config {
            candidate_dir: self.candidate_dir(),
            baseline_dir: self.baseline_dir(),
            cache_path: self.cache_path(),
            model_dir: None,
            lexical_enabled: lexical,
            workers: 4,
            verifier_model: None,
            verifier_timeout: Duration::from_secs(5),
            ..Config::default()
        }
    }
}

fn write(path: &Path, content: &[u8]) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("parent dir");
    }
    std::fs::write(path, content).expect("write fixture");
}
