//! Environment-backed configuration.
//!
//! Every setting has a default. Override with `SUPERSEDE_*` environment variables.

pub mod error;


pub use error::ConfigError;

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::DEFAULT_VERIFIER_TIMEOUT_SECS;

/// Run configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `SUPERSEDE_*` overrides on top of defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root of the corpus under evaluation (walked recursively). Default: `.`.
    pub candidate_dir: PathBuf,

    /// Root of the finalized corpus. Default: `./docs`.
    pub baseline_dir: PathBuf,

    /// Similarity cache file. Default: `./.supersede/similarity-cache.rkyv`.
    pub cache_path: PathBuf,

    /// Sentence-encoder directory (`config.json`, `tokenizer.json`, `model.safetensors`).
    pub model_dir: Option<PathBuf>,

    /// Whether the lexical backend may be selected. Default: `true`.
    pub lexical_enabled: bool,

    /// File extensions considered documents (lower-case, no dot).
    pub extensions: Vec<String>,

    /// Worker count for pairwise comparison. Default: available parallelism.
    pub workers: usize,

    /// Model used by the batch verifier. `None` disables verification.
    pub verifier_model: Option<String>,

    /// Timeout for a single verification request. Default: 60s.
    pub verifier_timeout: Duration,
}

/// Default document extensions used when `SUPERSEDE_EXTENSIONS` is not set.
pub const DEFAULT_EXTENSIONS: &[&str] = &["md", "markdown", "txt", "rst"];

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            candidate_dir: PathBuf::from("."),
            baseline_dir: PathBuf::from("./docs"),
            cache_path: PathBuf::from("./.supersede/similarity-cache.rkyv"),
            model_dir: None,
            lexical_enabled: true,
            extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            workers: default_workers(),
            verifier_model: None,
            verifier_timeout: Duration::from_secs(DEFAULT_VERIFIER_TIMEOUT_SECS),
        }
    }
}

impl Config {
    const ENV_CANDIDATE_DIR: &'static str = "SUPERSEDE_CANDIDATE_DIR";
    const ENV_BASELINE_DIR: &'static str = "SUPERSEDE_BASELINE_DIR";
    const ENV_CACHE_PATH: &'static str = "SUPERSEDE_CACHE_PATH";
    const ENV_MODEL_DIR: &'static str = "SUPERSEDE_MODEL_DIR";
    const ENV_DISABLE_LEXICAL: &'static str = "SUPERSEDE_DISABLE_LEXICAL";
    const ENV_EXTENSIONS: &'static str = "SUPERSEDE_EXTENSIONS";
    const ENV_WORKERS: &'static str = "SUPERSEDE_WORKERS";
    const ENV_VERIFIER_MODEL: &'static str = "SUPERSEDE_VERIFIER_MODEL";
    const ENV_VERIFIER_TIMEOUT_SECS: &'static str = "SUPERSEDE_VERIFIER_TIMEOUT_SECS";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let candidate_dir = Self::parse_path_from_env(Self::ENV_CANDIDATE_DIR, defaults.candidate_dir);
        let baseline_dir = Self::parse_path_from_env(Self::ENV_BASELINE_DIR, defaults.baseline_dir);
        let cache_path = Self::parse_path_from_env(Self::ENV_CACHE_PATH, defaults.cache_path);
        let model_dir = Self::parse_optional_string_from_env(Self::ENV_MODEL_DIR).map(PathBuf::from);
        let lexical_enabled = !Self::parse_flag_from_env(Self::ENV_DISABLE_LEXICAL);
        let extensions = Self::parse_list_from_env(Self::ENV_EXTENSIONS, defaults.extensions);

        let workers = Self::parse_u64_from_env(Self::ENV_WORKERS, defaults.workers as u64)? as usize;
        if workers == 0 {
            return Err(ConfigError::InvalidValue {
                name: Self::ENV_WORKERS,
                reason: "must be at least 1".to_string(),
            });
        }

        let verifier_model = Self::parse_optional_string_from_env(Self::ENV_VERIFIER_MODEL);
        let verifier_timeout = Duration::from_secs(Self::parse_u64_from_env(
            Self::ENV_VERIFIER_TIMEOUT_SECS,
            defaults.verifier_timeout.as_secs(),
        )?);
        if verifier_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                name: Self::ENV_VERIFIER_TIMEOUT_SECS,
                reason: "must be at least 1 second".to_string(),
            });
        }

        Ok(Self {
            candidate_dir,
            baseline_dir,
            cache_path,
            model_dir,
            lexical_enabled,
            extensions,
            workers,
            verifier_model,
            verifier_timeout,
        })
    }

    /// Validates paths and basic invariants (does not create directories).
    pub fn validate(&self) -> Result<(), ConfigError> {
        for dir in [&self.candidate_dir, &self.baseline_dir] {
            if !dir.exists() {
                return Err(ConfigError::PathNotFound { path: dir.clone() });
            }
            if !dir.is_dir() {
                return Err(ConfigError::NotADirectory { path: dir.clone() });
            }
        }

        if let Some(ref path) = self.model_dir {
            if !path.exists() {
                return Err(ConfigError::PathNotFound { path: path.clone() });
            }
            if !path.is_dir() {
                return Err(ConfigError::NotADirectory { path: path.clone() });
            }
        }

        if let Some(parent) = self.cache_path.parent() {
            if parent.exists() && !parent.is_dir() {
                return Err(ConfigError::NotADirectory {
                    path: parent.to_path_buf(),
                });
            }
        }

        Ok(())
    }

    fn parse_path_from_env(var_name: &str, default: PathBuf) -> PathBuf {
        Self::parse_optional_string_from_env(var_name)
            .map(PathBuf::from)
            .unwrap_or(default)
    }

    fn parse_optional_string_from_env(var_name: &str) -> Option<String> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse_flag_from_env(var_name: &str) -> bool {
        env::var(var_name)
            .map(|v| {
                let v = v.trim().to_ascii_lowercase();
                !v.is_empty() && v != "0" && v != "false"
            })
            .unwrap_or(false)
    }

    fn parse_list_from_env(var_name: &str, default: Vec<String>) -> Vec<String> {
        match Self::parse_optional_string_from_env(var_name) {
            Some(value) => value
                .split(',')
                .map(|s| s.trim().trim_start_matches('.').to_ascii_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
            None => default,
        }
    }

    fn parse_u64_from_env(var_name: &'static str, default: u64) -> Result<u64, ConfigError> {
        match Self::parse_optional_string_from_env(var_name) {
            Some(value) => value.parse().map_err(|e| ConfigError::InvalidNumber {
                name: var_name,
                value,
                source: e,
            }),
            None => Ok(default),
        }
    }
}
