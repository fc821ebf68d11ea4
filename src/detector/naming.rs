use std::sync::LazyLock;

use regex::Regex;

/// Name fragments of documents expected to be absorbed into a final artifact.
///
/// Matched against any path segment, so a `drafts/` directory marks everything under it.
/// `notes` is not listed: release notes and meeting notes are usually final artifacts.
static TRANSIENT_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:^|[-_./\s])(drafts?|wip|scratch|analysis|analyses|plans?|planning|proposal|brainstorm|investigation|spike)(?:[-_./\s]|$)",
    )
    .expect("transient name pattern is valid")
});

/// Returns the lower-cased transient keyword if `identity` follows a transient lifecycle
/// naming convention (`migration-plan.md`, `DRAFT_api.md`, `drafts/intro.md`).
pub fn transient_pattern(identity: &str) -> Option<String> {
    TRANSIENT_NAME
        .captures(identity)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_lowercase())
}
