use super::*;
use std::fs;

fn exts() -> Vec<String> {
    vec!["md".to_string(), "txt".to_string()]
}

#[test]
fn test_document_accessors() {
    let doc = Document::new("plans/migration-plan.md", "# Plan", 42);

    assert_eq!(doc.id(), "plans/migration-plan.md");
    assert_eq!(doc.content(), "# Plan");
    assert_eq!(doc.modified(), 42);
    assert_eq!(doc.file_name(), "migration-plan.md");
}

#[test]
fn test_document_with_modified() {
    let doc = Document::new("a.md", "text", 1).with_modified(2);
    assert_eq!(doc.modified(), 2);
    assert_eq!(doc.content(), "text");
}

#[test]
fn test_read_text_document() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.md");
    fs::write(&path, "# Notes\n\nSome text.").unwrap();

    let doc = Document::read(&path, "notes.md").unwrap();

    assert_eq!(doc.id(), "notes.md");
    assert_eq!(doc.content(), "# Notes\n\nSome text.");
    assert!(doc.modified() > 0);
}

#[test]
fn test_read_binary_document_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("image.md");
    fs::write(&path, [0x89, b'P', b'N', b'G', 0x00, 0x01]).unwrap();

    let doc = Document::read(&path, "image.md").unwrap();
    assert_eq!(doc.content(), "");
}

#[test]
fn test_read_invalid_utf8_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("latin1.txt");
    fs::write(&path, [b'c', b'a', b'f', 0xE9]).unwrap();

    let doc = Document::read(&path, "latin1.txt").unwrap();
    assert_eq!(doc.content(), "");
}

#[test]
fn test_read_missing_file_errors() {
    let dir = tempfile::tempdir().unwrap();
    let err = Document::read(&dir.path().join("gone.md"), "gone.md").unwrap_err();
    assert!(matches!(err, CorpusError::Read { .. }));
}

#[test]
fn test_load_corpus_recursive_and_sorted() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("nested/deeper")).unwrap();
    fs::write(dir.path().join("b.md"), "b").unwrap();
    fs::write(dir.path().join("a.txt"), "a").unwrap();
    fs::write(dir.path().join("nested/deeper/c.md"), "c").unwrap();
    fs::write(dir.path().join("ignored.rs"), "fn main() {}").unwrap();

    let load = load_corpus(dir.path(), &exts()).unwrap();
    let ids: Vec<_> = load.documents.iter().map(|d| d.id()).collect();

    assert_eq!(ids, vec!["a.txt", "b.md", "nested/deeper/c.md"]);
    assert!(load.skipped.is_empty());
}

#[test]
fn test_load_corpus_skips_hidden_directories() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join(".git")).unwrap();
    fs::write(dir.path().join(".git/HEAD.md"), "ref").unwrap();
    fs::write(dir.path().join("visible.md"), "v").unwrap();

    let load = load_corpus(dir.path(), &exts()).unwrap();
    let ids: Vec<_> = load.documents.iter().map(|d| d.id()).collect();
    assert_eq!(ids, vec!["visible.md"]);
}

#[test]
fn test_load_corpus_extension_case_insensitive() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("README.MD"), "r").unwrap();

    let load = load_corpus(dir.path(), &exts()).unwrap();
    assert_eq!(load.documents.len(), 1);
}

#[test]
fn test_load_corpus_empty_extension_list_accepts_all() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.adoc"), "a").unwrap();
    fs::write(dir.path().join("b"), "b").unwrap();

    let load = load_corpus(dir.path(), &[]).unwrap();
    assert_eq!(load.documents.len(), 2);
}

#[test]
fn test_load_corpus_missing_root() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_corpus(&dir.path().join("missing"), &exts()).unwrap_err();
    assert!(matches!(err, CorpusError::RootNotFound { .. }));
}

#[test]
fn test_identity_for_uses_forward_slashes() {
    let root = Path::new("/repo/docs");
    let path = Path::new("/repo/docs/guides/setup.md");
    assert_eq!(identity_for(root, path), "guides/setup.md");
}

#[test]
fn test_common_root_of_nested_and_sibling_dirs() {
    assert_eq!(
        common_root(Path::new("/repo"), Path::new("/repo/docs")),
        PathBuf::from("/repo")
    );
    assert_eq!(
        common_root(Path::new("/repo/drafts"), Path::new("/repo/final")),
        PathBuf::from("/repo")
    );
    assert_eq!(
        common_root(Path::new("/repo/docs"), Path::new("/repo/docs")),
        PathBuf::from("/repo/docs")
    );
}

#[test]
fn test_load_corpus_within_prefixes_identities() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    fs::create_dir_all(root.join("docs/guides")).unwrap();
    fs::write(root.join("docs/guides/setup.md"), "setup").unwrap();

    let load = load_corpus_within(&root.join("docs"), &root, &exts()).unwrap();

    assert_eq!(load.documents.len(), 1);
    assert_eq!(load.documents[0].id(), "docs/guides/setup.md");
    assert_eq!(
        load.documents[0].source(),
        Some(root.join("docs/guides/setup.md").as_path())
    );
}

#[test]
fn test_is_same_file_compares_sources_when_read_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("docs")).unwrap();
    fs::write(dir.path().join("README.md"), "same").unwrap();
    fs::write(dir.path().join("docs/README.md"), "same").unwrap();

    let top = Document::read(&dir.path().join("README.md"), "README.md").unwrap();
    let nested = Document::read(&dir.path().join("docs/README.md"), "README.md").unwrap();
    let again = Document::read(&dir.path().join("README.md"), "other.md").unwrap();

    assert!(!top.is_same_file(&nested));
    assert!(top.is_same_file(&again));
    assert!(Document::new("a.md", "x", 1).is_same_file(&Document::new("a.md", "y", 2)));
    assert!(!Document::new("a.md", "x", 1).is_same_file(&Document::new("b.md", "x", 1)));
}
