//! Rendering straight out of local git clones.

use std::sync::Arc;

use pacfile_cli::source::{DownloadError, Downloader, GitDownloader};
use pacfile_cli::templating::{RenderSettings, Renderer};
use pacfile_cli::test_utils::TestRepo;
use tempfile::TempDir;

use crate::fixtures::{compact, document};

/// A clone at `<tmp>/org/app` holding `df`, `mod1` and `mod2` on master.
/// `None` when git is not installed.
fn seeded_clone() -> Option<(TempDir, TestRepo)> {
    if !TestRepo::git_available() {
        eprintln!("git not available, skipping");
        return None;
    }
    let root = TempDir::new().unwrap();
    let repo = TestRepo::init(root.path(), "org", "app").unwrap();
    repo.commit_files(
        &[("df", document("df")), ("mod1", document("mod1")), ("mod2", document("mod2"))],
        "Initial pipelines",
    )
    .unwrap();
    Some((root, repo))
}

fn renderer(root: &TempDir, settings: RenderSettings) -> Renderer {
    Renderer::new(Arc::new(GitDownloader::new(root.path())), settings)
}

#[tokio::test]
async fn renders_committed_documents() {
    let Some((root, _repo)) = seeded_clone() else {
        return;
    };
    let rendered = renderer(&root, RenderSettings::default())
        .parse("org", "app", "df", Vec::new())
        .await
        .unwrap();
    assert_eq!(
        compact(&rendered),
        r#"{"stages":[{"foo":"bar","type":"deploy"},{"type":"jenkins"}]}"#
    );
}

#[tokio::test]
async fn uncommitted_changes_are_invisible() {
    let Some((root, repo)) = seeded_clone() else {
        return;
    };
    std::fs::write(repo.path().join("mod2"), r#"{"type": "dirty"}"#).unwrap();

    let rendered = renderer(&root, RenderSettings::default())
        .parse("org", "app", "df", Vec::new())
        .await
        .unwrap();
    assert!(rendered.contains("jenkins"));
    assert!(!rendered.contains("dirty"));
}

#[tokio::test]
async fn modules_follow_the_template_branch() {
    let Some((root, repo)) = seeded_clone() else {
        return;
    };
    repo.create_branch("stable").unwrap();
    repo.commit_files(&[("mod2", r#"{"type": "stable"}"#)], "Stable stage").unwrap();
    repo.checkout("master").unwrap();

    let settings = RenderSettings {
        template_branch: Some("stable".to_string()),
        ..RenderSettings::default()
    };
    let rendered = renderer(&root, settings).parse("org", "app", "df", Vec::new()).await.unwrap();
    assert_eq!(
        compact(&rendered),
        r#"{"stages":[{"foo":"bar","type":"deploy"},{"type":"stable"}]}"#
    );
}

#[tokio::test]
async fn root_document_follows_the_branch() {
    let Some((root, repo)) = seeded_clone() else {
        return;
    };
    repo.create_branch("release").unwrap();
    repo.commit_files(&[("df", r#"{"stages": [{{ module "mod2" }}]}"#)], "Release").unwrap();
    repo.checkout("master").unwrap();

    let settings = RenderSettings {
        branch: "release".to_string(),
        ..RenderSettings::default()
    };
    let rendered = renderer(&root, settings).parse("org", "app", "df", Vec::new()).await.unwrap();
    assert_eq!(compact(&rendered), r#"{"stages":[{"type":"jenkins"}]}"#);
}

#[tokio::test]
async fn missing_files_and_refs_are_not_found() {
    let Some((root, _repo)) = seeded_clone() else {
        return;
    };
    let err = renderer(&root, RenderSettings::default())
        .parse("org", "app", "nonexistentfile", Vec::new())
        .await
        .unwrap_err();
    assert!(err.is_not_found(), "got {err:?}");

    let settings = RenderSettings {
        branch: "no-such-branch".to_string(),
        ..RenderSettings::default()
    };
    let err = renderer(&root, settings).parse("org", "app", "df", Vec::new()).await.unwrap_err();
    assert!(err.is_not_found(), "got {err:?}");
}

#[tokio::test]
async fn non_utf8_files_are_transport_errors() {
    let Some((root, repo)) = seeded_clone() else {
        return;
    };
    repo.commit_files(&[("latin1", &b"{\"name\": \"caf\xE9\"}"[..])], "Latin-1 document").unwrap();

    let err = GitDownloader::new(root.path())
        .download("org", "app", "latin1", "master")
        .await
        .unwrap_err();
    match err {
        DownloadError::Transport {
            message,
            ..
        } => assert!(message.contains("not valid UTF-8"), "{message}"),
        other => panic!("expected a transport error, got {other:?}"),
    }
}

#[tokio::test]
async fn option_like_refs_are_rejected() {
    let Some((root, _repo)) = seeded_clone() else {
        return;
    };
    let err = GitDownloader::new(root.path())
        .download("org", "app", "df", "--output=/tmp/pwned")
        .await
        .unwrap_err();
    assert!(matches!(err, DownloadError::InvalidPath { .. }), "got {err:?}");
}
