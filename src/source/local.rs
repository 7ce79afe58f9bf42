//! Filesystem-backed downloader.

use std::io::ErrorKind;
use std::path::PathBuf;

use futures::future::BoxFuture;

use super::{DownloadError, Downloader, describe_location, validate_file_name};

/// Reads `<root>/<path>` from disk.
///
/// Organisation, repository and ref are ignored, which makes this the
/// downloader for rendering a working copy before it is pushed.
#[derive(Debug, Clone)]
pub struct LocalDownloader {
    root: PathBuf,
}

impl LocalDownloader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
        }
    }
}

impl Downloader for LocalDownloader {
    fn download<'a>(
        &'a self,
        org: &'a str,
        repo: &'a str,
        path: &'a str,
        git_ref: &'a str,
    ) -> BoxFuture<'a, Result<String, DownloadError>> {
        Box::pin(async move {
            validate_file_name(path)?;
            let file = self.root.join(path);
            tracing::debug!(target: "source", "Reading {}", file.display());

            tokio::fs::read_to_string(&file).await.map_err(|err| {
                let location = describe_location(org, repo, path, git_ref);
                match err.kind() {
                    ErrorKind::NotFound => DownloadError::NotFound {
                        location,
                    },
                    _ => DownloadError::Transport {
                        location,
                        message: format!("{}: {err}", file.display()),
                    },
                }
            })
        })
    }
}
