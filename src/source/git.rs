//! Downloader reading files out of local git clones.

use std::path::PathBuf;

use futures::future::BoxFuture;

use super::{DownloadError, Downloader, describe_location, validate_file_name};
use crate::git::{GitCommand, GitError};

/// Reads `<ref>:<path>` from the clone at `<root>/<org>/<repo>`.
#[derive(Debug, Clone)]
pub struct GitDownloader {
    root: PathBuf,
}

impl GitDownloader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
        }
    }

    fn repo_dir(&self, org: &str, repo: &str) -> PathBuf {
        self.root.join(org).join(repo)
    }
}

impl Downloader for GitDownloader {
    fn download<'a>(
        &'a self,
        org: &'a str,
        repo: &'a str,
        path: &'a str,
        git_ref: &'a str,
    ) -> BoxFuture<'a, Result<String, DownloadError>> {
        Box::pin(async move {
            validate_file_name(path)?;
            validate_file_name(org)?;
            validate_file_name(repo)?;

            let location = describe_location(org, repo, path, git_ref);
            let dir = self.repo_dir(org, repo);
            if !dir.is_dir() {
                tracing::debug!(target: "source", "No clone at {}", dir.display());
                return Err(DownloadError::NotFound {
                    location,
                });
            }

            GitCommand::show(git_ref, path)
                .map_err(|err| DownloadError::InvalidPath {
                    path: git_ref.to_string(),
                    reason: err.to_string(),
                })?
                .current_dir(&dir)
                .with_context(location.as_str())
                .execute()
                .await
                .map_err(|err| classify(location, err))
        })
    }
}

/// Map a failed `git show` onto the download error classes.
fn classify(location: String, err: GitError) -> DownloadError {
    match err {
        GitError::Failed {
            ref stderr,
            ..
        } if is_missing_object(stderr) => DownloadError::NotFound {
            location,
        },
        other => DownloadError::Transport {
            location,
            message: other.to_string(),
        },
    }
}

fn is_missing_object(stderr: &str) -> bool {
    stderr.contains("does not exist")
        || stderr.contains("exists on disk, but not in")
        || stderr.contains("invalid object name")
        || stderr.contains("unknown revision")
}
