//! Where documents and modules come from.
//!
//! A [`Downloader`] fetches the raw text of a named file from an
//! organisation, repository and ref. Three implementations ship with the
//! crate:
//!
//! - [`MemoryDownloader`] serves files registered in memory, for tests and
//!   embedding;
//! - [`LocalDownloader`] reads `<root>/<path>` from disk, ignoring
//!   organisation, repository and ref;
//! - [`GitDownloader`] reads files out of local clones laid out as
//!   `<root>/<org>/<repo>` with `git show <ref>:<path>`.
//!
//! The renderer only distinguishes two failure classes: the file does not
//! exist ([`DownloadError::NotFound`]) or it could not be fetched for some
//! other reason ([`DownloadError::Transport`]).

mod git;
mod local;

pub use git::GitDownloader;
pub use local::LocalDownloader;

use std::collections::HashMap;
use std::path::{Component, Path};
use std::sync::{PoisonError, RwLock};

use futures::future::BoxFuture;
use thiserror::Error;

/// Failure to fetch a file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DownloadError {
    /// The file does not exist at the requested location.
    #[error("File not found: {location}")]
    NotFound {
        location: String,
    },

    /// The file name would escape the source root.
    #[error("Invalid file name '{path}': {reason}")]
    InvalidPath {
        path: String,
        reason: String,
    },

    /// Any other failure to read the file.
    #[error("Failed to fetch {location}: {message}")]
    Transport {
        location: String,
        message: String,
    },
}

/// Fetches raw document text.
///
/// Implementations must be shareable across concurrent renders.
pub trait Downloader: Send + Sync {
    fn download<'a>(
        &'a self,
        org: &'a str,
        repo: &'a str,
        path: &'a str,
        git_ref: &'a str,
    ) -> BoxFuture<'a, Result<String, DownloadError>>;
}

/// Human-readable `org/repo/path@ref` used in errors and logs.
pub fn describe_location(org: &str, repo: &str, path: &str, git_ref: &str) -> String {
    format!("{org}/{repo}/{path}@{git_ref}")
}

/// Reject file names that are absolute or climb out of their root.
pub(crate) fn validate_file_name(path: &str) -> Result<(), DownloadError> {
    let invalid = |reason: &str| DownloadError::InvalidPath {
        path: path.to_string(),
        reason: reason.to_string(),
    };
    if path.is_empty() {
        return Err(invalid("file name is empty"));
    }
    for component in Path::new(path).components() {
        match component {
            Component::ParentDir => return Err(invalid("contains parent directory reference (..)")),
            Component::RootDir | Component::Prefix(_) => {
                return Err(invalid("must be relative to the repository root"));
            }
            Component::CurDir | Component::Normal(_) => {}
        }
    }
    Ok(())
}

/// Serves files registered in memory.
///
/// Files are keyed by name only, so every organisation, repository and ref
/// sees the same set. Use [`MemoryDownloader::insert_at`] to register a
/// file under one exact location instead.
#[derive(Debug, Default)]
pub struct MemoryDownloader {
    files: RwLock<HashMap<String, String>>,
}

impl MemoryDownloader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(name, contents)` pairs.
    pub fn with_files<I, K, V>(files: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let downloader = Self::new();
        for (name, contents) in files {
            downloader.insert(name, contents);
        }
        downloader
    }

    /// Register `contents` under `name` for every location.
    pub fn insert(&self, name: impl Into<String>, contents: impl Into<String>) {
        self.files
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), contents.into());
    }

    /// Register `contents` for one exact location. Exact registrations win
    /// over name-only ones.
    pub fn insert_at(
        &self,
        org: &str,
        repo: &str,
        path: &str,
        git_ref: &str,
        contents: impl Into<String>,
    ) {
        self.insert(describe_location(org, repo, path, git_ref), contents);
    }

    fn lookup(&self, org: &str, repo: &str, path: &str, git_ref: &str) -> Option<String> {
        let files = self.files.read().unwrap_or_else(PoisonError::into_inner);
        files
            .get(&describe_location(org, repo, path, git_ref))
            .or_else(|| files.get(path))
            .cloned()
    }
}

impl Downloader for MemoryDownloader {
    fn download<'a>(
        &'a self,
        org: &'a str,
        repo: &'a str,
        path: &'a str,
        git_ref: &'a str,
    ) -> BoxFuture<'a, Result<String, DownloadError>> {
        Box::pin(async move {
            self.lookup(org, repo, path, git_ref).ok_or_else(|| DownloadError::NotFound {
                location: describe_location(org, repo, path, git_ref),
            })
        })
    }
}
