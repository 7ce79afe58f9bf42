//! Test utilities for pacfile-cli
//!
//! Helpers shared by unit tests and the integration suite:
//!
//! - [`init_test_logging`] wires `tracing` into the test harness;
//! - [`RecordingDiagnostics`] captures the non-fatal messages of a render so
//!   tests can assert on them;
//! - [`TestRepo`] builds a real git clone in the `<root>/<org>/<repo>`
//!   layout read by [`GitDownloader`](crate::source::GitDownloader).

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{Mutex, Once, PoisonError};

use anyhow::{Context, Result, bail};
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::templating::{Diagnostics, Severity};

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Uses `level` when given, otherwise `RUST_LOG`. With neither, logging
/// stays off. Safe to call from every test.
///
/// ```bash
/// RUST_LOG=render=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}

/// Diagnostics sink that keeps every message in memory.
#[derive(Debug, Default)]
pub struct RecordingDiagnostics {
    entries: Mutex<Vec<(Severity, String)>>,
}

impl RecordingDiagnostics {
    /// Every message in the order it was reported.
    pub fn entries(&self) -> Vec<(Severity, String)> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn messages(&self, severity: Severity) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|(s, _)| *s == severity)
            .map(|(_, message)| message)
            .collect()
    }

    pub fn infos(&self) -> Vec<String> {
        self.messages(Severity::Info)
    }

    pub fn warnings(&self) -> Vec<String> {
        self.messages(Severity::Warn)
    }

    pub fn errors(&self) -> Vec<String> {
        self.messages(Severity::Error)
    }

    /// Whether any message of `severity` starts with `prefix`.
    pub fn has(&self, severity: Severity, prefix: &str) -> bool {
        self.messages(severity).iter().any(|m| m.starts_with(prefix))
    }
}

impl Diagnostics for RecordingDiagnostics {
    fn report(&self, severity: Severity, message: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((severity, message.to_string()));
    }
}

/// A git repository under `<root>/<org>/<repo>` for downloader tests.
pub struct TestRepo {
    repo_path: PathBuf,
}

impl TestRepo {
    /// Whether a `git` executable is available.
    pub fn git_available() -> bool {
        crate::git::is_installed()
    }

    /// Initialise an empty repository on branch `master`.
    pub fn init(root: &Path, org: &str, repo: &str) -> Result<Self> {
        let repo_path = root.join(org).join(repo);
        std::fs::create_dir_all(&repo_path)
            .with_context(|| format!("Failed to create {}", repo_path.display()))?;
        let test_repo = Self {
            repo_path,
        };
        test_repo.git(&["init"], "Failed to initialize git repository")?;
        test_repo.git(&["symbolic-ref", "HEAD", "refs/heads/master"], "Failed to name branch")?;
        test_repo.git(&["config", "user.email", "test@pacfile.example"], "Failed to set user email")?;
        test_repo.git(&["config", "user.name", "Test User"], "Failed to set user name")?;
        test_repo.git(&["config", "commit.gpgsign", "false"], "Failed to disable signing")?;
        Ok(test_repo)
    }

    pub fn path(&self) -> &Path {
        &self.repo_path
    }

    /// Write `files` and commit them on the current branch.
    pub fn commit_files<C: AsRef<[u8]>>(&self, files: &[(&str, C)], message: &str) -> Result<()> {
        for (name, contents) in files {
            let path = self.repo_path.join(name);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, contents.as_ref())
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }
        self.git(&["add", "."], "Failed to add files to git")?;
        self.git(&["commit", "-m", message], "Failed to create git commit")?;
        Ok(())
    }

    /// Create and switch to `branch`.
    pub fn create_branch(&self, branch: &str) -> Result<()> {
        self.git(&["checkout", "-b", branch], &format!("Failed to create branch: {branch}"))
    }

    pub fn checkout(&self, git_ref: &str) -> Result<()> {
        self.git(&["checkout", git_ref], &format!("Failed to checkout: {git_ref}"))
    }

    fn git(&self, args: &[&str], action: &str) -> Result<()> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.repo_path)
            .output()
            .with_context(|| action.to_string())?;
        if !output.status.success() {
            bail!("{} failed: {}", action, String::from_utf8_lossy(&output.stderr));
        }
        Ok(())
    }
}
