//! Thin async wrapper around the `git` executable.
//!
//! Documents are read straight out of local clones with `git show`, so no
//! worktree has to be checked out to render a branch other than the one on
//! disk. [`GitCommand`] runs git with `-C <dir>`, captures its output and
//! enforces a timeout.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tokio::process::Command;
use tokio::time::timeout;

use crate::constants::GIT_SHOW_TIMEOUT;

/// Failure to run a git command.
#[derive(Debug, Error)]
pub enum GitError {
    #[error("Failed to execute git {args}: {source}")]
    Spawn {
        args: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Git command timed out after {secs} seconds: git {args}")]
    Timeout {
        args: String,
        secs: u64,
    },

    #[error("Git operation '{operation}' failed: {stderr}")]
    Failed {
        operation: String,
        stderr: String,
    },

    #[error("Output of git {args} is not valid UTF-8: {source}")]
    InvalidUtf8 {
        args: String,
        #[source]
        source: std::string::FromUtf8Error,
    },

    #[error("Invalid git ref '{git_ref}': {reason}")]
    InvalidRef {
        git_ref: String,
        reason: String,
    },
}

/// Builder for a single git invocation.
///
/// ```rust,no_run
/// use pacfile_cli::git::GitCommand;
///
/// # async fn example() -> Result<(), pacfile_cli::git::GitError> {
/// let contents = GitCommand::show("master", "pacfile")?
///     .current_dir("/srv/repos/org/service")
///     .execute()
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct GitCommand {
    args: Vec<String>,
    current_dir: Option<PathBuf>,
    timeout_duration: Duration,
    context: Option<String>,
}

impl Default for GitCommand {
    fn default() -> Self {
        Self {
            args: Vec::new(),
            current_dir: None,
            timeout_duration: GIT_SHOW_TIMEOUT,
            context: None,
        }
    }
}

impl GitCommand {
    pub fn new() -> Self {
        Self::default()
    }

    /// `git show <ref>:<path>`, printing a file as of `git_ref`.
    ///
    /// The ref leads the argument, so it must not look like an option.
    pub fn show(git_ref: &str, path: &str) -> Result<Self, GitError> {
        let invalid = |reason: &str| GitError::InvalidRef {
            git_ref: git_ref.to_string(),
            reason: reason.to_string(),
        };
        if git_ref.is_empty() {
            return Err(invalid("ref is empty"));
        }
        if git_ref.starts_with('-') {
            return Err(invalid("ref must not start with '-'"));
        }
        Ok(Self::new().arg("show").arg(format!("{git_ref}:{path}")))
    }

    /// Run git against the repository at `dir` (passed as `-C dir`).
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Label included in debug logs, e.g. the document being fetched.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Run the command and return its stdout untrimmed, failing on a
    /// non-zero exit status or output that is not UTF-8.
    pub async fn execute(self) -> Result<String, GitError> {
        let mut full_args = Vec::new();
        if let Some(ref dir) = self.current_dir {
            full_args.push("-C".to_string());
            full_args.push(dir.display().to_string());
        }
        full_args.extend(self.args.iter().cloned());
        let joined = full_args.join(" ");

        match self.context {
            Some(ref ctx) => tracing::debug!(target: "git", "({}) Executing command: git {}", ctx, joined),
            None => tracing::debug!(target: "git", "Executing command: git {}", joined),
        }

        let mut cmd = Command::new("git");
        cmd.args(&full_args).stdout(Stdio::piped()).stderr(Stdio::piped()).kill_on_drop(true);

        let duration = self.timeout_duration;
        let output = match timeout(duration, cmd.output()).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    target: "git",
                    "Command timed out after {} seconds: git {}",
                    duration.as_secs(),
                    joined
                );
                return Err(GitError::Timeout {
                    args: joined,
                    secs: duration.as_secs(),
                });
            }
        }
        .map_err(|source| GitError::Spawn {
            args: joined.clone(),
            source,
        })?;

        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            tracing::debug!(
                target: "git",
                "Command failed with exit code: {:?}",
                output.status.code()
            );
            if !stderr.is_empty() {
                tracing::debug!(target: "git", "Error: {}", stderr.trim());
            }
            return Err(GitError::Failed {
                operation: self.args.first().cloned().unwrap_or_else(|| "unknown".to_string()),
                stderr,
            });
        }

        if !stderr.is_empty() {
            tracing::debug!(target: "git", "Stderr: {}", stderr.trim());
        }

        String::from_utf8(output.stdout).map_err(|source| GitError::InvalidUtf8 {
            args: joined,
            source,
        })
    }
}

/// Whether a `git` executable can be run.
pub fn is_installed() -> bool {
    std::process::Command::new("git")
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok_and(|status| status.success())
}
