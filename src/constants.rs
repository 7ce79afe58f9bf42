//! Constants shared by the renderer, the downloaders and the CLI.
//!
//! Timeouts, retry parameters and the default names used when no
//! configuration file overrides them.

use std::time::Duration;

/// Branch documents are fetched from when nothing else is configured.
pub const DEFAULT_BRANCH: &str = "master";

/// File name of the root document inside a repository.
pub const DEFAULT_DOCUMENT_NAME: &str = "pacfile";

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "pacfile.toml";

/// Environment variable pointing at an explicit configuration file.
pub const CONFIG_ENV_VAR: &str = "PACFILE_CONFIG";

/// Placeholder default that resolves to the `application` variable.
pub const APPLICATION_REF: &str = "@application";

/// Variable consulted when [`APPLICATION_REF`] is used as a default.
pub const APPLICATION_VAR: &str = "application";

/// Top-level member of a root document holding global variables.
pub const GLOBALS_KEY: &str = "globals";

/// Timeout for a single `git show` invocation (30 seconds).
pub const GIT_SHOW_TIMEOUT: Duration = Duration::from_secs(30);

/// Default timeout for pipeline lookups against the API gateway.
pub const DEFAULT_GATE_TIMEOUT_SECS: u64 = 10;

/// Starting delay for exponential backoff (10ms).
///
/// Doubles on each retry attempt.
pub const STARTING_BACKOFF_DELAY_MS: u64 = 10;

/// Maximum backoff delay for exponential backoff (500ms).
pub const MAX_BACKOFF_DELAY_MS: u64 = 500;

/// Number of attempts made for a pipeline lookup before giving up.
pub const GATE_LOOKUP_ATTEMPTS: usize = 3;
