//! Error handling for pacfile-cli
//!
//! Library code returns precise error types ([`RenderError`],
//! [`DownloadError`], [`PacError`]); the CLI carries them through
//! [`anyhow::Error`] and converts the failure into an [`ErrorContext`] just
//! before printing it. The context adds a short explanation and a concrete
//! next step to the raw message.
//!
//! ```rust,no_run
//! use pacfile_cli::core::{PacError, user_friendly_error};
//!
//! let err = anyhow::Error::new(PacError::NoDocuments);
//! user_friendly_error(err).display();
//! ```

use std::fmt;

use colored::Colorize;
use thiserror::Error;

use crate::source::DownloadError;
use crate::templating::RenderError;

/// Errors raised by the CLI layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PacError {
    /// An explicitly requested configuration file does not exist.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        path: String,
    },

    /// A configuration file exists but is not valid.
    #[error("Invalid configuration in {file}: {reason}")]
    ConfigParseError {
        file: String,
        reason: String,
    },

    /// A `--var` argument or vars file is malformed.
    #[error("Invalid variable '{input}': {reason}")]
    InvalidVariable {
        input: String,
        reason: String,
    },

    /// The configured source cannot be used.
    #[error("Invalid source configuration: {reason}")]
    InvalidSource {
        reason: String,
    },

    /// A rendered document is not valid JSON and `--check-json` was given.
    #[error("Rendered {document} is not valid JSON: {reason}")]
    InvalidJson {
        document: String,
        reason: String,
    },

    /// One or more documents failed to render.
    #[error("{failed} of {total} documents failed to render")]
    RenderFailures {
        failed: usize,
        total: usize,
    },

    /// Nothing was selected for rendering.
    #[error("No documents to render")]
    NoDocuments,

    /// Git is required by the configured source but not installed.
    #[error("Git is not installed or not found in PATH")]
    GitNotFound,

    #[error("{message}")]
    Other {
        message: String,
    },
}

/// An error plus the hints shown to the user.
#[derive(Debug)]
pub struct ErrorContext {
    pub error: PacError,
    pub suggestion: Option<String>,
    pub details: Option<String>,
}

impl ErrorContext {
    #[must_use]
    pub const fn new(error: PacError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add an actionable next step, shown in green.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add background on the failure, shown in yellow.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error, details and suggestion to stderr with colors.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into a user-facing [`ErrorContext`].
///
/// Walks the error chain looking for a known error type; the first match
/// decides the hints. Unknown errors keep their message and get no hints.
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    for cause in error.chain() {
        if let Some(pac_error) = cause.downcast_ref::<PacError>() {
            return pac_error_context(pac_error.clone());
        }
        if let Some(render_error) = cause.downcast_ref::<RenderError>() {
            return render_error_context(render_error);
        }
        if let Some(download_error) = cause.downcast_ref::<DownloadError>() {
            return download_error_context(download_error);
        }
        if let Some(toml_error) = cause.downcast_ref::<toml::de::Error>() {
            return ErrorContext::new(PacError::ConfigParseError {
                file: crate::constants::CONFIG_FILE_NAME.to_string(),
                reason: toml_error.to_string(),
            })
            .with_suggestion("Check the TOML syntax of the configuration file");
        }
        if let Some(io_error) = cause.downcast_ref::<std::io::Error>() {
            if io_error.kind() == std::io::ErrorKind::PermissionDenied {
                return ErrorContext::new(PacError::Other {
                    message: format!("{error:#}"),
                })
                .with_suggestion("Check the permissions of the files and directories involved");
            }
        }
    }

    ErrorContext::new(PacError::Other {
        message: format!("{error:#}"),
    })
}

fn pac_error_context(error: PacError) -> ErrorContext {
    match &error {
        PacError::ConfigNotFound {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Pass an existing file with --config or unset PACFILE_CONFIG"),
        PacError::ConfigParseError {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Valid sections are [render], [source] and [pipelines]"),
        PacError::InvalidVariable {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Use --var NAME=VALUE; VALUE is parsed as JSON when possible")
            .with_details("A vars file must contain a single JSON object"),
        PacError::InvalidSource {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Set [source] kind to \"local\" or \"git\" and root to an existing directory"),
        PacError::InvalidJson {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Render without --check-json to inspect the output")
            .with_details("Directives expand to raw text, so a missing comma or quote in a module shows up here"),
        PacError::RenderFailures {
            ..
        } => ErrorContext::new(error).with_suggestion("See the errors above for each failing document"),
        PacError::NoDocuments => ErrorContext::new(error)
            .with_suggestion("Pass document paths or use --all to render every document below the source root"),
        PacError::GitNotFound => ErrorContext::new(error)
            .with_suggestion("Install git from https://git-scm.com/ or use a local source")
            .with_details("The git source reads documents with 'git show'"),
        PacError::Other {
            ..
        } => ErrorContext::new(error),
    }
}

fn render_error_context(error: &RenderError) -> ErrorContext {
    let context = ErrorContext::new(PacError::Other {
        message: error.to_string(),
    });
    match error {
        RenderError::Download {
            source,
            ..
        } => download_error_context(source).with_details(error.to_string()),
        RenderError::Preprocess {
            ..
        } => context.with_suggestion("Check the braces and quotes of the directive on that line"),
        RenderError::GlobalVarsParse {
            ..
        } => context
            .with_suggestion("Make the document a JSON object and keep \"globals\" free of directives"),
        RenderError::GlobalVarsExtract {
            ..
        } => context.with_suggestion("\"globals\" must be an object mapping variable names to values"),
        RenderError::Parse {
            ..
        } => context.with_suggestion(
            "Check directive names and that every {{ if }} has a matching {{ end }}",
        ),
        RenderError::Execution {
            ..
        } => context.with_suggestion("Check the number and types of the directive's arguments"),
        RenderError::CycleDetected {
            ..
        } => context.with_suggestion("Remove the module reference that closes the loop"),
    }
}

fn download_error_context(error: &DownloadError) -> ErrorContext {
    let context = ErrorContext::new(PacError::Other {
        message: error.to_string(),
    });
    match error {
        DownloadError::NotFound {
            ..
        } => context
            .with_suggestion("Check the module name and that the file exists on the configured branch"),
        DownloadError::InvalidPath {
            ..
        } => context.with_suggestion("Module names must be relative paths inside the repository"),
        DownloadError::Transport {
            ..
        } => context.with_suggestion("Check that the source is reachable and readable"),
    }
}
