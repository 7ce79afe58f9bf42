//! Errors that abort a render.
//!
//! Each variant names the document it was raised for. An error raised while
//! rendering a module propagates to the caller unchanged, so the path always
//! points at the fragment that actually failed.

use thiserror::Error;

use crate::source::DownloadError;

use super::scope::CycleError;

/// A render failure.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The document or one of its modules could not be fetched.
    #[error("Failed to download '{path}': {source}")]
    Download {
        path: String,
        #[source]
        source: DownloadError,
    },

    /// The directive lexer rejected the document.
    #[error("Failed to preprocess '{path}' at line {line}: {message}")]
    Preprocess {
        path: String,
        line: usize,
        message: String,
    },

    /// The root document is not a keyed object, or its globals are malformed.
    #[error("Failed to parse global vars in '{path}': {reason}")]
    GlobalVarsParse {
        path: String,
        reason: String,
    },

    /// The root document declares globals that are not a keyed object.
    #[error("Could not extract global vars from '{path}': {reason}")]
    GlobalVarsExtract {
        path: String,
        reason: String,
    },

    /// The directive stream is malformed or calls an unknown function.
    #[error("Failed to parse template '{path}' at line {line}: {message}")]
    Parse {
        path: String,
        line: usize,
        message: String,
    },

    /// A directive failed while the template was executing.
    #[error("Failed to execute '{path}' at line {line}: {message}")]
    Execution {
        path: String,
        line: usize,
        message: String,
    },

    /// A module transitively includes itself.
    #[error("Circular module reference detected: {}", chain.join(" -> "))]
    CycleDetected {
        name: String,
        chain: Vec<String>,
    },
}

impl RenderError {
    /// Document the error was raised for, if it belongs to one.
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::Download {
                path,
                ..
            }
            | Self::Preprocess {
                path,
                ..
            }
            | Self::GlobalVarsParse {
                path,
                ..
            }
            | Self::GlobalVarsExtract {
                path,
                ..
            }
            | Self::Parse {
                path,
                ..
            }
            | Self::Execution {
                path,
                ..
            } => Some(path),
            Self::CycleDetected {
                ..
            } => None,
        }
    }

    /// Whether the failure is a missing document or module.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::Download {
                source: DownloadError::NotFound { .. },
                ..
            }
        )
    }
}

impl From<CycleError> for RenderError {
    fn from(err: CycleError) -> Self {
        Self::CycleDetected {
            name: err.name,
            chain: err.chain,
        }
    }
}
