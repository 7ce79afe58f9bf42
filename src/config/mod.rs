//! Configuration for pacfile-cli.
//!
//! Settings live in a TOML file with three optional sections:
//!
//! ```toml
//! [render]
//! branch = "master"            # ref the root document is read from
//! document_name = "pacfile"    # root document file name
//! template_org = "platform"    # where shared modules live
//! template_repo = "modules"
//! template_branch = "stable"
//!
//! [source]
//! kind = "git"                 # "local" or "git"
//! root = "/srv/repos"          # relative paths are resolved against this file
//!
//! [pipelines]
//! gate_url = "http://gate:8084"
//! timeout_secs = 10
//! ```
//!
//! # Lookup order
//!
//! 1. The file named by `--config` (or the `PACFILE_CONFIG` environment
//!    variable); it must exist.
//! 2. `pacfile.toml` in the working directory, if present.
//! 3. Built-in defaults: local source rooted at the working directory, no
//!    pipeline service.

mod vars;

pub use vars::{load_vars_file, parse_assignment, parse_assignments};

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::constants::{CONFIG_FILE_NAME, DEFAULT_GATE_TIMEOUT_SECS};
use crate::core::PacError;
use crate::pipelines::{GateClient, NoPipelines, PipelineLookup};
use crate::source::{Downloader, GitDownloader, LocalDownloader};
use crate::templating::{Diagnostics, RenderSettings, Renderer};

/// Parse a TOML file into any deserializable type, naming the file in
/// errors.
pub async fn parse_config<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    toml::from_str(&content).map_err(|err| {
        PacError::ConfigParseError {
            file: path.display().to_string(),
            reason: err.to_string(),
        }
        .into()
    })
}

/// Complete configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub render: RenderSettings,
    pub source: SourceConfig,
    pub pipelines: PipelineConfig,
}

/// Which [`Downloader`] serves documents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Files under `root`, ignoring organisation, repository and ref.
    #[default]
    Local,
    /// Clones under `root/<org>/<repo>`, read with `git show`.
    Git,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceConfig {
    pub kind: SourceKind,
    pub root: PathBuf,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::Local,
            root: PathBuf::from("."),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Base URL of the API gateway. Without it `pipelineID` resolves to an
    /// empty string.
    pub gate_url: Option<String>,
    pub timeout_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            gate_url: None,
            timeout_secs: DEFAULT_GATE_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// Load configuration following the lookup order.
    pub async fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            if !path.is_file() {
                return Err(PacError::ConfigNotFound {
                    path: path.display().to_string(),
                }
                .into());
            }
            return Self::load_from(path).await;
        }

        let local = Path::new(CONFIG_FILE_NAME);
        if local.is_file() {
            return Self::load_from(local).await;
        }

        tracing::debug!("No {} found, using defaults", CONFIG_FILE_NAME);
        Ok(Self::default())
    }

    /// Load from `path`. A relative source root is resolved against the
    /// file's directory.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let mut config: Self = parse_config(path).await?;
        if config.source.root.is_relative() {
            if let Some(dir) = path.parent() {
                config.source.root = dir.join(&config.source.root);
            }
        }
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Build the configured downloader. A git source also needs a `git`
    /// executable on the PATH.
    pub fn downloader(&self) -> Result<Arc<dyn Downloader>> {
        let root = &self.source.root;
        if !root.is_dir() {
            return Err(PacError::InvalidSource {
                reason: format!("source root {} is not a directory", root.display()),
            }
            .into());
        }
        Ok(match self.source.kind {
            SourceKind::Local => Arc::new(LocalDownloader::new(root)),
            SourceKind::Git => {
                if !crate::git::is_installed() {
                    return Err(PacError::GitNotFound.into());
                }
                Arc::new(GitDownloader::new(root))
            }
        })
    }

    /// Build the configured pipeline lookup.
    pub fn pipeline_lookup(&self) -> Result<Arc<dyn PipelineLookup>> {
        match &self.pipelines.gate_url {
            Some(url) => {
                let client =
                    GateClient::new(url.clone(), Duration::from_secs(self.pipelines.timeout_secs))
                        .context("Failed to build HTTP client for the pipeline service")?;
                Ok(Arc::new(client))
            }
            None => Ok(Arc::new(NoPipelines)),
        }
    }

    /// Build a renderer reporting to `diagnostics`.
    pub fn renderer(&self, diagnostics: Arc<dyn Diagnostics>) -> Result<Renderer> {
        Ok(Renderer::new(self.downloader()?, self.render.clone())
            .with_pipelines(self.pipeline_lookup()?)
            .with_diagnostics(diagnostics))
    }
}
