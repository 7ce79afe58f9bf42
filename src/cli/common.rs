//! Argument groups and helpers shared by `render` and `validate`.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use futures::future::join_all;

use crate::config::{Config, SourceKind};
use crate::core::PacError;
use crate::templating::{RenderError, Renderer, VarFrame};
use crate::utils::fs::find_documents;

/// Which documents to render and where they come from.
#[derive(Args, Debug, Clone, Default)]
pub struct DocumentArgs {
    /// Document paths relative to the repository root. Defaults to the
    /// configured document name.
    #[arg(value_name = "PATH")]
    pub paths: Vec<String>,

    /// Render every file named like the root document below the source
    #[arg(long, conflicts_with = "paths")]
    pub all: bool,

    /// Organisation owning the documents (required for git sources)
    #[arg(long)]
    pub org: Option<String>,

    /// Repository holding the documents (required for git sources)
    #[arg(long)]
    pub repo: Option<String>,

    /// Ref root documents are read from, overriding `[render] branch`
    #[arg(long)]
    pub branch: Option<String>,
}

impl DocumentArgs {
    /// Apply command-line overrides to the loaded configuration.
    pub fn apply(&self, config: &mut Config) {
        if let Some(branch) = &self.branch {
            config.render.branch.clone_from(branch);
        }
    }

    /// Organisation and repository of the documents. Local sources ignore
    /// both, so they default to empty.
    pub fn origin(&self, config: &Config) -> Result<(String, String)> {
        match (config.source.kind, &self.org, &self.repo) {
            (SourceKind::Git, Some(org), Some(repo)) => Ok((org.clone(), repo.clone())),
            (SourceKind::Git, _, _) => Err(PacError::InvalidSource {
                reason: "a git source needs --org and --repo".to_string(),
            }
            .into()),
            (SourceKind::Local, org, repo) => Ok((
                org.clone().unwrap_or_default(),
                repo.clone().unwrap_or_default(),
            )),
        }
    }

    /// Directory `--all` searches: the source root for local sources, the
    /// clone's working tree for git sources.
    fn search_root(&self, config: &Config, org: &str, repo: &str) -> PathBuf {
        match config.source.kind {
            SourceKind::Local => config.source.root.clone(),
            SourceKind::Git => config.source.root.join(org).join(repo),
        }
    }

    /// The documents to process.
    pub fn select(&self, config: &Config, org: &str, repo: &str) -> Result<Vec<String>> {
        let documents = if self.all {
            find_documents(&self.search_root(config, org, repo), &config.render.document_name)?
        } else if self.paths.is_empty() {
            vec![config.render.document_name.clone()]
        } else {
            self.paths.clone()
        };

        if documents.is_empty() {
            return Err(PacError::NoDocuments.into());
        }
        Ok(documents)
    }
}

/// Render `paths` concurrently. Each document gets its own scope stack and
/// cycle guard; results keep the order of `paths`.
pub async fn render_documents(
    renderer: &Renderer,
    org: &str,
    repo: &str,
    paths: &[String],
    frames: &[VarFrame],
) -> Vec<(String, Result<String, RenderError>)> {
    let renders = paths.iter().map(|path| async move {
        let result = renderer.parse(org, repo, path, frames.to_vec()).await;
        (path.clone(), result)
    });
    join_all(renders).await
}

/// Caller-side JSON check of a rendered document.
pub fn check_json(document: &str, rendered: &str) -> Result<(), PacError> {
    serde_json::from_str::<serde_json::Value>(rendered).map(|_| ()).map_err(|err| {
        PacError::InvalidJson {
            document: document.to_string(),
            reason: err.to_string(),
        }
    })
}
