//! Entry point for rendering a document.
//!
//! [`Renderer::parse`] downloads the root document, extracts its globals,
//! and executes its directives. Every `module` and `appModule` directive
//! recursively renders another fragment through the same pipeline with a
//! pushed scope. The result is the fully expanded document text.
//!
//! # Pipeline
//!
//! 1. **Download** the document through the [`Downloader`].
//! 2. **Preprocess**: lex actions and normalise shorthands.
//! 3. **Globals** (root only): read the `globals` member and install it as
//!    the outermost scope frame.
//! 4. **Parse**: build the directive tree and reject unknown functions.
//! 5. **Execute**: evaluate directives and splice their results.
//!
//! A failure in any step aborts the render with a [`RenderError`] and is
//! also reported to the [`Diagnostics`] sink. Errors raised inside a module
//! propagate to the root unchanged.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use pacfile_cli::source::MemoryDownloader;
//! use pacfile_cli::templating::{RenderSettings, Renderer, VarFrame};
//!
//! # async fn example() -> Result<(), pacfile_cli::templating::RenderError> {
//! let downloader = MemoryDownloader::with_files([
//!     ("pacfile", r#"{"stages": [{{ module "wait" "waitTime" 30 }}]}"#),
//!     ("wait", r#"{"type": "wait", "waitTime": {{ var "waitTime" ?: 10 }}}"#),
//! ]);
//! let renderer = Renderer::new(Arc::new(downloader), RenderSettings::default());
//! let text = renderer.parse("org", "service", "pacfile", vec![VarFrame::new()]).await?;
//! assert_eq!(text, r#"{"stages": [{"type": "wait", "waitTime": 30}]}"#);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_BRANCH, DEFAULT_DOCUMENT_NAME};
use crate::pipelines::{NoPipelines, PipelineLookup};
use crate::source::Downloader;

use super::diagnostics::{Diagnostics, TracingDiagnostics};
use super::directives::DirectiveSet;
use super::error::RenderError;
use super::globals::{GlobalsError, extract_globals};
use super::parser::parse;
use super::preprocess::{Chunk, preprocess};
use super::scope::{CycleGuard, ScopeStack, VarFrame};

/// Where documents and modules are fetched from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderSettings {
    /// Ref the root document is read from, and modules too unless
    /// `template_branch` is set.
    pub branch: String,
    /// File name of the root document in a repository.
    pub document_name: String,
    /// Organisation holding shared modules. Defaults to the caller's.
    pub template_org: Option<String>,
    /// Repository holding shared modules. Defaults to the caller's.
    pub template_repo: Option<String>,
    /// Ref modules are read from.
    pub template_branch: Option<String>,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            branch: DEFAULT_BRANCH.to_string(),
            document_name: DEFAULT_DOCUMENT_NAME.to_string(),
            template_org: None,
            template_repo: None,
            template_branch: None,
        }
    }
}

/// A document to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentLocation {
    pub org: String,
    pub repo: String,
    pub path: String,
    pub git_ref: String,
}

/// Renders documents fetched through a [`Downloader`].
///
/// Cheap to share: clone the `Arc`s or wrap the renderer itself in one to
/// run several renders concurrently.
pub struct Renderer {
    downloader: Arc<dyn Downloader>,
    pipelines: Arc<dyn PipelineLookup>,
    diagnostics: Arc<dyn Diagnostics>,
    settings: RenderSettings,
}

impl Renderer {
    /// Create a renderer that logs through `tracing` and has no pipeline
    /// service.
    pub fn new(downloader: Arc<dyn Downloader>, settings: RenderSettings) -> Self {
        Self {
            downloader,
            pipelines: Arc::new(NoPipelines),
            diagnostics: Arc::new(TracingDiagnostics),
            settings,
        }
    }

    /// Use `pipelines` to resolve `pipelineID` directives.
    #[must_use]
    pub fn with_pipelines(mut self, pipelines: Arc<dyn PipelineLookup>) -> Self {
        self.pipelines = pipelines;
        self
    }

    /// Report non-fatal conditions to `diagnostics`.
    #[must_use]
    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn Diagnostics>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub(crate) fn diagnostics(&self) -> &dyn Diagnostics {
        self.diagnostics.as_ref()
    }

    pub(crate) fn pipelines(&self) -> &dyn PipelineLookup {
        self.pipelines.as_ref()
    }

    /// Render the document `name` from `org`/`repo` at the configured branch.
    ///
    /// `initial_vars` are pushed above the document's globals, first frame
    /// outermost, so caller-supplied values override globals.
    pub async fn parse(
        &self,
        org: &str,
        repo: &str,
        name: &str,
        initial_vars: Vec<VarFrame>,
    ) -> Result<String, RenderError> {
        let location = DocumentLocation {
            org: org.to_string(),
            repo: repo.to_string(),
            path: name.to_string(),
            git_ref: self.settings.branch.clone(),
        };
        tracing::debug!(
            target: "render",
            "Rendering {}/{}/{}@{}",
            location.org,
            location.repo,
            location.path,
            location.git_ref
        );
        self.render(location, Scope::Root(initial_vars), CycleGuard::new()).await
    }

    /// Where a module named `name` is fetched from when called from `caller`.
    pub(crate) fn fragment_location(&self, caller: &DocumentLocation, name: &str) -> DocumentLocation {
        DocumentLocation {
            org: self.settings.template_org.clone().unwrap_or_else(|| caller.org.clone()),
            repo: self.settings.template_repo.clone().unwrap_or_else(|| caller.repo.clone()),
            path: name.to_string(),
            git_ref: self
                .settings
                .template_branch
                .clone()
                .unwrap_or_else(|| self.settings.branch.clone()),
        }
    }

    /// Render a module with an already-built scope.
    pub(crate) fn render_fragment<'a>(
        &'a self,
        location: DocumentLocation,
        scope: ScopeStack,
        guard: CycleGuard,
    ) -> BoxFuture<'a, Result<String, RenderError>> {
        self.render(location, Scope::Fragment(scope), guard)
    }

    fn render<'a>(
        &'a self,
        location: DocumentLocation,
        scope: Scope,
        guard: CycleGuard,
    ) -> BoxFuture<'a, Result<String, RenderError>> {
        Box::pin(async move {
            let path = location.path.clone();
            let diagnostics = self.diagnostics();

            let raw = self
                .downloader
                .download(&location.org, &location.repo, &location.path, &location.git_ref)
                .await
                .map_err(|source| {
                    diagnostics.error(&format!("Failed to download {path}: {source}"));
                    RenderError::Download {
                        path: path.clone(),
                        source,
                    }
                })?;

            let chunks = preprocess(&raw).map_err(|err| {
                diagnostics.error(&format!("Failed to preprocess {path}: {err}"));
                RenderError::Preprocess {
                    path: path.clone(),
                    line: err.line,
                    message: err.message,
                }
            })?;

            let scope = match scope {
                Scope::Root(initial_vars) => self.root_scope(&path, &chunks, initial_vars)?,
                Scope::Fragment(scope) => scope,
            };

            let template = parse(chunks).map_err(|err| {
                diagnostics.error(&format!("Failed to parse template {path}: {err}"));
                RenderError::Parse {
                    path: path.clone(),
                    line: err.line,
                    message: err.message,
                }
            })?;

            let directives = DirectiveSet::new(self, &location, scope, guard);
            directives.execute(&template).await.inspect_err(|err| {
                // Module failures were already reported by the module's own render.
                if matches!(err, RenderError::Execution { path: failed, .. } if *failed == path) {
                    diagnostics.error(&format!("Failed to execute buffer {path}: {err}"));
                }
            })
        })
    }

    /// Globals first, then the caller's frames.
    fn root_scope(
        &self,
        path: &str,
        chunks: &[Chunk],
        initial_vars: Vec<VarFrame>,
    ) -> Result<ScopeStack, RenderError> {
        let diagnostics = self.diagnostics();
        let globals = match extract_globals(chunks) {
            Ok(Some(globals)) => {
                tracing::debug!(target: "render", "Found {} global vars in {}", globals.len(), path);
                Some(globals)
            }
            Ok(None) => {
                diagnostics.info(&format!("No global vars found in document {path}"));
                None
            }
            Err(GlobalsError::Parse(reason)) => {
                diagnostics.error(&format!("Failed to parse global vars in {path}: {reason}"));
                return Err(RenderError::GlobalVarsParse {
                    path: path.to_string(),
                    reason,
                });
            }
            Err(GlobalsError::NotAnObject(reason)) => {
                diagnostics.error(&format!("Could not extract global vars from {path}: {reason}"));
                return Err(RenderError::GlobalVarsExtract {
                    path: path.to_string(),
                    reason,
                });
            }
        };
        Ok(ScopeStack::from_frames(globals.into_iter().chain(initial_vars)))
    }
}

/// Scope a render starts from.
enum Scope {
    /// Root document: globals are read from the document and installed
    /// beneath these frames.
    Root(Vec<VarFrame>),
    /// Module: the caller's scope with the module's parameters pushed.
    Fragment(ScopeStack),
}
