//! pacfile - pipeline-as-code template rendering
//!
//! Renders JSON pipeline documents that embed `{{ }}` directives. A
//! document can splice in variables, pull shared fragments from another
//! repository with `module`/`appModule`, look up pipeline ids with
//! `pipelineID`, and branch with `if`/`else`. Rendering is recursive: each
//! module is itself a template, rendered with the caller's variables plus
//! the arguments passed to it, and circular references are rejected.
//!
//! # Modules
//!
//! - [`templating`] - The rendering engine: lexer, parser, evaluator and
//!   the [`Renderer`](templating::Renderer) that drives them
//! - [`source`] - Where document text comes from (memory, a directory, git
//!   clones)
//! - [`pipelines`] - Pipeline id lookup against the API gateway
//! - [`git`] - Async wrapper around the system `git` command
//! - [`config`] - `pacfile.toml` loading and collaborator construction
//! - [`cli`] - The `pacfile` command
//! - [`core`] - User-facing error presentation
//! - [`utils`] - File system helpers
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use pacfile_cli::source::MemoryDownloader;
//! use pacfile_cli::templating::{RenderSettings, Renderer, VarFrame};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let files = MemoryDownloader::with_files([
//!     ("pacfile", r#"{"stages": [{{ module "wait.stage.module" "waitTime" 10 }}]}"#),
//!     ("wait.stage.module", r#"{"type": "wait", "waitTime": {{ var "waitTime" ?: 5 }}}"#),
//! ]);
//! let renderer = Renderer::new(Arc::new(files), RenderSettings::default());
//! let rendered = renderer.parse("org", "app", "pacfile", Vec::<VarFrame>::new()).await?;
//! println!("{rendered}");
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod git;
pub mod pipelines;
pub mod source;
pub mod templating;
pub mod utils;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
