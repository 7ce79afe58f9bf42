//! Render pipeline documents.
//!
//! # Examples
//!
//! ```bash
//! # Render ./pacfile with the local source
//! pacfile render
//!
//! # Render a service document from a git clone with extra variables
//! pacfile render --org platform --repo search deploy/pacfile \
//!     --var application=search --var waitTime=30
//!
//! # Render every document below the source root into out/
//! pacfile render --all --output out --check-json
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::common::{DocumentArgs, check_json, render_documents};
use crate::config::{Config, load_vars_file, parse_assignments};
use crate::core::PacError;
use crate::templating::{TracingDiagnostics, VarFrame};
use crate::utils::fs::atomic_write;

/// Command to render documents to stdout or a directory.
#[derive(Args, Debug)]
pub struct RenderCommand {
    #[command(flatten)]
    pub documents: DocumentArgs,

    /// Variable binding; VALUE is parsed as JSON when possible
    #[arg(long = "var", value_name = "NAME=VALUE")]
    pub vars: Vec<String>,

    /// JSON object of variables, applied below `--var`
    #[arg(long, value_name = "FILE")]
    pub vars_file: Option<PathBuf>,

    /// Write each document to DIR/<path> instead of stdout
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Fail documents whose output is not valid JSON
    #[arg(long)]
    pub check_json: bool,
}

impl RenderCommand {
    pub async fn execute_with_config_path(self, config_path: Option<PathBuf>) -> Result<()> {
        let mut config = Config::load(config_path.as_deref()).await?;
        self.documents.apply(&mut config);

        let frames = self.initial_frames().await?;
        let (org, repo) = self.documents.origin(&config)?;
        let paths = self.documents.select(&config, &org, &repo)?;
        let renderer = config.renderer(Arc::new(TracingDiagnostics))?;

        let results = render_documents(&renderer, &org, &repo, &paths, &frames).await;
        let total = results.len();
        let mut failures = Vec::new();

        for (path, result) in results {
            let checked = result.map_err(anyhow::Error::from).and_then(|rendered| {
                if self.check_json {
                    check_json(&path, &rendered)?;
                }
                Ok(rendered)
            });
            match checked {
                Ok(rendered) => self.emit(&path, &rendered, total > 1)?,
                Err(err) => {
                    if total > 1 {
                        eprintln!("{} {}: {:#}", "✗".red(), path, err);
                    }
                    failures.push(err);
                }
            }
        }

        match failures.len() {
            0 => Ok(()),
            1 if total == 1 => Err(failures.remove(0)),
            failed => Err(PacError::RenderFailures {
                failed,
                total,
            }
            .into()),
        }
    }

    /// Vars file frame first, `--var` frame on top.
    async fn initial_frames(&self) -> Result<Vec<VarFrame>> {
        let mut frames = Vec::new();
        if let Some(path) = &self.vars_file {
            frames.push(load_vars_file(path).await?);
        }
        if !self.vars.is_empty() {
            frames.push(parse_assignments(&self.vars)?);
        }
        Ok(frames)
    }

    fn emit(&self, path: &str, rendered: &str, several: bool) -> Result<()> {
        match &self.output {
            Some(dir) => {
                let target = dir.join(path);
                atomic_write(&target, rendered.as_bytes())?;
                tracing::info!("Wrote {}", target.display());
            }
            None if several => println!("// {path}\n{rendered}"),
            None => println!("{rendered}"),
        }
        Ok(())
    }
}
