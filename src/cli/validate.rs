//! Validate pipeline documents.
//!
//! By default each document is fully rendered (modules fetched, directives
//! executed) and the output must parse as JSON. With `--syntax-only` only
//! the document's own directive syntax is checked, without fetching modules
//! or evaluating anything.
//!
//! ```bash
//! pacfile validate --all
//! pacfile validate deploy/pacfile --syntax-only
//! pacfile validate --all --format json
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use serde::Serialize;

use super::common::{DocumentArgs, check_json, render_documents};
use crate::config::Config;
use crate::core::PacError;
use crate::source::Downloader;
use crate::templating::{TracingDiagnostics, check_syntax};

/// Command to check that documents render to valid JSON.
#[derive(Args, Debug)]
pub struct ValidateCommand {
    #[command(flatten)]
    pub documents: DocumentArgs,

    /// Only check directive syntax; do not fetch modules or execute
    #[arg(long)]
    pub syntax_only: bool,

    /// Output format: text or json
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Colored ✓/✗ line per document
    Text,
    /// A single JSON report on stdout
    Json,
}

/// Outcome for one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentReport {
    pub path: String,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DocumentReport {
    fn valid(path: String) -> Self {
        Self {
            path,
            valid: true,
            error: None,
        }
    }

    fn invalid(path: String, error: String) -> Self {
        Self {
            path,
            valid: false,
            error: Some(error),
        }
    }
}

#[derive(Debug, Serialize)]
struct ValidationReport {
    valid: bool,
    documents: Vec<DocumentReport>,
}

impl ValidateCommand {
    pub async fn execute_with_config_path(self, config_path: Option<PathBuf>) -> Result<()> {
        let mut config = Config::load(config_path.as_deref()).await?;
        self.documents.apply(&mut config);

        let (org, repo) = self.documents.origin(&config)?;
        let paths = self.documents.select(&config, &org, &repo)?;

        let reports = if self.syntax_only {
            check_documents_syntax(&config, &org, &repo, &paths).await?
        } else {
            render_and_check(&config, &org, &repo, &paths).await?
        };

        let total = reports.len();
        let failed = reports.iter().filter(|r| !r.valid).count();
        self.print(reports)?;

        if failed > 0 {
            return Err(PacError::RenderFailures {
                failed,
                total,
            }
            .into());
        }
        Ok(())
    }

    fn print(&self, documents: Vec<DocumentReport>) -> Result<()> {
        match self.format {
            OutputFormat::Json => {
                let report = ValidationReport {
                    valid: documents.iter().all(|d| d.valid),
                    documents,
                };
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            OutputFormat::Text => {
                for document in &documents {
                    match &document.error {
                        None => println!("{} {}", "✓".green(), document.path),
                        Some(error) => println!("{} {}: {}", "✗".red(), document.path, error),
                    }
                }
            }
        }
        Ok(())
    }
}

async fn render_and_check(
    config: &Config,
    org: &str,
    repo: &str,
    paths: &[String],
) -> Result<Vec<DocumentReport>> {
    let renderer = config.renderer(Arc::new(TracingDiagnostics))?;
    let results = render_documents(&renderer, org, repo, paths, &[]).await;
    Ok(results
        .into_iter()
        .map(|(path, result)| match result {
            Ok(rendered) => match check_json(&path, &rendered) {
                Ok(()) => DocumentReport::valid(path),
                Err(err) => DocumentReport::invalid(path, err.to_string()),
            },
            Err(err) => DocumentReport::invalid(path, err.to_string()),
        })
        .collect())
}

async fn check_documents_syntax(
    config: &Config,
    org: &str,
    repo: &str,
    paths: &[String],
) -> Result<Vec<DocumentReport>> {
    let downloader = config.downloader()?;
    let branch = &config.render.branch;
    let mut reports = Vec::with_capacity(paths.len());
    for path in paths {
        let report = match downloader.download(org, repo, path, branch).await {
            Ok(source) => match check_syntax(&source) {
                Ok(()) => DocumentReport::valid(path.clone()),
                Err((line, message)) => {
                    DocumentReport::invalid(path.clone(), format!("line {line}: {message}"))
                }
            },
            Err(err) => DocumentReport::invalid(path.clone(), err.to_string()),
        };
        reports.push(report);
    }
    Ok(reports)
}
