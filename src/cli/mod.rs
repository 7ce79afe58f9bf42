//! Command-line interface for pacfile.
//!
//! # Commands
//!
//! - `render` - Render documents to stdout or a directory
//! - `validate` - Render documents and check that the output is JSON
//!
//! # Global Options
//!
//! - `--verbose` - Enable debug output
//! - `--quiet` - Only log errors
//! - `--config` - Configuration file (also `PACFILE_CONFIG`)
//!
//! Logging goes to stderr, rendered documents to stdout. `RUST_LOG` takes
//! precedence over the verbosity flags:
//!
//! ```bash
//! RUST_LOG=render=debug,git=trace pacfile render
//! ```

mod common;
pub mod render;
pub mod validate;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::constants::CONFIG_ENV_VAR;

/// Runtime configuration derived from the global flags.
///
/// Kept separate from [`Cli`] so tests can execute commands without
/// installing a global subscriber.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Default log filter; `None` leaves logging uninitialised.
    pub log_level: Option<String>,

    /// Explicit configuration file.
    pub config_path: Option<PathBuf>,
}

impl CliConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the global `tracing` subscriber. `RUST_LOG` wins over
    /// `log_level` when set.
    pub fn init_logging(&self) {
        let Some(level) = &self.log_level else {
            return;
        };
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            EnvFilter::new(level)
        };
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }
}

/// Render pipeline-as-code documents.
#[derive(Parser, Debug)]
#[command(
    name = "pacfile",
    about = "Render pipeline-as-code JSON templates",
    version,
    long_about = "Renders JSON pipeline documents whose {{ }} directives pull in shared modules, \
                  variables and pipeline ids."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Configuration file to use instead of ./pacfile.toml
    #[arg(long, global = true, value_name = "FILE", env = CONFIG_ENV_VAR)]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render documents to stdout or a directory
    Render(render::RenderCommand),

    /// Render documents and check that they are valid JSON
    Validate(validate::ValidateCommand),
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        config.init_logging();
        self.execute_with_config(config).await
    }

    /// Translate the global flags into a [`CliConfig`].
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "info"
        };

        CliConfig {
            log_level: Some(log_level.to_string()),
            config_path: self.config.clone(),
        }
    }

    /// Run the subcommand with an injected configuration.
    pub async fn execute_with_config(self, config: CliConfig) -> Result<()> {
        match self.command {
            Commands::Render(cmd) => cmd.execute_with_config_path(config.config_path).await,
            Commands::Validate(cmd) => cmd.execute_with_config_path(config.config_path).await,
        }
    }
}
