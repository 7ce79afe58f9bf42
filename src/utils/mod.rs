//! Utility modules shared by the CLI commands.

pub mod fs;
