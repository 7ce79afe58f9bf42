//! Integration test suite for pacfile-cli
//!
//! End-to-end tests of the renderer and the `pacfile` binary.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! RUST_LOG=render=debug cargo test --test integration -- --nocapture
//! ```
//!
//! # Test Organization
//!
//! - **variables**: defaults, globals, caller frames and conditionals
//! - **modules**: `module` and `appModule` expansion
//! - **failures**: errors that abort a render, including module cycles
//! - **pipelines**: `pipelineID` against fixed tables and an HTTP gateway
//! - **git_source**: documents read out of local git clones (skipped without git)
//! - **cli**: the `render` and `validate` commands
//!
//! Documents shared between tests live in `fixtures`.

mod cli;
mod fixtures;
mod git_source;
mod modules;
mod pipelines;
