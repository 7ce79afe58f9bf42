//! Core types shared by the CLI: the top-level error enum and the
//! user-facing error presentation.

pub mod error;

pub use error::{ErrorContext, PacError, user_friendly_error};
