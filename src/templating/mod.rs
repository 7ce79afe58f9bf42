//! Directive engine for pipeline-as-code documents.
//!
//! A document is JSON text with embedded `{{ ... }}` actions. Rendering
//! expands every action and returns the resulting text, which is expected
//! (but not required) to be valid JSON.
//!
//! # Directives
//!
//! - `{{ var "name" ?: default }}`: the innermost binding of `name`, or the
//!   default. Strings are spliced verbatim; numbers, booleans, lists and
//!   maps as JSON. A default of `"@application"` means the `application`
//!   variable.
//! - `{{ module "name" "key" value ... }}`: the rendered text of another
//!   fragment, with the key/value pairs bound in a new innermost scope.
//! - `{{ appModule "name" ... }}`: like `module`, but splices the members of
//!   the fragment's top-level object without the enclosing braces.
//! - `{{ pipelineID "app" "pipeline" }}`: the id of a pipeline, or an empty
//!   string when it cannot be resolved.
//!
//! Conditionals use `{{ if cond }}`, `{{ else if cond }}`, `{{ else }}` and
//! `{{ end }}` with the builtins `not`, `and`, `or`, `eq`, `ne`, `lt`, `le`,
//! `gt` and `ge`. Subexpressions are parenthesised.
//!
//! # Globals
//!
//! A root document may declare a top-level `"globals"` object. Its members
//! form the outermost scope frame for the whole render, below any frames the
//! caller supplies.
//!
//! # Scoping
//!
//! Module arguments shadow outer bindings for the module and everything it
//! includes, and are gone once the module returns. A module that includes
//! itself, directly or transitively, fails the render.

mod ast;
mod builtins;
mod diagnostics;
mod directives;
mod error;
mod evaluator;
mod globals;
mod marshal;
mod parser;
mod preprocess;
mod renderer;
mod scope;
mod value;

pub use diagnostics::{Diagnostics, Severity, TracingDiagnostics};
pub use error::RenderError;
pub use marshal::{MarshalError, render_value};
pub use preprocess::PreprocessError;
pub use renderer::{DocumentLocation, RenderSettings, Renderer};
pub use scope::{CycleError, CycleGuard, ScopeStack, VarFrame};
pub use value::Value;

/// Check that `source` lexes and parses without fetching or executing
/// anything. Returns the line and message of the first problem.
pub fn check_syntax(source: &str) -> Result<(), (usize, String)> {
    let chunks = preprocess::preprocess(source).map_err(|err| (err.line, err.message))?;
    parser::parse(chunks).map_err(|err| (err.line, err.message))?;
    Ok(())
}
