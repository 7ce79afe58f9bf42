//! The document-level directives: `var`, `module`, `appModule` and
//! `pipelineID`.
//!
//! A [`DirectiveSet`] is bound to one document render. It carries the
//! document's location, the scope its variables resolve against and the
//! chain of modules that led to it. Module renders get a fresh set with a
//! pushed scope and an extended chain; the caller's set is never mutated.

use crate::constants::{APPLICATION_REF, APPLICATION_VAR};
use crate::pipelines::find_pipeline_id;

use super::error::RenderError;
use super::marshal::{render_or_empty, strip_outer_braces};
use super::renderer::{DocumentLocation, Renderer};
use super::scope::{CycleGuard, ScopeStack, VarFrame};
use super::value::Value;

/// Every function a document may call.
pub(crate) const FUNCTIONS: &[&str] = &[
    "var",
    "module",
    "appModule",
    "pipelineID",
    "not",
    "and",
    "or",
    "eq",
    "ne",
    "lt",
    "le",
    "gt",
    "ge",
];

/// How a module's rendered text is spliced into its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Splice {
    /// `module`: the text as rendered.
    Inline,
    /// `appModule`: the members of the rendered object, without its braces.
    Members,
}

/// Directive context for one document render.
pub(crate) struct DirectiveSet<'a> {
    pub(super) renderer: &'a Renderer,
    pub(super) location: &'a DocumentLocation,
    pub(super) scope: ScopeStack,
    pub(super) guard: CycleGuard,
}

impl<'a> DirectiveSet<'a> {
    pub(crate) fn new(
        renderer: &'a Renderer,
        location: &'a DocumentLocation,
        scope: ScopeStack,
        guard: CycleGuard,
    ) -> Self {
        Self {
            renderer,
            location,
            scope,
            guard,
        }
    }

    pub(super) fn exec_error(&self, line: usize, message: impl Into<String>) -> RenderError {
        RenderError::Execution {
            path: self.location.path.clone(),
            line,
            message: message.into(),
        }
    }

    fn string_arg(
        &self,
        function: &str,
        value: Option<Value>,
        line: usize,
    ) -> Result<String, RenderError> {
        match value {
            Some(Value::Str(s)) => Ok(s),
            Some(other) => Err(self.exec_error(
                line,
                format!("wrong type for value in {function}; expected string; got {}", other.kind()),
            )),
            None => Err(self.exec_error(
                line,
                format!("wrong number of args for {function}: want at least 1 got 0"),
            )),
        }
    }

    /// `var name [default]`.
    ///
    /// Resolves `name` innermost scope first. When it is unbound the default
    /// is used; `"@application"` as the default means the `application`
    /// variable. Arguments after the default are ignored.
    pub(super) fn var(&self, args: Vec<Value>, line: usize) -> Result<Value, RenderError> {
        let mut args = args.into_iter();
        let name = self.string_arg("var", args.next(), line)?;

        if let Some(value) = self.scope.lookup(&name) {
            return Ok(self.splice_value(value));
        }

        match args.next() {
            Some(Value::Str(default)) if default == APPLICATION_REF => {
                match self.scope.lookup(APPLICATION_VAR) {
                    Some(value) => Ok(self.splice_value(value)),
                    None => {
                        self.renderer.diagnostics().warn(&format!(
                            "No value for '{name}' and no '{APPLICATION_VAR}' variable to satisfy {APPLICATION_REF}"
                        ));
                        Ok(Value::Str(String::new()))
                    }
                }
            }
            Some(default) => Ok(self.splice_value(&default)),
            None => {
                self.renderer
                    .diagnostics()
                    .warn(&format!("No value found for '{name}' and no default supplied"));
                Ok(Value::Str(String::new()))
            }
        }
    }

    /// Scalars keep their type; lists and maps become their JSON text.
    fn splice_value(&self, value: &Value) -> Value {
        match value {
            Value::List(_) | Value::Map(_) => {
                Value::Str(render_or_empty(value, self.renderer.diagnostics()))
            }
            Value::Float(f) if !f.is_finite() => {
                Value::Str(render_or_empty(value, self.renderer.diagnostics()))
            }
            other => other.clone(),
        }
    }

    /// `module name [key value]...` and `appModule name [key value]...`.
    ///
    /// Renders the named fragment with the key/value pairs as a new
    /// innermost scope frame. Malformed pairs are logged and render as an
    /// empty string.
    pub(super) async fn module(
        &self,
        args: Vec<Value>,
        splice: Splice,
        line: usize,
    ) -> Result<Value, RenderError> {
        let function = match splice {
            Splice::Inline => "module",
            Splice::Members => "appModule",
        };
        let mut args = args.into_iter();
        let name = self.string_arg(function, args.next(), line)?;
        let rest: Vec<Value> = args.collect();

        let diagnostics = self.renderer.diagnostics();
        if rest.len() % 2 != 0 {
            diagnostics.warn(&format!("odd number of parameters received to module {name}"));
            return Ok(Value::Str(String::new()));
        }

        let mut frame = VarFrame::new();
        let mut pairs = rest.into_iter();
        while let (Some(key), Some(value)) = (pairs.next(), pairs.next()) {
            match key {
                Value::Str(key) => {
                    frame.insert(key, value);
                }
                _ => {
                    diagnostics.error(&format!("dict keys must be strings in module: {name}"));
                    return Ok(Value::Str(String::new()));
                }
            }
        }

        let guard = self.guard.enter(&name).map_err(|cycle| {
            let err = RenderError::from(cycle);
            diagnostics.error(&err.to_string());
            err
        })?;

        let location = self.renderer.fragment_location(self.location, &name);
        tracing::debug!(
            target: "render",
            "Rendering {} '{}' from {}/{}@{} for {}",
            function,
            name,
            location.org,
            location.repo,
            location.git_ref,
            self.location.path
        );
        let rendered =
            self.renderer.render_fragment(location, self.scope.push(frame), guard).await?;

        Ok(Value::Str(match splice {
            Splice::Inline => rendered,
            Splice::Members => strip_outer_braces(&rendered),
        }))
    }

    /// `pipelineID application pipeline`.
    pub(super) async fn pipeline_id(&self, args: Vec<Value>, line: usize) -> Result<Value, RenderError> {
        if args.len() != 2 {
            return Err(self.exec_error(
                line,
                format!("wrong number of args for pipelineID: want 2 got {}", args.len()),
            ));
        }
        let mut args = args.into_iter();
        let application = self.string_arg("pipelineID", args.next(), line)?;
        let pipeline = self.string_arg("pipelineID", args.next(), line)?;

        let diagnostics = self.renderer.diagnostics();
        let id = match find_pipeline_id(self.renderer.pipelines(), &application, &pipeline).await {
            Ok(Some(id)) => id,
            Ok(None) => {
                diagnostics.info(&format!(
                    "Pipeline '{pipeline}' not found in application '{application}'"
                ));
                String::new()
            }
            Err(err) => {
                diagnostics.error(&format!(
                    "Could not look up pipelines for application '{application}': {err}"
                ));
                String::new()
            }
        };
        Ok(Value::Str(id))
    }

    /// Parse a structured literal. Text that is not valid JSON is logged and
    /// passed through as a string.
    pub(super) fn structured_value(&self, raw: &str) -> Value {
        match serde_json::from_str::<serde_json::Value>(raw) {
            Ok(json) => Value::from(json),
            Err(err) => {
                self.renderer.diagnostics().error(&format!("Error parsing value {raw}: {err}"));
                Value::Str(raw.to_string())
            }
        }
    }
}
