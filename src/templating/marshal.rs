//! Rendering of directive results into document text.

use thiserror::Error;

use super::diagnostics::Diagnostics;
use super::value::Value;

/// A value that has no textual form in a document.
#[derive(Debug, Error)]
#[error("unable to marshal {kind} value {value}: {source}")]
pub struct MarshalError {
    kind: &'static str,
    value: String,
    #[source]
    source: serde_json::Error,
}

/// Render a value the way it is spliced into a document.
///
/// Strings are inserted verbatim. Every other value is written as compact
/// JSON, so `10` stays `10`, `true` stays `true` and lists and maps become
/// `["a","b"]` and `{"k":"v"}`.
pub fn render_value(value: &Value) -> Result<String, MarshalError> {
    match value {
        Value::Str(s) => Ok(s.clone()),
        other => serde_json::to_string(other).map_err(|source| MarshalError {
            kind: other.kind(),
            value: format!("{other:?}"),
            source,
        }),
    }
}

/// Render a value, logging and substituting an empty string when it has no
/// textual form.
pub(crate) fn render_or_empty(value: &Value, diagnostics: &dyn Diagnostics) -> String {
    render_value(value).unwrap_or_else(|err| {
        diagnostics.error(&err.to_string());
        String::new()
    })
}

/// Strip the braces of a single top-level object, leaving its members.
///
/// Text that is not exactly one object is returned unchanged.
pub(crate) fn strip_outer_braces(text: &str) -> String {
    let trimmed = text.trim();
    if !trimmed.starts_with('{') || !trimmed.ends_with('}') {
        return text.to_string();
    }

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (idx, ch) in trimmed.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' | '[' => depth += 1,
            '}' | ']' => {
                depth = depth.saturating_sub(1);
                if depth == 0 && idx + 1 != trimmed.len() {
                    return text.to_string();
                }
            }
            _ => {}
        }
    }

    trimmed[1..trimmed.len() - 1].trim().to_string()
}
