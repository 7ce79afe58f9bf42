//! Caller-supplied variables from the command line and vars files.

use std::path::Path;

use anyhow::{Context, Result};

use crate::core::PacError;
use crate::templating::{Value, VarFrame};

/// Parse `NAME=VALUE`. `VALUE` is read as JSON when it parses, so
/// `waitTime=10` binds a number and `stages=["1","2"]` a list; anything
/// else is bound as a plain string.
pub fn parse_assignment(input: &str) -> Result<(String, Value), PacError> {
    let invalid = |reason: &str| PacError::InvalidVariable {
        input: input.to_string(),
        reason: reason.to_string(),
    };
    let (name, raw) = input.split_once('=').ok_or_else(|| invalid("expected NAME=VALUE"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(invalid("variable name is empty"));
    }
    let value = serde_json::from_str::<serde_json::Value>(raw)
        .map(Value::from)
        .unwrap_or_else(|_| Value::Str(raw.to_string()));
    Ok((name.to_string(), value))
}

/// Build one frame from several assignments; later ones win.
pub fn parse_assignments<S: AsRef<str>>(inputs: &[S]) -> Result<VarFrame, PacError> {
    let mut frame = VarFrame::new();
    for input in inputs {
        let (name, value) = parse_assignment(input.as_ref())?;
        frame.insert(name, value);
    }
    Ok(frame)
}

/// Read a JSON object of variables from `path`.
pub async fn load_vars_file(path: &Path) -> Result<VarFrame> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read vars file: {}", path.display()))?;

    let invalid = |reason: String| PacError::InvalidVariable {
        input: path.display().to_string(),
        reason,
    };
    match serde_json::from_str::<serde_json::Value>(&content) {
        Ok(serde_json::Value::Object(object)) => Ok(VarFrame::from_json_object(object)),
        Ok(_) => Err(invalid("vars file must contain a JSON object".to_string()).into()),
        Err(err) => Err(invalid(err.to_string()).into()),
    }
}
