//! Variable scoping and module cycle tracking.
//!
//! A [`ScopeStack`] is an ordered list of [`VarFrame`]s searched from the
//! innermost frame outward. Entering a module never mutates the caller's
//! stack: [`ScopeStack::push`] returns a new stack that shares the older
//! frames, so the caller's scope is restored simply by dropping the child.
//! [`CycleGuard`] works the same way for the chain of modules being
//! rendered.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::value::Value;

/// One layer of variable bindings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VarFrame {
    vars: BTreeMap<String, Value>,
}

impl VarFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a frame from the members of a JSON object.
    pub fn from_json_object(object: serde_json::Map<String, serde_json::Value>) -> Self {
        object.into_iter().map(|(k, v)| (k, Value::from(v))).collect()
    }

    /// Bind `name`, returning the previous binding in this frame.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.vars.insert(name.into(), value.into())
    }

    /// Builder form of [`VarFrame::insert`].
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.vars.iter()
    }
}

impl FromIterator<(String, Value)> for VarFrame {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            vars: iter.into_iter().collect(),
        }
    }
}

impl From<BTreeMap<String, Value>> for VarFrame {
    fn from(vars: BTreeMap<String, Value>) -> Self {
        Self {
            vars,
        }
    }
}

/// Stack of variable frames, outermost first.
#[derive(Debug, Clone, Default)]
pub struct ScopeStack {
    frames: Vec<Arc<VarFrame>>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a stack from frames given outermost first.
    pub fn from_frames(frames: impl IntoIterator<Item = VarFrame>) -> Self {
        Self {
            frames: frames.into_iter().map(Arc::new).collect(),
        }
    }

    /// Return a new stack with `frame` as its innermost layer.
    #[must_use]
    pub fn push(&self, frame: VarFrame) -> Self {
        let mut frames = self.frames.clone();
        frames.push(Arc::new(frame));
        Self {
            frames,
        }
    }

    /// Find the innermost binding of `name`.
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        self.frames.iter().rev().find_map(|frame| frame.get(name))
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }
}

/// A module name already present in the render chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleError {
    pub name: String,
    /// Chain from the first module to the repeated name, inclusive.
    pub chain: Vec<String>,
}

/// Names of the modules currently being rendered, outermost first.
#[derive(Debug, Clone, Default)]
pub struct CycleGuard {
    chain: Vec<String>,
}

impl CycleGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.chain.iter().any(|n| n == name)
    }

    /// Return a guard with `name` appended, or the offending chain if
    /// `name` is already being rendered.
    pub fn enter(&self, name: &str) -> Result<Self, CycleError> {
        let mut chain = self.chain.clone();
        chain.push(name.to_string());
        if self.contains(name) {
            return Err(CycleError {
                name: name.to_string(),
                chain,
            });
        }
        Ok(Self {
            chain,
        })
    }

    pub fn chain(&self) -> &[String] {
        &self.chain
    }
}
