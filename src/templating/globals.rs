//! Extraction of the root document's `globals` member.
//!
//! Globals have to be known before any directive runs, but the document
//! is not valid JSON until its directives are rendered. The extractor
//! therefore scans the document skeleton: literal text with every action
//! replaced by a placeholder. Only the top-level object structure is
//! checked; the `globals` value itself must be plain JSON.

use super::preprocess::Chunk;
use super::scope::VarFrame;
use crate::constants::GLOBALS_KEY;

/// Stands in for an action in the skeleton.
const HOLE: char = '\u{0}';

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum GlobalsError {
    /// The document is not a keyed object or `globals` is malformed.
    Parse(String),
    /// `globals` is valid JSON but not an object.
    NotAnObject(String),
}

/// Find the root document's globals. `Ok(None)` means the document has no
/// `globals` member.
pub(crate) fn extract_globals(chunks: &[Chunk]) -> Result<Option<VarFrame>, GlobalsError> {
    let skeleton = skeleton(chunks);
    if skeleton.chars().all(|c| c.is_whitespace() || c == HOLE) {
        return Ok(None);
    }

    let Some(raw) = Scanner::new(&skeleton).find_member(GLOBALS_KEY)? else {
        return Ok(None);
    };
    if raw.contains(HOLE) {
        return Err(GlobalsError::Parse(format!("{GLOBALS_KEY} must not contain directives")));
    }

    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(serde_json::Value::Object(object)) => Ok(Some(VarFrame::from_json_object(object))),
        Ok(other) => Err(GlobalsError::NotAnObject(format!(
            "{GLOBALS_KEY} is {}, not an object",
            json_kind(&other)
        ))),
        Err(err) => Err(GlobalsError::Parse(err.to_string())),
    }
}

fn skeleton(chunks: &[Chunk]) -> String {
    let mut out = String::new();
    for chunk in chunks {
        match chunk {
            Chunk::Text(text) => out.push_str(text),
            Chunk::Action(_) => out.push(HOLE),
        }
    }
    out
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

struct Scanner<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            pos: 0,
        }
    }

    fn current(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn advance(&mut self) {
        if let Some(c) = self.current() {
            self.pos += c.len_utf8();
        }
    }

    fn skip_whitespace(&mut self) {
        while self.current().is_some_and(char::is_whitespace) {
            self.advance();
        }
    }

    fn error(&self, message: impl Into<String>) -> GlobalsError {
        GlobalsError::Parse(format!("{} at offset {}", message.into(), self.pos))
    }

    /// Walk the top-level object and return the raw text of `key`'s value.
    /// A document that opens with a directive picks its top level at render
    /// time and has no globals.
    fn find_member(&mut self, key: &str) -> Result<Option<&'a str>, GlobalsError> {
        self.skip_whitespace();
        if self.current() == Some(HOLE) {
            return Ok(None);
        }
        if self.current() != Some('{') {
            return Err(self.error("document is not a keyed object"));
        }
        self.advance();

        let mut found = None;
        loop {
            self.skip_whitespace();
            match self.current() {
                Some('}') => return Ok(found),
                Some(',') => self.advance(),
                Some(HOLE) => self.advance(),
                Some('"') => {
                    let name = self.key()?;
                    self.skip_whitespace();
                    if self.current() != Some(':') {
                        return Err(self.error(format!("expected ':' after key {name:?}")));
                    }
                    self.advance();
                    self.skip_whitespace();
                    let value = self.value()?;
                    if name == key && found.is_none() {
                        found = Some(value);
                    }
                }
                Some(c) => return Err(self.error(format!("unexpected {c:?} in document object"))),
                None => return Err(self.error("unexpected end of document")),
            }
        }
    }

    fn key(&mut self) -> Result<String, GlobalsError> {
        let raw = self.string()?;
        serde_json::from_str(raw).map_err(|err| self.error(format!("invalid key: {err}")))
    }

    /// Skip a quoted string, returning it with its quotes.
    fn string(&mut self) -> Result<&'a str, GlobalsError> {
        let start = self.pos;
        self.advance();
        let mut escaped = false;
        loop {
            let Some(c) = self.current() else {
                return Err(self.error("unterminated string"));
            };
            self.advance();
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => return Ok(&self.text[start..self.pos]),
                _ => {}
            }
        }
    }

    /// Skip one member value and return its raw text.
    fn value(&mut self) -> Result<&'a str, GlobalsError> {
        let start = self.pos;
        match self.current() {
            Some('"') => {
                self.string()?;
            }
            Some('{' | '[') => self.balanced()?,
            _ => {
                while let Some(c) = self.current() {
                    if c == ',' || c == '}' {
                        break;
                    }
                    if c == '"' {
                        self.string()?;
                    } else {
                        self.advance();
                    }
                }
            }
        }
        Ok(self.text[start..self.pos].trim_end())
    }

    fn balanced(&mut self) -> Result<(), GlobalsError> {
        let mut depth = 0usize;
        loop {
            match self.current() {
                None => return Err(self.error("unbalanced brackets")),
                Some('"') => {
                    self.string()?;
                }
                Some('{' | '[') => {
                    depth += 1;
                    self.advance();
                }
                Some('}' | ']') => {
                    depth = depth.saturating_sub(1);
                    self.advance();
                    if depth == 0 {
                        return Ok(());
                    }
                }
                Some(_) => self.advance(),
            }
        }
    }
}
