//! Directive lexer.
//!
//! Splits a document into literal text and `{{ ... }}` actions, tokenising
//! each action. Tokenising is also where the document-level shorthands are
//! normalised:
//!
//! - the default-value marker `?:` is dropped, so
//!   `{{ var "x" ?: "d" }}` lexes exactly like `{{ var "x" "d" }}`;
//! - a bare `{` or `[` starts a structured literal that runs to its
//!   balancing bracket and is kept as one raw token;
//! - a `{{ ... }}` nested inside an action is kept as one raw token.
//!
//! Trim markers (`{{- ` and ` -}}`) remove the whitespace of the adjacent
//! text, and `{{/* ... */}}` comments vanish.

use thiserror::Error;

/// A lexical unit inside an action.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Function name or keyword.
    Ident(String),
    /// Decoded string literal, from double quotes or backquotes.
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    LParen,
    RParen,
    /// Balanced `{...}` or `[...]` text, verbatim.
    Structured(String),
    /// Nested `{{...}}` text, verbatim.
    Raw(String),
}

/// Tokens of one `{{ ... }}` action and the line it starts on.
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    pub tokens: Vec<Token>,
    pub line: usize,
}

/// A piece of a lexed document.
#[derive(Debug, Clone, PartialEq)]
pub enum Chunk {
    Text(String),
    Action(Action),
}

/// The document cannot be lexed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {message}")]
pub struct PreprocessError {
    pub line: usize,
    pub message: String,
}

/// Lex `source` into text and action chunks.
pub fn preprocess(source: &str) -> Result<Vec<Chunk>, PreprocessError> {
    let mut lexer = Lexer::new(source);
    let mut chunks = Vec::new();
    let mut trim_next = false;

    loop {
        let (text, found) = lexer.text();
        let mut text = if trim_next {
            text.trim_start().to_string()
        } else {
            text.to_string()
        };
        trim_next = false;

        if !found {
            if !text.is_empty() {
                chunks.push(Chunk::Text(text));
            }
            return Ok(chunks);
        }

        let line = lexer.line;
        lexer.bump(2);
        if lexer.at_trim_marker() {
            text.truncate(text.trim_end().len());
            lexer.bump(1);
        }
        if !text.is_empty() {
            chunks.push(Chunk::Text(text));
        }

        let (action, trim_right) = lexer.action(line)?;
        if let Some(action) = action {
            chunks.push(Chunk::Action(action));
        }
        trim_next = trim_right;
    }
}

struct Lexer<'a> {
    source: &'a str,
    pos: usize,
    line: usize,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            pos: 0,
            line: 1,
        }
    }

    fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    fn current(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().nth(1)
    }

    /// Advance by `len` bytes, counting newlines.
    fn bump(&mut self, len: usize) {
        let end = (self.pos + len).min(self.source.len());
        self.line += self.source[self.pos..end].matches('\n').count();
        self.pos = end;
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.current()?;
        self.bump(ch.len_utf8());
        Some(ch)
    }

    fn error(&self, line: usize, message: impl Into<String>) -> PreprocessError {
        PreprocessError {
            line,
            message: message.into(),
        }
    }

    /// Consume text up to the next `{{`. Returns the text and whether an
    /// action opener follows.
    fn text(&mut self) -> (&'a str, bool) {
        let rest = self.rest();
        match rest.find("{{") {
            Some(idx) => {
                self.bump(idx);
                (&rest[..idx], true)
            }
            None => {
                self.bump(rest.len());
                (rest, false)
            }
        }
    }

    /// A `-` directly followed by whitespace.
    fn at_trim_marker(&self) -> bool {
        self.current() == Some('-') && self.peek().is_some_and(char::is_whitespace)
    }

    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while self.current().is_some_and(char::is_whitespace) {
            self.advance();
        }
        self.pos != start
    }

    /// Lex an action body after its opening delimiter. Comments yield no
    /// action. The flag reports a right trim marker.
    fn action(&mut self, line: usize) -> Result<(Option<Action>, bool), PreprocessError> {
        self.skip_whitespace_if_trimmed();
        if self.rest().starts_with("/*") {
            return self.comment(line).map(|trim| (None, trim));
        }

        let mut tokens = Vec::new();
        loop {
            let spaced = self.skip_whitespace();
            let rest = self.rest();
            if rest.is_empty() {
                return Err(self.error(line, "unclosed action"));
            }
            if rest.starts_with("}}") {
                self.bump(2);
                return Ok((
                    Some(Action {
                        tokens,
                        line,
                    }),
                    false,
                ));
            }
            if spaced && rest.starts_with("-}}") {
                self.bump(3);
                return Ok((
                    Some(Action {
                        tokens,
                        line,
                    }),
                    true,
                ));
            }
            if rest.starts_with("?:") {
                self.bump(2);
                continue;
            }
            if rest.starts_with("{{") {
                let raw = self.nested_action()?;
                tokens.push(Token::Raw(raw.to_string()));
                continue;
            }

            let token = match self.current() {
                Some('{' | '[') => Token::Structured(self.structured()?.to_string()),
                Some('"') => Token::Str(self.quoted()?),
                Some('`') => Token::Str(self.backquoted()?),
                Some('(') => {
                    self.advance();
                    Token::LParen
                }
                Some(')') => {
                    self.advance();
                    Token::RParen
                }
                Some(c) if c.is_ascii_digit() => self.number()?,
                Some('-' | '+') if self.peek().is_some_and(|c| c.is_ascii_digit()) => {
                    self.number()?
                }
                Some(c) if c.is_alphabetic() || c == '_' => self.identifier(),
                Some(c) => {
                    return Err(self.error(self.line, format!("unexpected {c:?} in action")));
                }
                None => return Err(self.error(line, "unclosed action")),
            };
            tokens.push(token);
        }
    }

    /// `{{- /* ... */ -}}` allows whitespace between the trim marker and the
    /// comment opener. Plain actions skip their leading whitespace anyway.
    fn skip_whitespace_if_trimmed(&mut self) {
        let rest = self.rest();
        if rest.trim_start().starts_with("/*") {
            self.skip_whitespace();
        }
    }

    fn comment(&mut self, line: usize) -> Result<bool, PreprocessError> {
        let Some(end) = self.rest().find("*/") else {
            return Err(self.error(line, "unclosed comment"));
        };
        self.bump(end + 2);
        let spaced = self.skip_whitespace();
        let rest = self.rest();
        if rest.starts_with("}}") {
            self.bump(2);
            Ok(false)
        } else if spaced && rest.starts_with("-}}") {
            self.bump(3);
            Ok(true)
        } else {
            Err(self.error(self.line, "comment ends before closing delimiter"))
        }
    }

    /// Capture a nested `{{ ... }}` verbatim.
    fn nested_action(&mut self) -> Result<&'a str, PreprocessError> {
        let start = self.pos;
        let line = self.line;
        let mut depth = 0usize;
        loop {
            let rest = self.rest();
            if rest.is_empty() {
                return Err(self.error(line, "unclosed nested action"));
            }
            if rest.starts_with("{{") {
                depth += 1;
                self.bump(2);
            } else if rest.starts_with("}}") {
                depth -= 1;
                self.bump(2);
                if depth == 0 {
                    return Ok(&self.source[start..self.pos]);
                }
            } else if rest.starts_with('"') {
                self.skip_string(line)?;
            } else {
                self.advance();
            }
        }
    }

    /// Capture a bracket-balanced structured literal verbatim.
    fn structured(&mut self) -> Result<&'a str, PreprocessError> {
        let start = self.pos;
        let line = self.line;
        let mut closers = Vec::new();
        loop {
            match self.current() {
                None => return Err(self.error(line, "unterminated structured literal")),
                Some('"') => self.skip_string(line)?,
                Some('{') => {
                    closers.push('}');
                    self.advance();
                }
                Some('[') => {
                    closers.push(']');
                    self.advance();
                }
                Some(close @ ('}' | ']')) => {
                    if closers.pop() != Some(close) {
                        return Err(self.error(
                            self.line,
                            format!("unexpected {close:?} in structured literal"),
                        ));
                    }
                    self.advance();
                    if closers.is_empty() {
                        return Ok(&self.source[start..self.pos]);
                    }
                }
                Some(_) => {
                    self.advance();
                }
            }
        }
    }

    /// Skip a double-quoted string without decoding it.
    fn skip_string(&mut self, line: usize) -> Result<(), PreprocessError> {
        self.advance();
        loop {
            match self.advance() {
                None | Some('\n') => return Err(self.error(line, "unterminated quoted string")),
                Some('\\') => {
                    self.advance();
                }
                Some('"') => return Ok(()),
                Some(_) => {}
            }
        }
    }

    fn quoted(&mut self) -> Result<String, PreprocessError> {
        let line = self.line;
        self.advance();
        let mut value = String::new();
        loop {
            match self.advance() {
                None | Some('\n') => return Err(self.error(line, "unterminated quoted string")),
                Some('"') => return Ok(value),
                Some('\\') => value.push(self.escape(line)?),
                Some(c) => value.push(c),
            }
        }
    }

    fn escape(&mut self, line: usize) -> Result<char, PreprocessError> {
        match self.advance() {
            Some('"') => Ok('"'),
            Some('\\') => Ok('\\'),
            Some('/') => Ok('/'),
            Some('\'') => Ok('\''),
            Some('n') => Ok('\n'),
            Some('t') => Ok('\t'),
            Some('r') => Ok('\r'),
            Some('u') => {
                let rest = self.rest();
                let hex = rest.get(..4).filter(|h| h.chars().all(|c| c.is_ascii_hexdigit()));
                let ch = hex
                    .and_then(|h| u32::from_str_radix(h, 16).ok())
                    .and_then(char::from_u32)
                    .ok_or_else(|| self.error(line, "invalid unicode escape"))?;
                self.bump(4);
                Ok(ch)
            }
            Some(c) => Err(self.error(line, format!("unknown escape sequence: \\{c}"))),
            None => Err(self.error(line, "unterminated quoted string")),
        }
    }

    fn backquoted(&mut self) -> Result<String, PreprocessError> {
        let line = self.line;
        self.advance();
        let rest = self.rest();
        let Some(end) = rest.find('`') else {
            return Err(self.error(line, "unterminated raw quoted string"));
        };
        let value = rest[..end].to_string();
        self.bump(end + 1);
        Ok(value)
    }

    fn number(&mut self) -> Result<Token, PreprocessError> {
        let start = self.pos;
        let line = self.line;
        let mut is_float = false;

        if matches!(self.current(), Some('-' | '+')) {
            self.advance();
        }
        while let Some(c) = self.current() {
            match c {
                '0'..='9' => {}
                '.' => is_float = true,
                'e' | 'E' => {
                    is_float = true;
                    if matches!(self.peek(), Some('-' | '+')) {
                        self.advance();
                    }
                }
                _ => break,
            }
            self.advance();
        }

        let text = &self.source[start..self.pos];
        if self.current().is_some_and(|c| c.is_alphanumeric() || c == '_') {
            return Err(self.error(line, format!("bad number syntax: {:?}", self.word_from(start))));
        }

        let token = if is_float {
            text.parse().ok().map(Token::Float)
        } else {
            text.trim_start_matches('+').parse().ok().map(Token::Int)
        };
        token.ok_or_else(|| self.error(line, format!("bad number syntax: {text:?}")))
    }

    fn word_from(&self, start: usize) -> &'a str {
        let rest = &self.source[start..];
        let end = rest
            .find(|c: char| c.is_whitespace() || c == '}' || c == ')')
            .unwrap_or(rest.len());
        &rest[..end]
    }

    fn identifier(&mut self) -> Token {
        let start = self.pos;
        while self.current().is_some_and(|c| c.is_alphanumeric() || c == '_') {
            self.advance();
        }
        match &self.source[start..self.pos] {
            "true" => Token::Bool(true),
            "false" => Token::Bool(false),
            word => Token::Ident(word.to_string()),
        }
    }
}
