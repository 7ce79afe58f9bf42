//! Builds a [`Template`] from lexed chunks.
//!
//! Validates block structure (`if` / `else if` / `else` / `end`) and that
//! every function named in the document exists, so an unknown directive
//! fails the render before anything is executed or downloaded.

use strsim::levenshtein;
use thiserror::Error;

use super::ast::{Branch, Command, Conditional, Node, Operand, Template};
use super::directives::FUNCTIONS;
use super::preprocess::{Action, Chunk, Token};
use super::value::Value;

/// Maximum edit distance, as a percentage of the name's length, for a
/// known function to be suggested.
const SIMILARITY_THRESHOLD_PERCENT: usize = 50;

/// The directive stream is malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {message}")]
pub struct ParseError {
    pub line: usize,
    pub message: String,
}

impl ParseError {
    fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

/// Parse lexed chunks into a template.
pub fn parse(chunks: Vec<Chunk>) -> Result<Template, ParseError> {
    let mut parser = Parser {
        chunks: chunks.into_iter(),
    };
    let (nodes, end) = parser.list(None)?;
    match end {
        ListEnd::Eof => Ok(Template {
            nodes,
        }),
        ListEnd::End(line) => Err(ParseError::new(line, "unexpected {{end}}")),
        ListEnd::Else(line) | ListEnd::ElseIf(_, line) => {
            Err(ParseError::new(line, "unexpected {{else}}"))
        }
    }
}

/// What stopped a node list.
enum ListEnd {
    Eof,
    End(usize),
    Else(usize),
    ElseIf(Command, usize),
}

struct Parser {
    chunks: std::vec::IntoIter<Chunk>,
}

impl Parser {
    /// Collect nodes until the end of input or a block keyword. `open` is
    /// the line of the enclosing `if`, if any.
    fn list(&mut self, open: Option<usize>) -> Result<(Vec<Node>, ListEnd), ParseError> {
        let mut nodes = Vec::new();
        while let Some(chunk) = self.chunks.next() {
            let Action {
                tokens,
                line,
            } = match chunk {
                Chunk::Text(text) => {
                    nodes.push(Node::Text(text));
                    continue;
                }
                Chunk::Action(action) => action,
            };

            match tokens.as_slice() {
                [Token::Ident(kw), rest @ ..] if kw == "if" => {
                    let condition = command(rest, line)?;
                    nodes.push(self.conditional(condition, line)?);
                }
                [Token::Ident(kw)] if kw == "end" => return Ok((nodes, ListEnd::End(line))),
                [Token::Ident(kw)] if kw == "else" => return Ok((nodes, ListEnd::Else(line))),
                [Token::Ident(kw), Token::Ident(kw2), rest @ ..] if kw == "else" && kw2 == "if" => {
                    let condition = command(rest, line)?;
                    return Ok((nodes, ListEnd::ElseIf(condition, line)));
                }
                [Token::Ident(kw), ..] if kw == "end" || kw == "else" => {
                    return Err(ParseError::new(line, format!("unexpected tokens after {{{{{kw}}}}}")));
                }
                _ => nodes.push(Node::Output(command(&tokens, line)?)),
            }
        }

        match open {
            Some(line) => Err(ParseError::new(line, "unexpected EOF: {{if}} without matching {{end}}")),
            None => Ok((nodes, ListEnd::Eof)),
        }
    }

    fn conditional(&mut self, first: Command, line: usize) -> Result<Node, ParseError> {
        let mut branches = Vec::new();
        let mut condition = first;
        loop {
            let (body, end) = self.list(Some(line))?;
            branches.push(Branch {
                condition,
                body,
            });
            match end {
                ListEnd::End(_) => {
                    return Ok(Node::If(Conditional {
                        branches,
                        otherwise: None,
                    }));
                }
                ListEnd::ElseIf(next, _) => condition = next,
                ListEnd::Else(_) => {
                    let (otherwise, end) = self.list(Some(line))?;
                    return match end {
                        ListEnd::End(_) => Ok(Node::If(Conditional {
                            branches,
                            otherwise: Some(otherwise),
                        })),
                        ListEnd::Else(at) | ListEnd::ElseIf(_, at) => {
                            Err(ParseError::new(at, "expected {{end}}; found {{else}}"))
                        }
                        ListEnd::Eof => Err(ParseError::new(line, "unexpected EOF")),
                    };
                }
                ListEnd::Eof => return Err(ParseError::new(line, "unexpected EOF")),
            }
        }
    }
}

/// Parse the tokens of one command.
fn command(tokens: &[Token], line: usize) -> Result<Command, ParseError> {
    let mut pos = 0;
    let operands = operands(tokens, &mut pos, line)?;
    if pos < tokens.len() {
        return Err(ParseError::new(line, "unexpected right paren"));
    }
    build_command(operands, line)
}

fn build_command(operands: Vec<Operand>, line: usize) -> Result<Command, ParseError> {
    let mut operands = operands.into_iter();
    let head = operands.next().ok_or_else(|| ParseError::new(line, "missing value for command"))?;
    Ok(Command {
        head,
        args: operands.collect(),
        line,
    })
}

/// Parse operands until the end of input or a closing paren, which is left
/// unconsumed.
fn operands(tokens: &[Token], pos: &mut usize, line: usize) -> Result<Vec<Operand>, ParseError> {
    let mut out = Vec::new();
    while let Some(token) = tokens.get(*pos) {
        let operand = match token {
            Token::RParen => break,
            Token::LParen => {
                *pos += 1;
                let inner = operands(tokens, pos, line)?;
                if tokens.get(*pos) != Some(&Token::RParen) {
                    return Err(ParseError::new(line, "unclosed left paren"));
                }
                Operand::Sub(Box::new(build_command(inner, line)?))
            }
            Token::Ident(name) if matches!(name.as_str(), "if" | "else" | "end") => {
                return Err(ParseError::new(line, format!("unexpected <{name}> in command")));
            }
            Token::Ident(name) => {
                check_function(name, line)?;
                Operand::Call(name.clone())
            }
            Token::Str(s) => Operand::Literal(Value::Str(s.clone())),
            Token::Int(i) => Operand::Literal(Value::Int(*i)),
            Token::Float(f) => Operand::Literal(Value::Float(*f)),
            Token::Bool(b) => Operand::Literal(Value::Bool(*b)),
            Token::Structured(raw) => Operand::Structured(raw.clone()),
            Token::Raw(raw) => Operand::Raw(raw.clone()),
        };
        out.push(operand);
        *pos += 1;
    }
    Ok(out)
}

fn check_function(name: &str, line: usize) -> Result<(), ParseError> {
    if FUNCTIONS.contains(&name) {
        return Ok(());
    }
    let mut message = format!("function \"{name}\" not defined");
    if let Some(suggestion) = closest_function(name) {
        message.push_str(&format!(" (did you mean \"{suggestion}\"?)"));
    }
    Err(ParseError::new(line, message))
}

fn closest_function(name: &str) -> Option<&'static str> {
    FUNCTIONS
        .iter()
        .map(|known| (*known, levenshtein(name, known)))
        .filter(|(_, distance)| *distance <= name.len() * SIMILARITY_THRESHOLD_PERCENT / 100)
        .min_by_key(|(_, distance)| *distance)
        .map(|(known, _)| known)
}
