//! Parsed form of a document.

use super::value::Value;

/// A parsed document: literal text interleaved with directives.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Template {
    pub nodes: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Literal text, emitted unchanged.
    Text(String),
    /// A command whose result is spliced into the output.
    Output(Command),
    /// `if` / `else if` / `else` / `end`.
    If(Conditional),
}

/// A conditional block. The first branch whose condition is truthy is
/// rendered; otherwise the `else` body, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct Conditional {
    pub branches: Vec<Branch>,
    pub otherwise: Option<Vec<Node>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    pub condition: Command,
    pub body: Vec<Node>,
}

/// A function call or a lone operand.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub head: Operand,
    pub args: Vec<Operand>,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// A known function. Called with the command's arguments when it is the
    /// head, without arguments otherwise.
    Call(String),
    Literal(Value),
    /// Structured literal text, parsed as JSON when evaluated.
    Structured(String),
    /// Nested directive text, passed through as a string.
    Raw(String),
    /// Parenthesised command.
    Sub(Box<Command>),
}

impl Operand {
    /// Source-like rendering used in error messages.
    pub fn describe(&self) -> String {
        match self {
            Self::Call(name) => name.clone(),
            Self::Literal(value) => value.to_string(),
            Self::Structured(raw) | Self::Raw(raw) => raw.clone(),
            Self::Sub(command) => {
                let mut parts = vec![command.head.describe()];
                parts.extend(command.args.iter().map(Operand::describe));
                format!("({})", parts.join(" "))
            }
        }
    }
}
