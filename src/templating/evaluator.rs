//! Executes a parsed [`Template`] against a [`DirectiveSet`].

use futures::future::BoxFuture;

use super::ast::{Command, Node, Operand, Template};
use super::builtins;
use super::directives::{DirectiveSet, Splice};
use super::error::RenderError;
use super::marshal::render_or_empty;
use super::value::Value;

impl DirectiveSet<'_> {
    /// Render `template` to text.
    pub(crate) async fn execute(&self, template: &Template) -> Result<String, RenderError> {
        let mut out = String::new();
        self.eval_nodes(&template.nodes, &mut out).await?;
        Ok(out)
    }

    fn eval_nodes<'b>(
        &'b self,
        nodes: &'b [Node],
        out: &'b mut String,
    ) -> BoxFuture<'b, Result<(), RenderError>> {
        Box::pin(async move {
            for node in nodes {
                match node {
                    Node::Text(text) => out.push_str(text),
                    Node::Output(command) => {
                        let value = self.eval_command(command).await?;
                        out.push_str(&render_or_empty(&value, self.renderer.diagnostics()));
                    }
                    Node::If(conditional) => {
                        let mut taken = None;
                        for branch in &conditional.branches {
                            if self.eval_command(&branch.condition).await?.is_truthy() {
                                taken = Some(&branch.body);
                                break;
                            }
                        }
                        if let Some(body) = taken.or(conditional.otherwise.as_ref()) {
                            self.eval_nodes(body, out).await?;
                        }
                    }
                }
            }
            Ok(())
        })
    }

    fn eval_command<'b>(&'b self, command: &'b Command) -> BoxFuture<'b, Result<Value, RenderError>> {
        Box::pin(async move {
            match &command.head {
                Operand::Call(name) => self.call(name, &command.args, command.line).await,
                head if command.args.is_empty() => self.eval_operand(head, command.line).await,
                head => Err(self.exec_error(
                    command.line,
                    format!("can't give argument to non-function {}", head.describe()),
                )),
            }
        })
    }

    fn eval_operand<'b>(
        &'b self,
        operand: &'b Operand,
        line: usize,
    ) -> BoxFuture<'b, Result<Value, RenderError>> {
        Box::pin(async move {
            match operand {
                Operand::Call(name) => self.call(name, &[], line).await,
                Operand::Literal(value) => Ok(value.clone()),
                Operand::Structured(raw) => Ok(self.structured_value(raw)),
                Operand::Raw(raw) => Ok(Value::Str(raw.clone())),
                Operand::Sub(command) => self.eval_command(command).await,
            }
        })
    }

    async fn call(&self, name: &str, args: &[Operand], line: usize) -> Result<Value, RenderError> {
        match name {
            "and" => return self.logical(args, line, false).await,
            "or" => return self.logical(args, line, true).await,
            _ => {}
        }

        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.eval_operand(arg, line).await?);
        }

        let builtin = match name {
            "var" => return self.var(values, line),
            "module" => return self.module(values, Splice::Inline, line).await,
            "appModule" => return self.module(values, Splice::Members, line).await,
            "pipelineID" => return self.pipeline_id(values, line).await,
            "not" => builtins::not(&values),
            "eq" => builtins::eq(&values),
            "ne" => builtins::ne(&values),
            "lt" => builtins::lt(&values),
            "le" => builtins::le(&values),
            "gt" => builtins::gt(&values),
            "ge" => builtins::ge(&values),
            other => Err(format!("function \"{other}\" not defined")),
        };
        builtin.map_err(|message| self.exec_error(line, format!("error calling {name}: {message}")))
    }

    /// `and` returns its first falsy argument, `or` its first truthy one;
    /// otherwise the last argument. Evaluation stops at the deciding
    /// argument.
    async fn logical(&self, args: &[Operand], line: usize, stop_when: bool) -> Result<Value, RenderError> {
        let name = if stop_when {
            "or"
        } else {
            "and"
        };
        if args.is_empty() {
            return Err(self.exec_error(
                line,
                format!("wrong number of args for {name}: want at least 1 got 0"),
            ));
        }

        let mut last = Value::Null;
        for arg in args {
            last = self.eval_operand(arg, line).await?;
            if last.is_truthy() == stop_when {
                break;
            }
        }
        Ok(last)
    }
}
