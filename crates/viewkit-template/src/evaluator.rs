/*
 * evaluator.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Template execution.
//!
//! Execution walks a [`Tree`] against a data value and appends to a string
//! buffer. `{{template}}` calls resolve names in the executing group, so a
//! page sees exactly the layouts and partials that were in its clone.

use crate::ast::{Branching, Command, Conditional, Node, Operand, Pipeline, TemplateCall, Tree};
use crate::builtins;
use crate::error::{TemplateError, TemplateResult};
use crate::group::TemplateGroup;
use crate::value::TemplateValue;

/// Maximum nesting of `{{template}}` calls.
pub const MAX_TEMPLATE_DEPTH: usize = 100;

/// Execute `tree` from `group` with `data` as both dot and `$`.
pub(crate) fn execute(group: &TemplateGroup, tree: &Tree, data: &TemplateValue) -> TemplateResult<String> {
    let mut exec = Exec {
        group,
        out: String::new(),
        depth: 0,
    };
    exec.exec_tree(tree, data)?;
    Ok(exec.out)
}

/// Per-template state: the template name for error messages and the value
/// bound to `$`.
struct Scope<'s> {
    name: &'s str,
    root: &'s TemplateValue,
}

struct Exec<'g> {
    group: &'g TemplateGroup,
    out: String,
    depth: usize,
}

impl<'g> Exec<'g> {
    fn exec_tree(&mut self, tree: &Tree, data: &TemplateValue) -> TemplateResult<()> {
        if self.depth >= MAX_TEMPLATE_DEPTH {
            return Err(TemplateError::RecursionLimit {
                name: tree.name.clone(),
                max_depth: MAX_TEMPLATE_DEPTH,
            });
        }
        self.depth += 1;
        let scope = Scope {
            name: &tree.name,
            root: data,
        };
        let result = self.walk_list(&scope, &tree.root, data);
        self.depth -= 1;
        result
    }

    fn execution_error(scope: &Scope<'_>, message: impl Into<String>) -> TemplateError {
        TemplateError::Execution {
            name: scope.name.to_string(),
            message: message.into(),
        }
    }

    fn walk_list(&mut self, scope: &Scope<'_>, nodes: &[Node], dot: &TemplateValue) -> TemplateResult<()> {
        for node in nodes {
            self.walk(scope, node, dot)?;
        }
        Ok(())
    }

    fn walk(&mut self, scope: &Scope<'_>, node: &Node, dot: &TemplateValue) -> TemplateResult<()> {
        match node {
            Node::Text(text) => {
                self.out.push_str(text);
                Ok(())
            }
            Node::Action(pipeline) => {
                let value = self.eval_pipeline(scope, pipeline, dot)?;
                self.out.push_str(&value.render());
                Ok(())
            }
            Node::If(conditional) => self.walk_if(scope, conditional, dot),
            Node::Range(range) => self.walk_range(scope, range, dot),
            Node::With(with) => {
                let value = self.eval_pipeline(scope, &with.pipeline, dot)?;
                if value.is_truthy() {
                    self.walk_list(scope, &with.body, &value)
                } else if let Some(else_branch) = &with.else_branch {
                    self.walk_list(scope, else_branch, dot)
                } else {
                    Ok(())
                }
            }
            Node::Template(call) => self.walk_template(scope, call, dot),
        }
    }

    fn walk_if(&mut self, scope: &Scope<'_>, conditional: &Conditional, dot: &TemplateValue) -> TemplateResult<()> {
        for (condition, body) in &conditional.branches {
            if self.eval_pipeline(scope, condition, dot)?.is_truthy() {
                return self.walk_list(scope, body, dot);
            }
        }
        match &conditional.else_branch {
            Some(body) => self.walk_list(scope, body, dot),
            None => Ok(()),
        }
    }

    fn walk_range(&mut self, scope: &Scope<'_>, range: &Branching, dot: &TemplateValue) -> TemplateResult<()> {
        let value = self.eval_pipeline(scope, &range.pipeline, dot)?;
        let items: Vec<&TemplateValue> = match &value {
            TemplateValue::List(items) => items.iter().collect(),
            // Maps iterate their values in key order
            TemplateValue::Map(map) => map.values().collect(),
            TemplateValue::Null => Vec::new(),
            other => {
                return Err(Self::execution_error(
                    scope,
                    format!("range can't iterate over {}", other.type_name()),
                ));
            }
        };

        if items.is_empty() {
            if let Some(else_branch) = &range.else_branch {
                return self.walk_list(scope, else_branch, dot);
            }
            return Ok(());
        }
        for item in items {
            self.walk_list(scope, &range.body, item)?;
        }
        Ok(())
    }

    fn walk_template(&mut self, scope: &Scope<'_>, call: &TemplateCall, dot: &TemplateValue) -> TemplateResult<()> {
        let group = self.group;
        let Some(tree) = group.tree(&call.name) else {
            return Err(TemplateError::UndefinedTemplate {
                name: call.name.clone(),
                group: group.name().to_string(),
            });
        };
        let data = match &call.pipeline {
            Some(pipeline) => self.eval_pipeline(scope, pipeline, dot)?,
            None => TemplateValue::Null,
        };
        self.exec_tree(tree, &data)
    }

    fn eval_pipeline(
        &mut self,
        scope: &Scope<'_>,
        pipeline: &Pipeline,
        dot: &TemplateValue,
    ) -> TemplateResult<TemplateValue> {
        let mut value = None;
        for command in &pipeline.commands {
            value = Some(self.eval_command(scope, command, dot, value.take())?);
        }
        Ok(value.unwrap_or_default())
    }

    /// Evaluate one command. `piped` is the previous stage's result and is
    /// passed as the final argument.
    fn eval_command(
        &mut self,
        scope: &Scope<'_>,
        command: &Command,
        dot: &TemplateValue,
        piped: Option<TemplateValue>,
    ) -> TemplateResult<TemplateValue> {
        let Some((first, rest)) = command.args.split_first() else {
            return Ok(TemplateValue::Null);
        };

        if let Operand::Function(name) = first {
            let mut args = rest
                .iter()
                .map(|arg| self.eval_operand(scope, arg, dot))
                .collect::<TemplateResult<Vec<_>>>()?;
            args.extend(piped);
            return self.call_function(scope, name, &args);
        }

        if !rest.is_empty() || piped.is_some() {
            return Err(Self::execution_error(
                scope,
                format!(
                    "{}:{}: can't give argument to non-function",
                    command.pos.line, command.pos.column
                ),
            ));
        }
        self.eval_operand(scope, first, dot)
    }

    fn eval_operand(
        &mut self,
        scope: &Scope<'_>,
        operand: &Operand,
        dot: &TemplateValue,
    ) -> TemplateResult<TemplateValue> {
        Ok(match operand {
            Operand::Dot => dot.clone(),
            // Missing fields evaluate to null
            Operand::Field(path) => dot.get_path(path).cloned().unwrap_or_default(),
            Operand::Variable(path) => scope.root.get_path(path).cloned().unwrap_or_default(),
            Operand::Function(name) => self.call_function(scope, name, &[])?,
            Operand::String(s) => TemplateValue::String(s.clone()),
            Operand::Int(i) => TemplateValue::Int(*i),
            Operand::Float(f) => TemplateValue::Float(*f),
            Operand::Bool(b) => TemplateValue::Bool(*b),
            Operand::Nil => TemplateValue::Null,
            Operand::Pipeline(pipeline) => self.eval_pipeline(scope, pipeline, dot)?,
        })
    }

    fn call_function(
        &mut self,
        scope: &Scope<'_>,
        name: &str,
        args: &[TemplateValue],
    ) -> TemplateResult<TemplateValue> {
        let result = if let Some(f) = self.group.functions().get(name) {
            f(args)
        } else if let Some(f) = builtins::lookup(name) {
            f(args)
        } else {
            return Err(Self::execution_error(
                scope,
                format!("function {:?} not defined", name),
            ));
        };
        result.map_err(|e| TemplateError::Function {
            template: scope.name.to_string(),
            function: name.to_string(),
            message: e.message,
        })
    }
}
