/*
 * ast.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Template AST types.
//!
//! A parsed source yields one [`Tree`] for its top-level content plus one per
//! `{{define}}`/`{{block}}`. Trees are immutable once built; template groups
//! share them between clones behind `Arc`.

use crate::lexer::Pos;

/// A named, parsed template.
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    /// Template name (`define` name, or the name a source was parsed under).
    pub name: String,
    /// Top-level nodes.
    pub root: Vec<Node>,
}

impl Tree {
    /// True if the template only contains whitespace text.
    ///
    /// An empty definition never replaces an existing non-empty one.
    pub fn is_empty(&self) -> bool {
        self.root.iter().all(|node| match node {
            Node::Text(text) => text.trim().is_empty(),
            _ => false,
        })
    }
}

/// A node in the template AST.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Literal text to be output as-is.
    Text(String),

    /// `{{pipeline}}`: evaluate and print.
    Action(Pipeline),

    /// `{{if p}}...{{else if p}}...{{else}}...{{end}}`
    If(Conditional),

    /// `{{range p}}...{{else}}...{{end}}`
    Range(Branching),

    /// `{{with p}}...{{else}}...{{end}}`
    With(Branching),

    /// `{{template "name" p}}`, also produced by `{{block}}`
    Template(TemplateCall),
}

/// Conditional block with one or more guarded branches.
#[derive(Debug, Clone, PartialEq)]
pub struct Conditional {
    /// `(condition, body)` pairs for if / else-if branches.
    pub branches: Vec<(Pipeline, Vec<Node>)>,
    pub else_branch: Option<Vec<Node>>,
    pub pos: Pos,
}

/// `range` and `with`: a pipeline that rebinds dot for the body.
#[derive(Debug, Clone, PartialEq)]
pub struct Branching {
    pub pipeline: Pipeline,
    pub body: Vec<Node>,
    pub else_branch: Option<Vec<Node>>,
    pub pos: Pos,
}

/// Invocation of another template in the same group.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateCall {
    pub name: String,
    /// Value passed as dot; `None` passes null.
    pub pipeline: Option<Pipeline>,
    pub pos: Pos,
}

/// `cmd | cmd | ...`. Each command's result is passed as the final argument
/// of the next.
#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    pub commands: Vec<Command>,
    pub pos: Pos,
}

/// A single command: a function call with arguments, or a lone operand.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub args: Vec<Operand>,
    pub pos: Pos,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// `.`
    Dot,
    /// `.A.B`, relative to dot
    Field(Vec<String>),
    /// `$` or `$.A.B`, relative to the data passed to execute
    Variable(Vec<String>),
    /// Function name (validated at parse time)
    Function(String),
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Nil,
    /// `( pipeline )`
    Pipeline(Box<Pipeline>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tree_is_empty() {
        let empty = Tree {
            name: "t".to_string(),
            root: vec![Node::Text("  \n\t".to_string())],
        };
        assert!(empty.is_empty());
        assert!(
            Tree {
                name: "t".to_string(),
                root: vec![],
            }
            .is_empty()
        );

        let text = Tree {
            name: "t".to_string(),
            root: vec![Node::Text(" x ".to_string())],
        };
        assert!(!text.is_empty());

        let call = Tree {
            name: "t".to_string(),
            root: vec![Node::Template(TemplateCall {
                name: "other".to_string(),
                pipeline: None,
                pos: Pos::default(),
            })],
        };
        assert!(!call.is_empty());
    }
}
