/*
 * parser.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Recursive-descent parser from tokens to [`Tree`]s.
//!
//! Function names are resolved while parsing: a call to a function that is
//! neither bound in the group's [`FuncMap`] nor built in is a parse error.

use crate::ast::{
    Branching, Command, Conditional, Node, Operand, Pipeline, TemplateCall, Tree,
};
use crate::builtins;
use crate::error::{TemplateError, TemplateResult};
use crate::funcs::FuncMap;
use crate::lexer::{Keyword, Pos, Token, TokenKind, lex};

/// Result of parsing one source text.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSource {
    /// The top-level content, named after the source.
    pub main: Tree,
    /// Every `{{define}}` and `{{block}}` found in the source.
    pub defines: Vec<Tree>,
}

/// Parse `source` as template `name`.
pub fn parse(name: &str, source: &str, funcs: &FuncMap) -> TemplateResult<ParsedSource> {
    let tokens = lex(source).map_err(|e| TemplateError::Parse {
        name: name.to_string(),
        line: e.pos.line,
        column: e.pos.column,
        message: e.message,
    })?;

    let mut parser = Parser {
        name,
        tokens,
        index: 0,
        funcs,
        defines: Vec::new(),
        depth: 0,
    };
    let (root, terminator, pos) = parser.parse_list()?;
    match terminator {
        Terminator::Eof => {}
        Terminator::End => return Err(parser.error(pos, "unexpected {{end}}")),
        Terminator::Else | Terminator::ElseIf(_) => {
            return Err(parser.error(pos, "unexpected {{else}}"));
        }
    }

    Ok(ParsedSource {
        main: Tree {
            name: name.to_string(),
            root,
        },
        defines: parser.defines,
    })
}

/// How a node list ended.
#[derive(Debug)]
enum Terminator {
    End,
    Else,
    ElseIf(Pipeline),
    Eof,
}

struct Parser<'a> {
    name: &'a str,
    tokens: Vec<Token>,
    index: usize,
    funcs: &'a FuncMap,
    defines: Vec<Tree>,
    /// Number of open node lists; 1 at the top level of the source.
    depth: usize,
}

impl<'a> Parser<'a> {
    fn error(&self, pos: Pos, message: impl Into<String>) -> TemplateError {
        TemplateError::Parse {
            name: self.name.to_string(),
            line: pos.line,
            column: pos.column,
            message: message.into(),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.index)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.index).cloned();
        if token.is_some() {
            self.index += 1;
        }
        token
    }

    /// Position of the next token, or of the last one at end of input.
    fn peek_pos(&self) -> Pos {
        self.peek()
            .or_else(|| self.tokens.last())
            .map_or_else(Pos::default, |t| t.pos)
    }

    fn eof_error(&self, context: &str) -> TemplateError {
        self.error(self.peek_pos(), format!("unexpected EOF in {}", context))
    }

    fn expect_action_end(&mut self, context: &str) -> TemplateResult<()> {
        match self.next() {
            Some(Token {
                kind: TokenKind::ActionEnd,
                ..
            }) => Ok(()),
            Some(token) => Err(self.error(
                token.pos,
                format!("unexpected {} in {}", token.kind.describe(), context),
            )),
            None => Err(self.eof_error(context)),
        }
    }

    fn expect_string(&mut self, context: &str) -> TemplateResult<String> {
        match self.next() {
            Some(Token {
                kind: TokenKind::String(name),
                ..
            }) => Ok(name),
            Some(token) => Err(self.error(
                token.pos,
                format!(
                    "{} clause: expected template name string, got {}",
                    context,
                    token.kind.describe()
                ),
            )),
            None => Err(self.eof_error(context)),
        }
    }

    /// Parse nodes until `{{end}}`, `{{else}}` or end of input.
    fn parse_list(&mut self) -> TemplateResult<(Vec<Node>, Terminator, Pos)> {
        self.depth += 1;
        let result = self.parse_list_inner();
        self.depth -= 1;
        result
    }

    fn parse_list_inner(&mut self) -> TemplateResult<(Vec<Node>, Terminator, Pos)> {
        let mut nodes = Vec::new();
        loop {
            let Some(token) = self.next() else {
                return Ok((nodes, Terminator::Eof, self.peek_pos()));
            };
            match token.kind {
                TokenKind::Text(text) => nodes.push(Node::Text(text)),
                TokenKind::ActionStart => {
                    if let Some(terminator) = self.parse_action(&mut nodes, token.pos)? {
                        return Ok((nodes, terminator, token.pos));
                    }
                }
                other => {
                    return Err(self.error(token.pos, format!("unexpected {}", other.describe())));
                }
            }
        }
    }

    /// Parse one action after its `{{`. Returns a terminator for
    /// `{{end}}` / `{{else}}`, otherwise appends to `nodes`.
    fn parse_action(&mut self, nodes: &mut Vec<Node>, pos: Pos) -> TemplateResult<Option<Terminator>> {
        let keyword = match self.peek() {
            Some(Token {
                kind: TokenKind::Keyword(keyword),
                ..
            }) => Some(keyword.clone()),
            Some(_) => None,
            None => return Err(self.eof_error("action")),
        };

        let Some(keyword) = keyword else {
            let pipeline = self.parse_pipeline("command")?;
            nodes.push(Node::Action(pipeline));
            return Ok(None);
        };
        self.index += 1;

        match keyword {
            Keyword::End => {
                self.expect_action_end("end")?;
                return Ok(Some(Terminator::End));
            }
            Keyword::Else => {
                if matches!(
                    self.peek(),
                    Some(Token {
                        kind: TokenKind::Keyword(Keyword::If),
                        ..
                    })
                ) {
                    self.index += 1;
                    let condition = self.parse_pipeline("else if")?;
                    return Ok(Some(Terminator::ElseIf(condition)));
                }
                self.expect_action_end("else")?;
                return Ok(Some(Terminator::Else));
            }
            Keyword::If => nodes.push(self.parse_if(pos)?),
            Keyword::Range => nodes.push(Node::Range(self.parse_branching("range", pos)?)),
            Keyword::With => nodes.push(Node::With(self.parse_branching("with", pos)?)),
            Keyword::Define if self.depth > 1 => {
                return Err(self.error(pos, "{{define}} is only allowed at the top level"));
            }
            Keyword::Define => self.parse_define()?,
            Keyword::Block => nodes.push(self.parse_block(pos)?),
            Keyword::Template => nodes.push(self.parse_template_call(pos)?),
        }
        Ok(None)
    }

    fn parse_if(&mut self, pos: Pos) -> TemplateResult<Node> {
        let mut branches = Vec::new();
        let mut condition = self.parse_pipeline("if")?;
        loop {
            let (body, terminator, _) = self.parse_list()?;
            branches.push((condition, body));
            match terminator {
                Terminator::End => {
                    return Ok(Node::If(Conditional {
                        branches,
                        else_branch: None,
                        pos,
                    }));
                }
                Terminator::ElseIf(next) => condition = next,
                Terminator::Else => {
                    let else_body = self.parse_until_end("if")?;
                    return Ok(Node::If(Conditional {
                        branches,
                        else_branch: Some(else_body),
                        pos,
                    }));
                }
                Terminator::Eof => return Err(self.error(pos, "unexpected EOF in if")),
            }
        }
    }

    fn parse_branching(&mut self, context: &str, pos: Pos) -> TemplateResult<Branching> {
        let pipeline = self.parse_pipeline(context)?;
        let (body, terminator, terminator_pos) = self.parse_list()?;
        let else_branch = match terminator {
            Terminator::End => None,
            Terminator::Else => Some(self.parse_until_end(context)?),
            Terminator::ElseIf(_) => {
                return Err(self.error(
                    terminator_pos,
                    format!("else if is not allowed in {}", context),
                ));
            }
            Terminator::Eof => {
                return Err(self.error(pos, format!("unexpected EOF in {}", context)));
            }
        };
        Ok(Branching {
            pipeline,
            body,
            else_branch,
            pos,
        })
    }

    /// A body that may only be closed by `{{end}}`.
    fn parse_until_end(&mut self, context: &str) -> TemplateResult<Vec<Node>> {
        let (body, terminator, pos) = self.parse_list()?;
        match terminator {
            Terminator::End => Ok(body),
            Terminator::Eof => Err(self.eof_error(context)),
            Terminator::Else | Terminator::ElseIf(_) => {
                Err(self.error(pos, format!("unexpected {{{{else}}}} in {}", context)))
            }
        }
    }

    fn add_define(&mut self, tree: Tree, pos: Pos) -> TemplateResult<()> {
        match self.defines.iter_mut().find(|t| t.name == tree.name) {
            Some(existing) if !existing.is_empty() && !tree.is_empty() => Err(self.error(
                pos,
                format!("multiple definition of template {:?}", tree.name),
            )),
            Some(existing) => {
                if !tree.is_empty() {
                    *existing = tree;
                }
                Ok(())
            }
            None => {
                self.defines.push(tree);
                Ok(())
            }
        }
    }

    fn parse_define(&mut self) -> TemplateResult<()> {
        let pos = self.peek_pos();
        let name = self.expect_string("define")?;
        self.expect_action_end("define")?;
        let root = self.parse_until_end("define")?;
        self.add_define(Tree { name, root }, pos)
    }

    fn parse_optional_pipeline(&mut self, context: &str) -> TemplateResult<Option<Pipeline>> {
        if matches!(
            self.peek(),
            Some(Token {
                kind: TokenKind::ActionEnd,
                ..
            })
        ) {
            self.index += 1;
            return Ok(None);
        }
        self.parse_pipeline(context).map(Some)
    }

    fn parse_block(&mut self, pos: Pos) -> TemplateResult<Node> {
        let name = self.expect_string("block")?;
        let pipeline = self.parse_optional_pipeline("block")?;
        let root = self.parse_until_end("block")?;
        self.add_define(
            Tree {
                name: name.clone(),
                root,
            },
            pos,
        )?;
        Ok(Node::Template(TemplateCall {
            name,
            pipeline,
            pos,
        }))
    }

    fn parse_template_call(&mut self, pos: Pos) -> TemplateResult<Node> {
        let name = self.expect_string("template")?;
        let pipeline = self.parse_optional_pipeline("template")?;
        Ok(Node::Template(TemplateCall {
            name,
            pipeline,
            pos,
        }))
    }

    /// Pipeline terminated by `}}`, which is consumed.
    fn parse_pipeline(&mut self, context: &str) -> TemplateResult<Pipeline> {
        self.parse_pipeline_inner(context, false)
    }

    fn parse_pipeline_inner(&mut self, context: &str, in_parens: bool) -> TemplateResult<Pipeline> {
        let pos = self.peek_pos();
        let mut commands = Vec::new();
        loop {
            commands.push(self.parse_command(context)?);
            let Some(token) = self.next() else {
                return Err(self.eof_error(context));
            };
            match token.kind {
                TokenKind::Pipe => {}
                TokenKind::ActionEnd if !in_parens => break,
                TokenKind::RParen if in_parens => break,
                other => {
                    return Err(self.error(
                        token.pos,
                        format!("unexpected {} in {}", other.describe(), context),
                    ));
                }
            }
        }
        Ok(Pipeline { commands, pos })
    }

    fn parse_command(&mut self, context: &str) -> TemplateResult<Command> {
        let pos = self.peek_pos();
        let mut args = Vec::new();
        loop {
            match self.peek().map(|t| &t.kind) {
                None => return Err(self.eof_error(context)),
                Some(TokenKind::Pipe | TokenKind::ActionEnd | TokenKind::RParen) => break,
                Some(_) => {}
            }
            let Some(token) = self.next() else {
                return Err(self.eof_error(context));
            };
            args.push(self.parse_operand(token, context)?);
        }
        if args.is_empty() {
            return Err(self.error(pos, format!("missing value for {}", context)));
        }
        Ok(Command { args, pos })
    }

    fn parse_operand(&mut self, token: Token, context: &str) -> TemplateResult<Operand> {
        Ok(match token.kind {
            TokenKind::Dot => Operand::Dot,
            TokenKind::Field(path) => Operand::Field(path),
            TokenKind::Variable(path) => Operand::Variable(path),
            TokenKind::String(s) => Operand::String(s),
            TokenKind::Int(i) => Operand::Int(i),
            TokenKind::Float(f) => Operand::Float(f),
            TokenKind::Bool(b) => Operand::Bool(b),
            TokenKind::Nil => Operand::Nil,
            TokenKind::Ident(name) => {
                if !self.funcs.contains(&name) && builtins::lookup(&name).is_none() {
                    return Err(self.error(token.pos, format!("function {:?} not defined", name)));
                }
                Operand::Function(name)
            }
            TokenKind::LParen => {
                Operand::Pipeline(Box::new(self.parse_pipeline_inner("parenthesized pipeline", true)?))
            }
            other => {
                return Err(self.error(
                    token.pos,
                    format!("unexpected {} in {}", other.describe(), context),
                ));
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(source: &str) -> ParsedSource {
        parse("test", source, &FuncMap::new()).expect("source should parse")
    }

    fn parse_err(source: &str) -> String {
        parse("test", source, &FuncMap::new())
            .expect_err("source should not parse")
            .to_string()
    }

    #[test]
    fn test_text_and_action() {
        let parsed = parse_ok("Hello {{.Name}}!");
        assert_eq!(parsed.main.name, "test");
        assert_eq!(parsed.main.root.len(), 3);
        assert!(matches!(&parsed.main.root[1], Node::Action(p) if p.commands.len() == 1));
        assert!(parsed.defines.is_empty());
    }

    #[test]
    fn test_define_and_block_are_collected() {
        let parsed = parse_ok(
            r#"{{define "header"}}<h1>{{.}}</h1>{{end}}{{block "content" .}}default{{end}}"#,
        );
        let names: Vec<_> = parsed.defines.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["header", "content"]);
        // The block leaves a call behind in the main tree
        assert!(matches!(
            &parsed.main.root[..],
            [Node::Template(TemplateCall { name, pipeline: Some(_), .. })] if name == "content"
        ));
    }

    #[test]
    fn test_if_else_chain() {
        let parsed = parse_ok("{{if .A}}a{{else if .B}}b{{else}}c{{end}}");
        let Node::If(conditional) = &parsed.main.root[0] else {
            panic!("expected if node");
        };
        assert_eq!(conditional.branches.len(), 2);
        assert!(conditional.else_branch.is_some());
    }

    #[test]
    fn test_pipelines_and_parens() {
        let mut funcs = FuncMap::new();
        funcs.insert("upper", |args| Ok(args[0].clone()));
        let parsed = parse("t", r#"{{ .Title | upper | printf2 }}"#, &funcs);
        assert!(parsed.unwrap_err().to_string().contains(r#"function "printf2" not defined"#));

        let parsed = parse("t", r#"{{ upper (print "a" .B) | len }}"#, &funcs).unwrap();
        let Node::Action(pipeline) = &parsed.main.root[0] else {
            panic!("expected action");
        };
        assert_eq!(pipeline.commands.len(), 2);
        assert!(matches!(pipeline.commands[0].args[1], Operand::Pipeline(_)));
    }

    #[test]
    fn test_duplicate_define_in_one_source() {
        let err = parse_err(r#"{{define "a"}}x{{end}}{{define "a"}}y{{end}}"#);
        assert!(err.contains(r#"multiple definition of template "a""#));
        // An empty redefinition is tolerated
        let parsed = parse_ok(r#"{{define "a"}}x{{end}}{{define "a"}} {{end}}"#);
        assert_eq!(parsed.defines.len(), 1);
    }

    #[test]
    fn test_structural_errors() {
        assert!(parse_err("{{end}}").contains("unexpected {{end}}"));
        assert!(parse_err("{{if .A}}x").contains("unexpected EOF in if"));
        assert!(parse_err("{{range .A}}x{{else if .B}}y{{end}}").contains("else if is not allowed"));
        assert!(parse_err("{{template foo}}").contains("expected template name string"));
        assert!(parse_err("{{if}}x{{end}}").contains("missing value for if"));
        assert!(parse_err("{{missing .X}}").contains(r#"function "missing" not defined"#));
    }

    #[test]
    fn test_define_only_at_top_level() {
        let nested = [
            r#"{{if .A}}{{define "x"}}x{{end}}{{end}}"#,
            r#"{{range .A}}{{define "x"}}x{{end}}{{end}}"#,
            r#"{{define "outer"}}{{define "inner"}}x{{end}}{{end}}"#,
            r#"{{block "b" .}}{{define "x"}}x{{end}}{{end}}"#,
        ];
        for source in nested {
            assert!(
                parse_err(source).contains("{{define}} is only allowed at the top level"),
                "{}",
                source
            );
        }

        let parsed = parse_ok(r#"{{if .A}}a{{end}}{{define "x"}}{{if .B}}b{{end}}{{end}}"#);
        assert_eq!(parsed.defines.len(), 1);
    }

    #[test]
    fn test_error_position() {
        let err = parse("page.html", "line\n{{ nope }}", &FuncMap::new()).unwrap_err();
        assert_eq!(
            err.to_string(),
            r#"template: page.html:2:4: function "nope" not defined"#
        );
    }
}
