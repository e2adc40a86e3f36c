/*
 * lexer.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Lexer for the template language.
//!
//! Text outside `{{ ... }}` becomes a single `Text` token. Inside an action
//! the lexer produces identifiers, fields, literals and punctuation. Trim
//! markers (`{{- ` and ` -}}`) are applied here by trimming the adjacent
//! text, and comments (`{{/* ... */}}`) produce no tokens at all.

use std::fmt;

const LEFT_DELIM: &str = "{{";
const RIGHT_DELIM: &str = "}}";
const LEFT_COMMENT: &str = "/*";
const RIGHT_COMMENT: &str = "*/";

/// Position in the template source (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pos {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A token with its position
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub pos: Pos,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Keyword {
    If,
    Else,
    End,
    Range,
    With,
    Define,
    Template,
    Block,
}

impl Keyword {
    fn from_ident(s: &str) -> Option<Keyword> {
        Some(match s {
            "if" => Keyword::If,
            "else" => Keyword::Else,
            "end" => Keyword::End,
            "range" => Keyword::Range,
            "with" => Keyword::With,
            "define" => Keyword::Define,
            "template" => Keyword::Template,
            "block" => Keyword::Block,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::If => "if",
            Keyword::Else => "else",
            Keyword::End => "end",
            Keyword::Range => "range",
            Keyword::With => "with",
            Keyword::Define => "define",
            Keyword::Template => "template",
            Keyword::Block => "block",
        }
    }
}

/// Token types
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Text(String),
    ActionStart,           // {{
    ActionEnd,             // }}
    Keyword(Keyword),
    Ident(String),         // function name
    Field(Vec<String>),    // .Title.Sub
    Dot,                   // .
    Variable(Vec<String>), // $ or $.Title
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Nil,
    Pipe,                  // |
    LParen,                // (
    RParen,                // )
}

impl TokenKind {
    /// Short description used in parse errors.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Text(_) => "text".to_string(),
            TokenKind::ActionStart => "\"{{\"".to_string(),
            TokenKind::ActionEnd => "\"}}\"".to_string(),
            TokenKind::Keyword(k) => format!("<{}>", k.as_str()),
            TokenKind::Ident(name) => format!("function {:?}", name),
            TokenKind::Field(path) => format!("field .{}", path.join(".")),
            TokenKind::Dot => "\".\"".to_string(),
            TokenKind::Variable(_) => "variable".to_string(),
            TokenKind::String(s) => format!("string {:?}", s),
            TokenKind::Int(i) => format!("number {}", i),
            TokenKind::Float(f) => format!("number {}", f),
            TokenKind::Bool(b) => format!("{}", b),
            TokenKind::Nil => "nil".to_string(),
            TokenKind::Pipe => "\"|\"".to_string(),
            TokenKind::LParen => "\"(\"".to_string(),
            TokenKind::RParen => "\")\"".to_string(),
        }
    }
}

/// A lexing failure.
#[derive(Debug, Clone, PartialEq)]
pub struct LexError {
    pub message: String,
    pub pos: Pos,
}

/// Tokenize a template source.
pub fn lex(source: &str) -> Result<Vec<Token>, LexError> {
    let mut lexer = Lexer {
        src: source,
        offset: 0,
        pos: Pos { line: 1, column: 1 },
        tokens: Vec::new(),
        trim_next_text: false,
    };
    lexer.run()?;
    Ok(lexer.tokens)
}

struct Lexer<'a> {
    src: &'a str,
    offset: usize,
    pos: Pos,
    tokens: Vec<Token>,
    /// Set by ` -}}`: strip leading whitespace from the next text.
    trim_next_text: bool,
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

impl<'a> Lexer<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.offset..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.rest().chars().nth(1)
    }

    /// Consume `len` bytes, tracking line and column.
    fn advance(&mut self, len: usize) {
        for c in self.src[self.offset..self.offset + len].chars() {
            if c == '\n' {
                self.pos.line += 1;
                self.pos.column = 1;
            } else {
                self.pos.column += 1;
            }
        }
        self.offset += len;
    }

    fn error<T>(&self, message: impl Into<String>) -> Result<T, LexError> {
        Err(LexError {
            message: message.into(),
            pos: self.pos,
        })
    }

    fn push(&mut self, kind: TokenKind, pos: Pos) {
        self.tokens.push(Token { kind, pos });
    }

    fn run(&mut self) -> Result<(), LexError> {
        while self.offset < self.src.len() {
            self.lex_text();
            if self.offset < self.src.len() {
                self.lex_action()?;
            }
        }
        Ok(())
    }

    /// Text up to the next left delimiter.
    fn lex_text(&mut self) {
        let rest = self.rest();
        let end = rest.find(LEFT_DELIM).unwrap_or(rest.len());
        let trim_left = rest[end..]
            .strip_prefix(LEFT_DELIM)
            .and_then(|s| s.strip_prefix('-'))
            .is_some_and(|s| s.starts_with(char::is_whitespace));

        let raw = &rest[..end];
        let leading = if self.trim_next_text {
            raw.len() - raw.trim_start().len()
        } else {
            0
        };
        self.trim_next_text = false;
        self.advance(leading);

        let pos = self.pos;
        let mut text = &raw[leading..];
        if trim_left {
            text = text.trim_end();
        }
        if !text.is_empty() {
            self.push(TokenKind::Text(text.to_string()), pos);
        }
        self.advance(end - leading);
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        let trimmed = rest.trim_start();
        self.advance(rest.len() - trimmed.len());
    }

    /// Consume a right delimiter (with optional trim marker) if present.
    fn at_right_delim(&mut self) -> bool {
        if self.rest().starts_with(RIGHT_DELIM) {
            self.advance(RIGHT_DELIM.len());
            return true;
        }
        if self.rest().starts_with("-}}") {
            self.advance(3);
            self.trim_next_text = true;
            return true;
        }
        false
    }

    fn lex_action(&mut self) -> Result<(), LexError> {
        let start = self.pos;
        self.advance(LEFT_DELIM.len());
        if self.rest().starts_with('-') && self.peek_second().is_some_and(char::is_whitespace) {
            self.advance(1);
        }
        self.skip_whitespace();

        if self.rest().starts_with(LEFT_COMMENT) {
            let Some(end) = self.rest().find(RIGHT_COMMENT) else {
                return Err(LexError {
                    message: "unclosed comment".to_string(),
                    pos: start,
                });
            };
            self.advance(end + RIGHT_COMMENT.len());
            self.skip_whitespace();
            if !self.at_right_delim() {
                return self.error("comment ends before closing delimiter");
            }
            return Ok(());
        }

        self.push(TokenKind::ActionStart, start);
        loop {
            self.skip_whitespace();
            let pos = self.pos;
            if self.at_right_delim() {
                self.push(TokenKind::ActionEnd, pos);
                return Ok(());
            }
            let Some(c) = self.peek() else {
                return Err(LexError {
                    message: "unclosed action".to_string(),
                    pos: start,
                });
            };
            match c {
                '|' => {
                    self.advance(1);
                    self.push(TokenKind::Pipe, pos);
                }
                '(' => {
                    self.advance(1);
                    self.push(TokenKind::LParen, pos);
                }
                ')' => {
                    self.advance(1);
                    self.push(TokenKind::RParen, pos);
                }
                '"' => {
                    let s = self.lex_quoted()?;
                    self.push(TokenKind::String(s), pos);
                }
                '`' => {
                    let s = self.lex_raw()?;
                    self.push(TokenKind::String(s), pos);
                }
                '.' => {
                    if self.peek_second().is_some_and(is_ident_start) {
                        let path = self.lex_field_chain();
                        self.push(TokenKind::Field(path), pos);
                    } else {
                        self.advance(1);
                        self.push(TokenKind::Dot, pos);
                    }
                }
                '$' => {
                    self.advance(1);
                    let path = self.lex_field_chain();
                    self.push(TokenKind::Variable(path), pos);
                }
                c if c.is_ascii_digit()
                    || (c == '-' && self.peek_second().is_some_and(|n| n.is_ascii_digit())) =>
                {
                    let kind = self.lex_number()?;
                    self.push(kind, pos);
                }
                c if is_ident_start(c) => {
                    let ident = self.take_while(is_ident_char);
                    let kind = match ident {
                        "true" => TokenKind::Bool(true),
                        "false" => TokenKind::Bool(false),
                        "nil" => TokenKind::Nil,
                        other => match Keyword::from_ident(other) {
                            Some(keyword) => TokenKind::Keyword(keyword),
                            None => TokenKind::Ident(other.to_string()),
                        },
                    };
                    self.push(kind, pos);
                }
                other => {
                    return self.error(format!("unexpected {:?} in action", other));
                }
            }
        }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let rest = self.rest();
        let len = rest.find(|c: char| !pred(c)).unwrap_or(rest.len());
        self.advance(len);
        &rest[..len]
    }

    /// `.a.b.c` → `["a", "b", "c"]`. Stops at the first `.` not followed by
    /// an identifier.
    fn lex_field_chain(&mut self) -> Vec<String> {
        let mut path = Vec::new();
        while self.peek() == Some('.') && self.peek_second().is_some_and(is_ident_start) {
            self.advance(1);
            path.push(self.take_while(is_ident_char).to_string());
        }
        path
    }

    fn lex_number(&mut self) -> Result<TokenKind, LexError> {
        let pos = self.pos;
        let rest = self.rest();
        let mut len = usize::from(rest.starts_with('-'));
        let digits = |s: &str| s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
        len += digits(&rest[len..]);
        let mut is_float = false;
        if rest[len..].starts_with('.') && rest[len + 1..].starts_with(|c: char| c.is_ascii_digit())
        {
            is_float = true;
            len += 1 + digits(&rest[len + 1..]);
        }
        let text = &rest[..len];
        self.advance(len);
        let parsed = if is_float {
            text.parse::<f64>().map(TokenKind::Float).ok()
        } else {
            text.parse::<i64>().map(TokenKind::Int).ok()
        };
        parsed.ok_or(LexError {
            message: format!("bad number syntax: {:?}", text),
            pos,
        })
    }

    fn lex_quoted(&mut self) -> Result<String, LexError> {
        let start = self.pos;
        self.advance(1);
        let mut out = String::new();
        loop {
            let Some(c) = self.peek() else {
                return Err(LexError {
                    message: "unterminated quoted string".to_string(),
                    pos: start,
                });
            };
            self.advance(c.len_utf8());
            match c {
                '"' => return Ok(out),
                '\n' => {
                    return Err(LexError {
                        message: "unterminated quoted string".to_string(),
                        pos: start,
                    });
                }
                '\\' => {
                    let Some(escaped) = self.peek() else {
                        continue;
                    };
                    self.advance(escaped.len_utf8());
                    match escaped {
                        'n' => out.push('\n'),
                        't' => out.push('\t'),
                        'r' => out.push('\r'),
                        '"' => out.push('"'),
                        '\\' => out.push('\\'),
                        other => return self.error(format!("unknown escape sequence \\{}", other)),
                    }
                }
                other => out.push(other),
            }
        }
    }

    fn lex_raw(&mut self) -> Result<String, LexError> {
        let start = self.pos;
        self.advance(1);
        let rest = self.rest();
        let Some(end) = rest.find('`') else {
            return Err(LexError {
                message: "unterminated raw quoted string".to_string(),
                pos: start,
            });
        };
        let s = rest[..end].to_string();
        self.advance(end + 1);
        Ok(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        lex(source)
            .expect("source should lex")
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    fn text(s: &str) -> TokenKind {
        TokenKind::Text(s.to_string())
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(kinds("hello world"), vec![text("hello world")]);
        assert_eq!(kinds(""), vec![]);
    }

    #[test]
    fn test_action_tokens() {
        assert_eq!(
            kinds(r#"a{{ .Title | printf "%s" 3 -1 2.5 }}b"#),
            vec![
                text("a"),
                TokenKind::ActionStart,
                TokenKind::Field(vec!["Title".to_string()]),
                TokenKind::Pipe,
                TokenKind::Ident("printf".to_string()),
                TokenKind::String("%s".to_string()),
                TokenKind::Int(3),
                TokenKind::Int(-1),
                TokenKind::Float(2.5),
                TokenKind::ActionEnd,
                text("b"),
            ]
        );
    }

    #[test]
    fn test_keywords_and_literals() {
        assert_eq!(
            kinds(r#"{{if true}}{{else}}{{end}}{{template "x" nil}}"#),
            vec![
                TokenKind::ActionStart,
                TokenKind::Keyword(Keyword::If),
                TokenKind::Bool(true),
                TokenKind::ActionEnd,
                TokenKind::ActionStart,
                TokenKind::Keyword(Keyword::Else),
                TokenKind::ActionEnd,
                TokenKind::ActionStart,
                TokenKind::Keyword(Keyword::End),
                TokenKind::ActionEnd,
                TokenKind::ActionStart,
                TokenKind::Keyword(Keyword::Template),
                TokenKind::String("x".to_string()),
                TokenKind::Nil,
                TokenKind::ActionEnd,
            ]
        );
    }

    #[test]
    fn test_dot_and_variables() {
        assert_eq!(
            kinds("{{.}}{{$}}{{$.Site.Name}}"),
            vec![
                TokenKind::ActionStart,
                TokenKind::Dot,
                TokenKind::ActionEnd,
                TokenKind::ActionStart,
                TokenKind::Variable(vec![]),
                TokenKind::ActionEnd,
                TokenKind::ActionStart,
                TokenKind::Variable(vec!["Site".to_string(), "Name".to_string()]),
                TokenKind::ActionEnd,
            ]
        );
    }

    #[test]
    fn test_trim_markers() {
        assert_eq!(
            kinds("a  \n {{- .X -}} \n b"),
            vec![
                text("a"),
                TokenKind::ActionStart,
                TokenKind::Field(vec!["X".to_string()]),
                TokenKind::ActionEnd,
                text("b"),
            ]
        );
    }

    #[test]
    fn test_comments_produce_nothing() {
        assert_eq!(kinds("a{{/* note */}}b"), vec![text("a"), text("b")]);
        assert_eq!(kinds("a {{- /* note */ -}} b"), vec![text("a"), text("b")]);
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            kinds(r#"{{"a\"b\n"}}{{`raw\n`}}"#),
            vec![
                TokenKind::ActionStart,
                TokenKind::String("a\"b\n".to_string()),
                TokenKind::ActionEnd,
                TokenKind::ActionStart,
                TokenKind::String("raw\\n".to_string()),
                TokenKind::ActionEnd,
            ]
        );
    }

    #[test]
    fn test_positions() {
        let tokens = lex("line1\n  {{ .X }}").unwrap();
        assert_eq!(tokens[1].pos, Pos { line: 2, column: 3 });
        assert_eq!(tokens[2].pos, Pos { line: 2, column: 6 });
    }

    #[test]
    fn test_errors() {
        assert_eq!(lex("{{ .X").unwrap_err().message, "unclosed action");
        assert_eq!(lex("{{/* x").unwrap_err().message, "unclosed comment");
        assert_eq!(
            lex(r#"{{ "abc }}"#).unwrap_err().message,
            "unterminated quoted string"
        );
        assert!(lex("{{ # }}").unwrap_err().message.contains("unexpected"));
    }
}
