/*
 * viewkit-template
 * Copyright (c) 2025 Posit, PBC
 *
 * Text templates organised in named groups.
 *
 * A `TemplateGroup` holds a namespace of named templates that can invoke
 * each other with `{{template "name" .}}`. Files contribute their top-level
 * content under their file name plus every `{{define}}` and `{{block}}` they
 * contain. Groups are cheap to clone and clones are isolated from each
 * other, which lets many pages share one parsed set of layouts and partials.
 *
 * Syntax overview:
 * - `{{.Field}}`, `{{$.Field}}`, `{{.}}`: output a value
 * - `{{ .Title | upper }}`: pipelines pass each result as the last argument
 * - `{{if}}`, `{{else if}}`, `{{else}}`, `{{range}}`, `{{with}}`, `{{end}}`
 * - `{{define "x"}}`, `{{template "x" .}}`, `{{block "x" .}}default{{end}}`;
 *   `{{define}}` may only appear at the top level of a file
 * - `{{- ` and ` -}}` trim surrounding whitespace; `{{/* */}}` is a comment
 */

pub mod ast;
pub mod builtins;
pub mod error;
mod evaluator;
pub mod funcs;
mod group;
pub mod lexer;
pub mod parser;
pub mod value;

pub use error::{TemplateError, TemplateResult};
pub use evaluator::MAX_TEMPLATE_DEPTH;
pub use funcs::{FuncError, FuncMap, FuncResult, TemplateFn};
pub use group::TemplateGroup;
pub use value::TemplateValue;
