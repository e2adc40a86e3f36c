/*
 * funcs.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The function environment bound into every template an adapter parses.
//!
//! Each adapter builds its own environment from the default helpers plus the
//! caller's overrides. Nothing here is process-global, so two adapters with
//! different overrides never see each other's functions.

use std::collections::BTreeMap;
use std::sync::Arc;

use viewkit_template::{FuncError, FuncMap, FuncResult, TemplateValue};

/// Builder for an adapter's function map.
#[derive(Debug, Default)]
pub struct FunctionEnvironment {
    funcs: FuncMap,
}

impl FunctionEnvironment {
    pub fn builder() -> Self {
        Self::default()
    }

    /// Add the default helper set.
    pub fn with_defaults(mut self) -> Self {
        self.funcs.extend(&default_funcs());
        self
    }

    /// Merge caller-supplied functions; these replace defaults of the same
    /// name.
    pub fn extend(mut self, overrides: &FuncMap) -> Self {
        self.funcs.extend(overrides);
        self
    }

    /// Freeze the environment. The result is shared read-only by the common
    /// base and every compiled page.
    pub fn build(self) -> Arc<FuncMap> {
        Arc::new(self.funcs)
    }
}

/// The default helper functions.
pub fn default_funcs() -> FuncMap {
    FuncMap::new()
        .with("upper", |args| map_str(args, "upper", str::to_uppercase))
        .with("lower", |args| map_str(args, "lower", str::to_lowercase))
        .with("title", |args| map_str(args, "title", title_case))
        .with("trim", |args| map_str(args, "trim", |s| s.trim().to_string()))
        .with("slugify", |args| map_str(args, "slugify", slugify))
        .with("join", join)
        .with("split", split)
        .with("replace", replace)
        .with("contains", |args| {
            str_predicate(args, |needle, haystack| haystack.contains(needle))
        })
        .with("has_prefix", |args| {
            str_predicate(args, |prefix, s| s.starts_with(prefix))
        })
        .with("has_suffix", |args| {
            str_predicate(args, |suffix, s| s.ends_with(suffix))
        })
        .with("default", default_value)
        .with("add", |args| arithmetic(args, i64::checked_add, |a, b| a + b))
        .with("sub", |args| arithmetic(args, i64::checked_sub, |a, b| a - b))
        .with("list", |args| Ok(TemplateValue::List(args.to_vec())))
        .with("dict", dict)
        // Output is never escaped, so marking content safe is the identity
        .with("safe", |args| match args {
            [value] => Ok(value.clone()),
            _ => Err(FuncError::arity("1", args.len())),
        })
}

fn expect_str<'a>(args: &'a [TemplateValue], index: usize) -> Result<&'a str, FuncError> {
    args[index]
        .as_str()
        .ok_or_else(|| FuncError::arg_type(index, "string", &args[index]))
}

/// Apply a string transform to the single argument. Non-string values are
/// rendered first so `{{ .Count | upper }}` works on numbers too.
fn map_str(args: &[TemplateValue], name: &str, f: impl Fn(&str) -> String) -> FuncResult {
    match args {
        [TemplateValue::String(s)] => Ok(TemplateValue::String(f(s))),
        [other] => Ok(TemplateValue::String(f(&other.render()))),
        _ => Err(FuncError::new(format!(
            "{}: wrong number of args: want 1, got {}",
            name,
            args.len()
        ))),
    }
}

fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if at_word_start {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        at_word_start = !c.is_alphanumeric();
    }
    out
}

fn slugify(s: &str) -> String {
    let mut slug = String::with_capacity(s.len());
    for c in s.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            slug.push(c);
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// `join sep list`, also usable as `{{ .Tags | join ", " }}`.
fn join(args: &[TemplateValue]) -> FuncResult {
    let [sep, list] = args else {
        return Err(FuncError::arity("2", args.len()));
    };
    let sep = sep
        .as_str()
        .ok_or_else(|| FuncError::arg_type(0, "string", sep))?;
    match list {
        TemplateValue::List(items) => Ok(TemplateValue::String(
            items
                .iter()
                .map(TemplateValue::render)
                .collect::<Vec<_>>()
                .join(sep),
        )),
        TemplateValue::Null => Ok(TemplateValue::String(String::new())),
        other => Err(FuncError::arg_type(1, "list", other)),
    }
}

/// `split sep s`
fn split(args: &[TemplateValue]) -> FuncResult {
    if args.len() != 2 {
        return Err(FuncError::arity("2", args.len()));
    }
    let sep = expect_str(args, 0)?;
    let s = expect_str(args, 1)?;
    Ok(TemplateValue::List(
        s.split(sep).map(TemplateValue::from).collect(),
    ))
}

/// `replace old new s`
fn replace(args: &[TemplateValue]) -> FuncResult {
    if args.len() != 3 {
        return Err(FuncError::arity("3", args.len()));
    }
    let from = expect_str(args, 0)?;
    let to = expect_str(args, 1)?;
    let s = expect_str(args, 2)?;
    Ok(TemplateValue::String(s.replace(from, to)))
}

/// Predicates take the pattern first and the subject last, so they read
/// naturally in pipelines: `{{ if .Path | has_prefix "/docs" }}`.
fn str_predicate(args: &[TemplateValue], f: impl Fn(&str, &str) -> bool) -> FuncResult {
    if args.len() != 2 {
        return Err(FuncError::arity("2", args.len()));
    }
    let pattern = expect_str(args, 0)?;
    let subject = expect_str(args, 1)?;
    Ok(TemplateValue::Bool(f(pattern, subject)))
}

/// `default fallback value`: `value` when truthy, otherwise `fallback`.
fn default_value(args: &[TemplateValue]) -> FuncResult {
    match args {
        [fallback] => Ok(fallback.clone()),
        [fallback, value] => Ok(if value.is_truthy() {
            value.clone()
        } else {
            fallback.clone()
        }),
        _ => Err(FuncError::arity("1 or 2", args.len())),
    }
}

fn arithmetic(
    args: &[TemplateValue],
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> FuncResult {
    match args {
        [TemplateValue::Int(a), TemplateValue::Int(b)] => int_op(*a, *b)
            .map(TemplateValue::Int)
            .ok_or_else(|| FuncError::new("integer overflow")),
        [a, b] => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => Ok(TemplateValue::Float(float_op(x, y))),
            (None, _) => Err(FuncError::arg_type(0, "number", a)),
            (_, None) => Err(FuncError::arg_type(1, "number", b)),
        },
        _ => Err(FuncError::arity("2", args.len())),
    }
}

/// `dict "k1" v1 "k2" v2`
fn dict(args: &[TemplateValue]) -> FuncResult {
    if args.len() % 2 != 0 {
        return Err(FuncError::new("dict: odd number of arguments"));
    }
    let mut map = BTreeMap::new();
    for (i, pair) in args.chunks(2).enumerate() {
        let key = pair[0]
            .as_str()
            .ok_or_else(|| FuncError::arg_type(i * 2, "string key", &pair[0]))?;
        map.insert(key.to_string(), pair[1].clone());
    }
    Ok(TemplateValue::Map(map))
}
