/*
 * builtins.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Functions every template group can call.
//!
//! A function bound through a [`FuncMap`](crate::FuncMap) with the same name
//! takes precedence over the built-in one.

use std::cmp::Ordering;

use crate::funcs::{FuncError, FuncResult};
use crate::value::TemplateValue;

type Builtin = fn(&[TemplateValue]) -> FuncResult;

/// Names of all built-in functions.
pub const BUILTIN_NAMES: &[&str] = &[
    "and", "eq", "ge", "gt", "index", "le", "len", "lt", "ne", "not", "or", "print",
];

/// Look up a built-in function by name.
pub fn lookup(name: &str) -> Option<Builtin> {
    let f: Builtin = match name {
        "and" => and,
        "or" => or,
        "not" => not,
        "len" => len,
        "index" => index,
        "print" => print,
        "eq" => eq,
        "ne" => ne,
        "lt" => |args| compare(args, |o| o == Ordering::Less),
        "le" => |args| compare(args, |o| o != Ordering::Greater),
        "gt" => |args| compare(args, |o| o == Ordering::Greater),
        "ge" => |args| compare(args, |o| o != Ordering::Less),
        _ => return None,
    };
    Some(f)
}

/// First falsy argument, or the last argument.
fn and(args: &[TemplateValue]) -> FuncResult {
    let Some(last) = args.last() else {
        return Err(FuncError::arity("at least 1", 0));
    };
    Ok(args
        .iter()
        .find(|v| !v.is_truthy())
        .unwrap_or(last)
        .clone())
}

/// First truthy argument, or the last argument.
fn or(args: &[TemplateValue]) -> FuncResult {
    let Some(last) = args.last() else {
        return Err(FuncError::arity("at least 1", 0));
    };
    Ok(args.iter().find(|v| v.is_truthy()).unwrap_or(last).clone())
}

fn not(args: &[TemplateValue]) -> FuncResult {
    match args {
        [value] => Ok(TemplateValue::Bool(!value.is_truthy())),
        _ => Err(FuncError::arity("1", args.len())),
    }
}

fn len(args: &[TemplateValue]) -> FuncResult {
    let [value] = args else {
        return Err(FuncError::arity("1", args.len()));
    };
    let n = match value {
        TemplateValue::String(s) => s.chars().count(),
        TemplateValue::List(items) => items.len(),
        TemplateValue::Map(m) => m.len(),
        TemplateValue::Null => 0,
        other => {
            return Err(FuncError::new(format!(
                "len of type {}",
                other.type_name()
            )));
        }
    };
    Ok(TemplateValue::from(n))
}

/// `index x 1 "key"` walks into lists by integer and maps by string.
fn index(args: &[TemplateValue]) -> FuncResult {
    let Some((first, keys)) = args.split_first() else {
        return Err(FuncError::arity("at least 1", 0));
    };
    let mut current = first.clone();
    for key in keys {
        current = match (&current, key) {
            (TemplateValue::List(items), TemplateValue::Int(i)) => usize::try_from(*i)
                .ok()
                .and_then(|i| items.get(i))
                .cloned()
                .ok_or_else(|| FuncError::new(format!("index out of range: {}", i)))?,
            (TemplateValue::Map(m), TemplateValue::String(k)) => {
                m.get(k).cloned().unwrap_or(TemplateValue::Null)
            }
            (TemplateValue::Null, _) => TemplateValue::Null,
            (container, key) => {
                return Err(FuncError::new(format!(
                    "can't index item of type {} with {}",
                    container.type_name(),
                    key.type_name()
                )));
            }
        };
    }
    Ok(current)
}

/// Concatenate the rendered arguments, adding spaces between operands when
/// neither side is a string.
fn print(args: &[TemplateValue]) -> FuncResult {
    let mut out = String::new();
    for (i, arg) in args.iter().enumerate() {
        let is_string = matches!(arg, TemplateValue::String(_));
        if i > 0 && !is_string && !matches!(args[i - 1], TemplateValue::String(_)) {
            out.push(' ');
        }
        out.push_str(&arg.render());
    }
    Ok(TemplateValue::String(out))
}

fn values_equal(a: &TemplateValue, b: &TemplateValue) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

/// `eq a b c` is true when `a` equals any of the following arguments.
fn eq(args: &[TemplateValue]) -> FuncResult {
    let Some((first, rest)) = args.split_first() else {
        return Err(FuncError::arity("at least 2", 0));
    };
    if rest.is_empty() {
        return Err(FuncError::arity("at least 2", 1));
    }
    Ok(TemplateValue::Bool(rest.iter().any(|v| values_equal(first, v))))
}

fn ne(args: &[TemplateValue]) -> FuncResult {
    match args {
        [a, b] => Ok(TemplateValue::Bool(!values_equal(a, b))),
        _ => Err(FuncError::arity("2", args.len())),
    }
}

fn ordering(a: &TemplateValue, b: &TemplateValue) -> Result<Ordering, FuncError> {
    match (a, b) {
        (TemplateValue::Int(x), TemplateValue::Int(y)) => Ok(x.cmp(y)),
        (TemplateValue::String(x), TemplateValue::String(y)) => Ok(x.cmp(y)),
        _ => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x
                .partial_cmp(&y)
                .ok_or_else(|| FuncError::new("cannot compare NaN")),
            _ => Err(FuncError::new(format!(
                "incompatible types for comparison: {} and {}",
                a.type_name(),
                b.type_name()
            ))),
        },
    }
}

fn compare(args: &[TemplateValue], accept: fn(Ordering) -> bool) -> FuncResult {
    match args {
        [a, b] => Ok(TemplateValue::Bool(accept(ordering(a, b)?))),
        _ => Err(FuncError::arity("2", args.len())),
    }
}
