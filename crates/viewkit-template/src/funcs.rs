/*
 * funcs.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Function maps bound into template groups.
//!
//! A [`FuncMap`] is a plain name → function table. Groups hold it behind an
//! `Arc`, so once bound it is shared read-only by the group and every clone.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::value::TemplateValue;

/// Error returned by a template function.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct FuncError {
    pub message: String,
}

impl FuncError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Wrong number of arguments.
    pub fn arity(expected: &str, got: usize) -> Self {
        Self::new(format!("wrong number of args: want {}, got {}", expected, got))
    }

    /// Argument of the wrong type.
    pub fn arg_type(index: usize, expected: &str, got: &TemplateValue) -> Self {
        Self::new(format!(
            "arg {}: expected {}, got {}",
            index,
            expected,
            got.type_name()
        ))
    }
}

/// Result type for template functions.
pub type FuncResult = Result<TemplateValue, FuncError>;

/// A callable usable from template actions.
pub type TemplateFn = Arc<dyn Fn(&[TemplateValue]) -> FuncResult + Send + Sync>;

/// A mapping from function name to callable.
///
/// Later insertions under the same name replace earlier ones.
#[derive(Clone, Default)]
pub struct FuncMap {
    funcs: HashMap<String, TemplateFn>,
}

impl FuncMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a function, replacing any previous one with the same name.
    pub fn insert<F>(&mut self, name: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(&[TemplateValue]) -> FuncResult + Send + Sync + 'static,
    {
        self.funcs.insert(name.into(), Arc::new(f));
        self
    }

    /// Register an already shared function.
    pub fn insert_shared(&mut self, name: impl Into<String>, f: TemplateFn) -> &mut Self {
        self.funcs.insert(name.into(), f);
        self
    }

    /// Builder-style variant of [`FuncMap::insert`].
    pub fn with<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&[TemplateValue]) -> FuncResult + Send + Sync + 'static,
    {
        self.insert(name, f);
        self
    }

    /// Merge `other` into this map; entries from `other` win on collision.
    pub fn extend(&mut self, other: &FuncMap) -> &mut Self {
        for (name, f) in &other.funcs {
            self.funcs.insert(name.clone(), Arc::clone(f));
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&TemplateFn> {
        self.funcs.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.funcs.contains_key(name)
    }

    /// Function names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.funcs.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.funcs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.funcs.is_empty()
    }
}

impl fmt::Debug for FuncMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}
