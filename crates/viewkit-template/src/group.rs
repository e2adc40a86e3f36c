/*
 * group.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Template groups: a namespace of named templates sharing one function map.
//!
//! Parsed trees are immutable and held behind `Arc`, so cloning a group only
//! copies the name → tree table. Parsing into a clone replaces entries in the
//! clone's own table and never touches the original or any sibling clone.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use viewkit_fs::ContentFs;

use crate::ast::Tree;
use crate::error::{TemplateError, TemplateResult};
use crate::evaluator;
use crate::funcs::FuncMap;
use crate::parser::parse;
use crate::value::TemplateValue;

/// A named set of templates that can call each other.
#[derive(Debug, Clone)]
pub struct TemplateGroup {
    name: String,
    entry: String,
    templates: HashMap<String, Arc<Tree>>,
    funcs: Arc<FuncMap>,
}

impl TemplateGroup {
    /// Create an empty group. The entry template defaults to `name`.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            entry: name.clone(),
            name,
            templates: HashMap::new(),
            funcs: Arc::new(FuncMap::new()),
        }
    }

    /// Builder-style variant of [`TemplateGroup::bind_functions`].
    pub fn with_functions(mut self, funcs: Arc<FuncMap>) -> Self {
        self.funcs = funcs;
        self
    }

    /// Bind the function map used when parsing and executing.
    ///
    /// Functions are resolved at parse time, so bind before parsing.
    pub fn bind_functions(&mut self, funcs: Arc<FuncMap>) -> &mut Self {
        self.funcs = funcs;
        self
    }

    pub fn functions(&self) -> &Arc<FuncMap> {
        &self.funcs
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parse `source` as template `name`, adding its definitions to the
    /// group. Nothing is added if parsing fails.
    pub fn parse_str(&mut self, name: &str, source: &str) -> TemplateResult<&mut Self> {
        let parsed = parse(name, source, &self.funcs)?;
        self.add(parsed.main);
        for tree in parsed.defines {
            self.add(tree);
        }
        Ok(self)
    }

    /// Read and parse each file, naming its top-level template after the
    /// file name (`layouts/base.html` parses as `base.html`).
    pub fn parse_fs<F, P>(&mut self, fs: &F, paths: &[P]) -> TemplateResult<&mut Self>
    where
        F: ContentFs + ?Sized,
        P: AsRef<Path>,
    {
        for path in paths {
            let path = path.as_ref();
            let source = fs.read_to_string(path).map_err(|source| TemplateError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            let name = path.file_name().map_or_else(
                || path.display().to_string(),
                |n| n.to_string_lossy().into_owned(),
            );
            self.parse_str(&name, &source)?;
            tracing::trace!(group = %self.name, template = %name, path = %path.display(), "parsed template file");
        }
        Ok(self)
    }

    fn add(&mut self, tree: Tree) {
        if let Some(existing) = self.templates.get(&tree.name) {
            if tree.is_empty() && !existing.is_empty() {
                return;
            }
        }
        self.templates.insert(tree.name.clone(), Arc::new(tree));
    }

    /// Choose which template [`TemplateGroup::execute`] runs.
    pub fn set_entry(&mut self, name: impl Into<String>) -> &mut Self {
        self.entry = name.into();
        self
    }

    pub fn entry(&self) -> &str {
        &self.entry
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    pub(crate) fn tree(&self, name: &str) -> Option<&Tree> {
        self.templates.get(name).map(Arc::as_ref)
    }

    /// Names of every template in the group, sorted.
    pub fn template_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.templates.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Execute the entry template.
    pub fn execute(&self, data: &TemplateValue) -> TemplateResult<String> {
        self.execute_template(&self.entry, data)
    }

    /// Execute the named template.
    pub fn execute_template(&self, name: &str, data: &TemplateValue) -> TemplateResult<String> {
        let tree = self
            .tree(name)
            .ok_or_else(|| TemplateError::UndefinedTemplate {
                name: name.to_string(),
                group: self.name.clone(),
            })?;
        evaluator::execute(self, tree, data)
    }
}
