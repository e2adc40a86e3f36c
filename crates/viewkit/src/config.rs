/*
 * config.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Adapter configuration.
//!
//! [`TemplateAdapterOptions`] is the programmatic form. [`AdapterConfig`] is
//! the file form, read from YAML:
//!
//! ```yaml
//! extension: .html
//! sources:
//!   root: site/templates
//!   blog: themes/blog
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use viewkit_fs::{ContentFs, DirFs};
use viewkit_template::{FuncMap, FuncResult, TemplateValue};

use crate::error::ConfigError;
use crate::source::{ContentSources, SourceId};

/// Extension used when none is configured.
pub const DEFAULT_EXTENSION: &str = ".html";

/// Normalize a template file extension: empty means [`DEFAULT_EXTENSION`],
/// and a leading dot is added when missing.
pub fn normalize_extension(extension: &str) -> String {
    let extension = extension.trim();
    if extension.is_empty() {
        DEFAULT_EXTENSION.to_string()
    } else if extension.starts_with('.') {
        extension.to_string()
    } else {
        format!(".{}", extension)
    }
}

/// Options for constructing a [`TemplateAdapter`](crate::TemplateAdapter).
#[derive(Debug, Clone, Default)]
pub struct TemplateAdapterOptions {
    /// Template file extension, normalized with [`normalize_extension`].
    pub extension: String,
    pub sources: ContentSources,
    /// Functions added to (or replacing) the default helpers.
    pub funcs: FuncMap,
    /// Subscriber for the adapter's diagnostics. Without one, events go to
    /// the current default subscriber.
    pub logger: Option<tracing::Dispatch>,
}

impl TemplateAdapterOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn with_source(mut self, id: impl Into<SourceId>, fs: impl ContentFs + 'static) -> Self {
        self.sources.insert(id, Arc::new(fs));
        self
    }

    pub fn with_shared_source(mut self, id: impl Into<SourceId>, fs: Arc<dyn ContentFs>) -> Self {
        self.sources.insert(id, fs);
        self
    }

    pub fn with_sources(mut self, sources: ContentSources) -> Self {
        self.sources = sources;
        self
    }

    pub fn with_funcs(mut self, funcs: FuncMap) -> Self {
        self.funcs = funcs;
        self
    }

    pub fn with_function<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&[TemplateValue]) -> FuncResult + Send + Sync + 'static,
    {
        self.funcs.insert(name, f);
        self
    }

    pub fn with_logger(mut self, logger: tracing::Dispatch) -> Self {
        self.logger = Some(logger);
        self
    }
}

/// File-based adapter configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AdapterConfig {
    /// Template file extension; defaults to `.html`.
    pub extension: Option<String>,
    /// Source id → directory. `root` (or an empty id) is the root source.
    pub sources: BTreeMap<String, PathBuf>,
}

impl AdapterConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Read a YAML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    /// Build adapter options with one [`DirFs`] per source. Relative
    /// directories resolve against `base_dir`.
    pub fn into_options(self, base_dir: impl AsRef<Path>) -> Result<TemplateAdapterOptions, ConfigError> {
        let base_dir = base_dir.as_ref();
        let mut sources = ContentSources::new();
        for (id, dir) in self.sources {
            if id.contains(':') {
                return Err(ConfigError::InvalidSourceId(id));
            }
            let id = SourceId::from(id);
            if sources.get(&id).is_some() {
                return Err(ConfigError::DuplicateSource(id));
            }
            let root = if dir.is_absolute() {
                dir
            } else {
                base_dir.join(dir)
            };
            tracing::debug!(source = %id, root = %root.display(), "configured content source");
            sources.insert(id, Arc::new(DirFs::new(root)));
        }

        Ok(TemplateAdapterOptions {
            extension: normalize_extension(self.extension.as_deref().unwrap_or_default()),
            sources,
            ..TemplateAdapterOptions::default()
        })
    }
}
