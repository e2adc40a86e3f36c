/*
 * adapter.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The template registry.
//!
//! [`TemplateAdapter::initialize`] builds a complete page map off to the side
//! and publishes it with a single atomic store. Readers load the current map
//! without locking and never observe a partially built one; a failed
//! initialization leaves the previous map in place.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use arc_swap::ArcSwap;
use viewkit_template::{FuncMap, TemplateValue};

use crate::common::build_common_base;
use crate::config::{AdapterConfig, TemplateAdapterOptions, normalize_extension};
use crate::error::AdapterError;
use crate::funcs::FunctionEnvironment;
use crate::pages::{CompiledPage, compile_pages};
use crate::source::{ContentSources, SourceId};

/// Page id → compiled page.
pub type PageMap = HashMap<String, Arc<CompiledPage>>;

/// One registered page and the templates it can reach.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSummary {
    pub id: String,
    pub source_id: SourceId,
    pub templates: Vec<String>,
}

/// Discovers layouts, partials and views across content sources and keeps
/// the compiled pages for lookup.
#[derive(Debug)]
pub struct TemplateAdapter {
    extension: String,
    sources: ContentSources,
    funcs: Arc<FuncMap>,
    logger: Option<tracing::Dispatch>,
    registry: ArcSwap<PageMap>,
}

impl TemplateAdapter {
    /// Create an adapter with an empty registry. Nothing is read until
    /// [`TemplateAdapter::initialize`] is called.
    pub fn new(options: TemplateAdapterOptions) -> Self {
        let funcs = FunctionEnvironment::builder()
            .with_defaults()
            .extend(&options.funcs)
            .build();

        Self {
            extension: normalize_extension(&options.extension),
            sources: options.sources,
            funcs,
            logger: options.logger,
            registry: ArcSwap::from_pointee(PageMap::new()),
        }
    }

    /// Create an adapter from a YAML configuration file. Relative source
    /// directories resolve against the file's directory.
    pub fn from_config_file(path: impl AsRef<Path>) -> Result<Self, AdapterError> {
        let path = path.as_ref();
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let options = AdapterConfig::load(path)?.into_options(base_dir)?;
        Ok(Self::new(options))
    }

    /// Run `f` with the adapter's logger as the default subscriber, if one
    /// was configured.
    fn with_logger<R>(&self, f: impl FnOnce() -> R) -> R {
        match &self.logger {
            Some(dispatch) => tracing::dispatcher::with_default(dispatch, f),
            None => f(),
        }
    }

    /// Rebuild the registry from the content sources.
    ///
    /// On success the new registry replaces the old one in a single store.
    /// On failure the previously published registry stays visible. Calls are
    /// not coordinated with each other; callers reloading from several
    /// threads should serialize them.
    pub fn initialize(&self) -> Result<(), AdapterError> {
        self.with_logger(|| {
            let started = Instant::now();

            let base = build_common_base(&self.sources, &self.funcs, &self.extension)
                .map_err(AdapterError::CommonTemplates)?;
            let pages = compile_pages(&self.sources, &base, &self.extension)
                .map_err(AdapterError::Pages)?;

            let count = pages.len();
            self.registry.store(Arc::new(pages));

            tracing::info!(
                sources = self.sources.len(),
                common_templates = base.template_names().len(),
                pages = count,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "template registry initialized"
            );
            Ok(())
        })
    }

    /// Find a compiled page by id. A missing page is `None`, not an error.
    pub fn lookup(&self, id: &str) -> Option<Arc<CompiledPage>> {
        self.registry.load().get(id).cloned()
    }

    /// Render a page by id.
    pub fn render(&self, id: &str, data: &TemplateValue) -> Result<String, AdapterError> {
        let page = self
            .lookup(id)
            .ok_or_else(|| AdapterError::PageNotFound(id.to_string()))?;
        page.render(data).map_err(|source| AdapterError::Render {
            id: id.to_string(),
            source,
        })
    }

    /// The currently published registry. The snapshot is unaffected by later
    /// initializations.
    pub fn pages(&self) -> Arc<PageMap> {
        self.registry.load_full()
    }

    /// Registered page ids, sorted.
    pub fn page_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.registry.load().keys().cloned().collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.registry.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.load().is_empty()
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn sources(&self) -> &ContentSources {
        &self.sources
    }

    /// The adapter's function environment: defaults plus overrides.
    pub fn functions(&self) -> &Arc<FuncMap> {
        &self.funcs
    }

    /// Every registered page with the templates it can reach, sorted by id.
    pub fn describe(&self) -> Vec<PageSummary> {
        let registry = self.registry.load();
        let mut summaries: Vec<PageSummary> = registry
            .values()
            .map(|page| PageSummary {
                id: page.id().to_string(),
                source_id: page.source_id().clone(),
                templates: page
                    .template_names()
                    .into_iter()
                    .map(String::from)
                    .collect(),
            })
            .collect();
        summaries.sort_by(|a, b| a.id.cmp(&b.id));
        summaries
    }

    /// Log every page and its templates at debug level.
    pub fn log_template_names(&self) {
        self.with_logger(|| {
            for summary in self.describe() {
                tracing::debug!(
                    page = %summary.id,
                    source = %summary.source_id,
                    templates = ?summary.templates,
                    "registered page"
                );
            }
        });
    }
}
