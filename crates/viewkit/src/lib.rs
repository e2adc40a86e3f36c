/*
 * viewkit
 * Copyright (c) 2025 Posit, PBC
 *
 * Template registry for sites assembled from several content sources.
 *
 * Each content source is a directory tree with up to three template
 * directories:
 *
 * - `layouts/`: page shells, read one level deep
 * - `partials/`: reusable fragments, read recursively
 * - `views/`: pages, read recursively
 *
 * Layouts and partials from all sources are parsed into one common base.
 * Every page is compiled into its own clone of that base, so pages share
 * layouts and partials without seeing each other's definitions. Pages are
 * registered under their path below `views/` without the extension, with a
 * `<source>:` prefix for sources other than the root.
 *
 * ```ignore
 * use viewkit::{SourceId, TemplateAdapter, TemplateAdapterOptions};
 * use viewkit_fs::DirFs;
 *
 * let adapter = TemplateAdapter::new(
 *     TemplateAdapterOptions::new()
 *         .with_source(SourceId::Root, DirFs::new("site"))
 *         .with_source("blog", DirFs::new("themes/blog")),
 * );
 * adapter.initialize()?;
 * let html = adapter.render("blog:post", &data)?;
 * ```
 */

mod adapter;
pub mod common;
pub mod config;
pub mod error;
pub mod funcs;
pub mod identifier;
pub mod pages;
pub mod source;

pub use adapter::{PageMap, PageSummary, TemplateAdapter};
pub use config::{AdapterConfig, DEFAULT_EXTENSION, TemplateAdapterOptions, normalize_extension};
pub use error::{AdapterError, ConfigError, LoadError};
pub use funcs::{FunctionEnvironment, default_funcs};
pub use pages::CompiledPage;
pub use source::{ContentSources, ROOT_SOURCE_ID, SourceId};

pub use viewkit_template::{FuncError, FuncMap, FuncResult, TemplateValue};
