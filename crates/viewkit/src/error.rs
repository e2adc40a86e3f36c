/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Error types for the template registry.

use std::io;
use std::path::PathBuf;
use thiserror::Error;
use viewkit_fs::FsError;
use viewkit_template::TemplateError;

use crate::source::SourceId;

/// A failure while loading templates from one content source.
#[derive(Debug, Error)]
pub enum LoadError {
    /// A directory of the source exists but could not be read.
    #[error("source {source_id}: cannot access {}: {source}", .path.display())]
    SourceAccess {
        source_id: SourceId,
        path: PathBuf,
        #[source]
        source: FsError,
    },

    /// A layout, partial or page failed to parse.
    #[error("source {source_id}: {source}")]
    Parse {
        source_id: SourceId,
        path: PathBuf,
        #[source]
        source: TemplateError,
    },

    /// A page path could not be turned into a page identifier.
    #[error("source {source_id}: cannot derive a page identifier from {}", .path.display())]
    PathResolution { source_id: SourceId, path: PathBuf },
}

impl LoadError {
    pub fn source_id(&self) -> &SourceId {
        match self {
            LoadError::SourceAccess { source_id, .. }
            | LoadError::Parse { source_id, .. }
            | LoadError::PathResolution { source_id, .. } => source_id,
        }
    }
}

/// Errors reported by [`TemplateAdapter`](crate::TemplateAdapter).
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("error loading partials: {0}")]
    CommonTemplates(#[source] LoadError),

    #[error("error compiling pages: {0}")]
    Pages(#[source] LoadError),

    #[error("page not found: {0}")]
    PageNotFound(String),

    #[error("error rendering page {id}: {source}")]
    Render {
        id: String,
        #[source]
        source: TemplateError,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors reading adapter configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid adapter configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid source id {0:?}: source ids must not contain ':'")]
    InvalidSourceId(String),

    #[error("source {0} is configured more than once")]
    DuplicateSource(SourceId),
}

/// Error type used while walking a source directory: either the walk itself
/// failed, or the visitor did.
#[derive(Debug)]
pub(crate) enum WalkError {
    Fs(FsError),
    Load(LoadError),
}

impl From<FsError> for WalkError {
    fn from(e: FsError) -> Self {
        WalkError::Fs(e)
    }
}

impl From<LoadError> for WalkError {
    fn from(e: LoadError) -> Self {
        WalkError::Load(e)
    }
}

impl WalkError {
    /// Attach the source and directory being walked to a bare filesystem
    /// error.
    pub(crate) fn into_load_error(self, source_id: &SourceId, dir: &std::path::Path) -> LoadError {
        match self {
            WalkError::Fs(source) => LoadError::SourceAccess {
                source_id: source_id.clone(),
                path: dir.to_path_buf(),
                source,
            },
            WalkError::Load(e) => e,
        }
    }
}
