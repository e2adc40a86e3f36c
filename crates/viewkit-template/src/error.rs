/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Error types for template parsing and execution.

use std::path::PathBuf;
use thiserror::Error;
use viewkit_fs::FsError;

/// Errors that can occur during template operations.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// Malformed template syntax, or a call to a function that is not bound.
    #[error("template: {name}:{line}:{column}: {message}")]
    Parse {
        name: String,
        line: usize,
        column: usize,
        message: String,
    },

    /// A `{{template}}` call or execution request names an unknown template.
    #[error("template: no template {name:?} associated with group {group:?}")]
    UndefinedTemplate { name: String, group: String },

    /// Error evaluating an action.
    #[error("template: {name}: {message}")]
    Execution { name: String, message: String },

    /// A bound or built-in function returned an error.
    #[error("template: {template}: error calling {function}: {message}")]
    Function {
        template: String,
        function: String,
        message: String,
    },

    /// Nested `{{template}}` calls exceeded the depth limit.
    #[error("template: {name}: exceeded maximum template depth ({max_depth})")]
    RecursionLimit { name: String, max_depth: usize },

    /// A template file could not be read.
    #[error("template: reading {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: FsError,
    },
}

/// Result type for template operations.
pub type TemplateResult<T> = Result<T, TemplateError>;
