/*
 * identifier.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Page identifiers.
//!
//! A page's identifier is its path below the source's `views/` directory,
//! `/`-separated, with the template extension removed. Pages from a named
//! source get a `<source>:` prefix: `views/a/b.html` is `a/b` in the root
//! source and `blog:a/b` in source `blog`.

use std::path::{Component, Path};

use crate::source::SourceId;

/// Derive the identifier for `path` (relative to the source root) below
/// `views_dir`. Returns `None` if the path is not below `views_dir`, is not
/// valid UTF-8, or does not end with `extension`.
pub fn page_id(source_id: &SourceId, views_dir: &Path, path: &Path, extension: &str) -> Option<String> {
    let relative = path.strip_prefix(views_dir).ok()?;

    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str()?),
            Component::CurDir => {}
            _ => return None,
        }
    }
    let joined = parts.join("/");
    let stem = joined.strip_suffix(extension)?;
    if stem.is_empty() || stem.ends_with('/') {
        return None;
    }

    Some(match source_id.prefix() {
        Some(prefix) => format!("{}:{}", prefix, stem),
        None => stem.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(source: &SourceId, path: &str) -> Option<String> {
        page_id(source, Path::new("views"), Path::new(path), ".html")
    }

    #[test]
    fn test_root_and_named_sources() {
        assert_eq!(id(&SourceId::Root, "views/a/b.html").as_deref(), Some("a/b"));
        assert_eq!(
            id(&SourceId::named("blog"), "views/a/b.html").as_deref(),
            Some("blog:a/b")
        );
        assert_eq!(id(&SourceId::Root, "views/index.html").as_deref(), Some("index"));
    }

    #[test]
    fn test_only_the_configured_extension_is_stripped() {
        assert_eq!(
            id(&SourceId::Root, "views/report.pdf.html").as_deref(),
            Some("report.pdf")
        );
        assert_eq!(
            page_id(
                &SourceId::Root,
                Path::new("views"),
                Path::new("views/home.tmpl"),
                ".tmpl"
            )
            .as_deref(),
            Some("home")
        );
    }

    #[test]
    fn test_unresolvable_paths() {
        assert_eq!(id(&SourceId::Root, "partials/a.html"), None);
        assert_eq!(id(&SourceId::Root, "views/a.txt"), None);
        assert_eq!(id(&SourceId::Root, "views/.html"), None);
    }
}
