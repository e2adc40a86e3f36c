/*
 * source.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Content sources: named filesystem roots that templates are read from.

use std::fmt;
use std::sync::Arc;

use viewkit_fs::ContentFs;

/// Identifier written in configuration for the root source.
pub const ROOT_SOURCE_ID: &str = "root";

/// Identifier of a content source.
///
/// Pages from the root source are registered without a prefix; pages from a
/// named source are registered as `<name>:<page>`.
///
/// Sources are ordered root first, then named sources by name. Every phase of
/// initialization processes sources in this order, which makes "last write
/// wins" collisions between sources deterministic.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SourceId {
    Root,
    Named(String),
}

impl SourceId {
    pub fn named(name: impl Into<String>) -> Self {
        SourceId::Named(name.into())
    }

    pub fn is_root(&self) -> bool {
        matches!(self, SourceId::Root)
    }

    /// Namespace prefix for page identifiers, `None` for the root source.
    pub fn prefix(&self) -> Option<&str> {
        match self {
            SourceId::Root => None,
            SourceId::Named(name) => Some(name),
        }
    }
}

/// `""` and `"root"` name the root source.
impl From<&str> for SourceId {
    fn from(s: &str) -> Self {
        if s.is_empty() || s == ROOT_SOURCE_ID {
            SourceId::Root
        } else {
            SourceId::Named(s.to_string())
        }
    }
}

impl From<String> for SourceId {
    fn from(s: String) -> Self {
        SourceId::from(s.as_str())
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceId::Root => f.write_str(ROOT_SOURCE_ID),
            SourceId::Named(name) => f.write_str(name),
        }
    }
}

/// The set of content sources an adapter reads from, kept in [`SourceId`]
/// order.
#[derive(Debug, Clone, Default)]
pub struct ContentSources {
    sources: Vec<(SourceId, Arc<dyn ContentFs>)>,
}

impl ContentSources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a source, replacing any existing source with the same id.
    pub fn insert(&mut self, id: impl Into<SourceId>, fs: Arc<dyn ContentFs>) -> &mut Self {
        let id = id.into();
        match self.sources.binary_search_by(|(existing, _)| existing.cmp(&id)) {
            Ok(index) => self.sources[index].1 = fs,
            Err(index) => self.sources.insert(index, (id, fs)),
        }
        self
    }

    /// Builder-style variant of [`ContentSources::insert`].
    pub fn with(mut self, id: impl Into<SourceId>, fs: impl ContentFs + 'static) -> Self {
        self.insert(id, Arc::new(fs));
        self
    }

    pub fn get(&self, id: &SourceId) -> Option<&Arc<dyn ContentFs>> {
        self.sources
            .binary_search_by(|(existing, _)| existing.cmp(id))
            .ok()
            .map(|index| &self.sources[index].1)
    }

    /// Sources in processing order.
    pub fn iter(&self) -> impl Iterator<Item = (&SourceId, &dyn ContentFs)> {
        self.sources.iter().map(|(id, fs)| (id, fs.as_ref()))
    }

    pub fn ids(&self) -> Vec<&SourceId> {
        self.sources.iter().map(|(id, _)| id).collect()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use viewkit_fs::MemoryFs;

    #[test]
    fn test_source_id_from_str() {
        assert_eq!(SourceId::from(""), SourceId::Root);
        assert_eq!(SourceId::from("root"), SourceId::Root);
        assert_eq!(SourceId::from("blog"), SourceId::named("blog"));
        assert_eq!(SourceId::Root.to_string(), "root");
        assert_eq!(SourceId::named("blog").prefix(), Some("blog"));
        assert_eq!(SourceId::Root.prefix(), None);
    }

    #[test]
    fn test_sources_are_ordered_root_first() {
        let sources = ContentSources::new()
            .with("zeta", MemoryFs::new())
            .with("alpha", MemoryFs::new())
            .with(SourceId::Root, MemoryFs::new());

        let ids: Vec<String> = sources.iter().map(|(id, _)| id.to_string()).collect();
        assert_eq!(ids, vec!["root", "alpha", "zeta"]);
    }

    #[test]
    fn test_insert_replaces_same_id() {
        let mut sources = ContentSources::new();
        sources.insert("blog", Arc::new(MemoryFs::with_files([("a.html", "a")])));
        sources.insert("blog", Arc::new(MemoryFs::with_files([("b.html", "b")])));
        assert_eq!(sources.len(), 1);

        let fs = sources.get(&SourceId::named("blog")).unwrap();
        assert!(fs.exists(std::path::Path::new("b.html")).unwrap());
        assert!(!fs.exists(std::path::Path::new("a.html")).unwrap());
    }
}
