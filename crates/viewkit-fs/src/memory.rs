/*
 * memory.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * In-memory content source, for tests and for templates bundled into a binary.
 */

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use crate::traits::{ContentFs, DirEntry, EntryKind, FsError, FsResult, normalize_relative};

/// In-memory content source.
///
/// Directories are implied by the files added to it: adding
/// `views/blog/post.html` creates `views` and `views/blog`.
#[derive(Debug, Clone, Default)]
pub struct MemoryFs {
    files: BTreeMap<PathBuf, String>,
    directories: BTreeSet<PathBuf>,
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a source from `(path, contents)` pairs.
    pub fn with_files(
        files: impl IntoIterator<Item = (impl AsRef<Path>, impl Into<String>)>,
    ) -> Self {
        let mut fs = Self::new();
        for (path, contents) in files {
            fs.add_file(path, contents);
        }
        fs
    }

    /// Add or replace a file, creating its parent directories.
    ///
    /// Paths containing `..` are ignored.
    pub fn add_file(&mut self, path: impl AsRef<Path>, contents: impl Into<String>) -> &mut Self {
        let Ok(normalized) = normalize_relative(path.as_ref()) else {
            return self;
        };
        if let Some(parent) = normalized.parent() {
            self.add_directory_and_parents(parent);
        }
        self.files.insert(normalized, contents.into());
        self
    }

    /// Add an empty directory (and its parents).
    pub fn add_directory(&mut self, path: impl AsRef<Path>) -> &mut Self {
        if let Ok(normalized) = normalize_relative(path.as_ref()) {
            self.add_directory_and_parents(&normalized);
        }
        self
    }

    /// Remove a file. Returns true if it existed.
    pub fn remove_file(&mut self, path: impl AsRef<Path>) -> bool {
        match normalize_relative(path.as_ref()) {
            Ok(normalized) => self.files.remove(&normalized).is_some(),
            Err(_) => false,
        }
    }

    fn add_directory_and_parents(&mut self, path: &Path) {
        let mut current = PathBuf::new();
        for component in path.components() {
            current.push(component);
            self.directories.insert(current.clone());
        }
    }

    fn is_root(path: &Path) -> bool {
        path.as_os_str().is_empty()
    }
}

impl ContentFs for MemoryFs {
    fn metadata(&self, path: &Path) -> FsResult<EntryKind> {
        let normalized = normalize_relative(path)?;
        if self.files.contains_key(&normalized) {
            Ok(EntryKind::File)
        } else if Self::is_root(&normalized) || self.directories.contains(&normalized) {
            Ok(EntryKind::Directory)
        } else {
            Err(FsError::NotFound(path.to_path_buf()))
        }
    }

    fn read_dir(&self, path: &Path) -> FsResult<Vec<DirEntry>> {
        let normalized = normalize_relative(path)?;
        if !Self::is_root(&normalized) && !self.directories.contains(&normalized) {
            return Err(FsError::NotFound(path.to_path_buf()));
        }

        let is_child = |candidate: &Path| candidate.parent() == Some(normalized.as_path());
        let mut entries: Vec<DirEntry> = self
            .files
            .keys()
            .filter(|p| is_child(p.as_path()))
            .map(|p| DirEntry::new(p.clone(), EntryKind::File))
            .chain(
                self.directories
                    .iter()
                    .filter(|p| is_child(p.as_path()))
                    .map(|p| DirEntry::new(p.clone(), EntryKind::Directory)),
            )
            .collect();
        entries.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));
        Ok(entries)
    }

    fn read_to_string(&self, path: &Path) -> FsResult<String> {
        let normalized = normalize_relative(path)?;
        self.files
            .get(&normalized)
            .cloned()
            .ok_or_else(|| FsError::NotFound(path.to_path_buf()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_implied_directories() {
        let fs = MemoryFs::with_files([("views/blog/post.html", "post")]);
        assert_eq!(fs.metadata(Path::new("views")).unwrap(), EntryKind::Directory);
        assert_eq!(
            fs.metadata(Path::new("views/blog")).unwrap(),
            EntryKind::Directory
        );
        assert_eq!(
            fs.metadata(Path::new("./views/blog/post.html")).unwrap(),
            EntryKind::File
        );
        assert!(fs.metadata(Path::new("partials")).unwrap_err().is_not_found());
    }

    #[test]
    fn test_read_dir_lists_direct_children() {
        let mut fs = MemoryFs::new();
        fs.add_file("views/b.html", "b")
            .add_file("views/a/c.html", "c")
            .add_directory("views/empty");

        let entries = fs.read_dir(Path::new("views")).unwrap();
        assert_eq!(
            entries,
            vec![
                DirEntry::new("views/a", EntryKind::Directory),
                DirEntry::new("views/b.html", EntryKind::File),
                DirEntry::new("views/empty", EntryKind::Directory),
            ]
        );
        assert!(fs.read_dir(Path::new("layouts")).is_err());
    }

    #[test]
    fn test_root_listing() {
        let fs = MemoryFs::with_files([("views/a.html", "a"), ("partials/p.html", "p")]);
        let names: Vec<_> = fs
            .read_dir(Path::new(""))
            .unwrap()
            .iter()
            .map(|e| e.file_name().to_string())
            .collect();
        assert_eq!(names, vec!["partials", "views"]);
    }

    #[test]
    fn test_replace_and_remove() {
        let mut fs = MemoryFs::new();
        fs.add_file("views/a.html", "one");
        fs.add_file("views/a.html", "two");
        assert_eq!(fs.read_to_string(Path::new("views/a.html")).unwrap(), "two");
        assert!(fs.remove_file("views/a.html"));
        assert!(!fs.remove_file("views/a.html"));
        assert!(fs.read_to_string(Path::new("views/a.html")).unwrap_err().is_not_found());
    }
}
