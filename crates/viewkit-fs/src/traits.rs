/*
 * traits.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Defines the ContentFs trait and supporting types for reading content sources.
 */

use std::fmt::Debug;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for content filesystem operations
pub type FsResult<T> = Result<T, FsError>;

/// Errors that can occur while reading a content source
#[derive(Debug, Error)]
pub enum FsError {
    /// The path does not exist in this content source
    #[error("Path not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Underlying I/O failure (permissions, broken links, ...)
    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// File contents are not valid UTF-8
    #[error("Invalid UTF-8 in file: {}", .0.display())]
    InvalidUtf8(PathBuf),

    /// Path escapes the root of the content source
    #[error("Path outside content root: {}", .0.display())]
    PathOutsideRoot(PathBuf),
}

impl FsError {
    /// Wrap an I/O error, mapping `NotFound` to the dedicated variant.
    pub fn from_io(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            FsError::NotFound(path.to_path_buf())
        } else {
            FsError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }

    /// Whether this error only says the path is missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, FsError::NotFound(_))
    }
}

/// Kind of a directory entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Regular file
    File,
    /// Directory
    Directory,
}

/// An entry returned by `ContentFs::read_dir`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Path relative to the content root (includes the listed directory)
    pub path: PathBuf,
    /// Entry kind
    pub kind: EntryKind,
}

impl DirEntry {
    pub fn new(path: impl Into<PathBuf>, kind: EntryKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    /// The final path component as a string (empty if not UTF-8).
    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("")
    }
}

/// Read-only access to one content source.
///
/// Every path is relative to the root of the source. Implementations must be
/// usable from several threads since a registry may be rebuilt off the
/// rendering threads.
pub trait ContentFs: Send + Sync + Debug {
    /// Stat a path.
    ///
    /// Returns `FsError::NotFound` when the path is missing; any other error
    /// means the path exists but cannot be accessed.
    fn metadata(&self, path: &Path) -> FsResult<EntryKind>;

    /// List the direct children of a directory, sorted by file name.
    fn read_dir(&self, path: &Path) -> FsResult<Vec<DirEntry>>;

    /// Read a file as UTF-8 text.
    fn read_to_string(&self, path: &Path) -> FsResult<String>;

    /// Check whether a path exists.
    ///
    /// Only a missing path yields `Ok(false)`; access failures are errors.
    fn exists(&self, path: &Path) -> FsResult<bool> {
        match self.metadata(path) {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// List every entry below `root` (not including `root` itself).
    ///
    /// Order is depth-first with siblings sorted by name, and a directory
    /// precedes its contents.
    fn walk_paths(&self, root: &Path) -> FsResult<Vec<DirEntry>> {
        let mut out = Vec::new();
        collect_entries(self, root, &mut out)?;
        Ok(out)
    }
}

fn collect_entries<F: ContentFs + ?Sized>(
    fs: &F,
    dir: &Path,
    out: &mut Vec<DirEntry>,
) -> FsResult<()> {
    for entry in fs.read_dir(dir)? {
        let is_dir = entry.kind == EntryKind::Directory;
        let path = entry.path.clone();
        out.push(entry);
        if is_dir {
            collect_entries(fs, &path, out)?;
        }
    }
    Ok(())
}

/// Callback invoked for every entry of a walk.
pub trait Visitor {
    /// Error type; must absorb filesystem errors raised by the walk itself.
    type Error: From<FsError>;

    fn visit(&mut self, path: &Path, kind: EntryKind) -> Result<(), Self::Error>;
}

/// Walk the subtree under `root`, handing each entry to `visitor`.
///
/// The first error, from the filesystem or the visitor, stops the walk.
pub fn walk<F, V>(fs: &F, root: &Path, visitor: &mut V) -> Result<(), V::Error>
where
    F: ContentFs + ?Sized,
    V: Visitor,
{
    for entry in fs.walk_paths(root)? {
        visitor.visit(&entry.path, entry.kind)?;
    }
    Ok(())
}

/// Normalize a content-relative path: drop `.` components and any leading
/// root, reject `..`.
pub(crate) fn normalize_relative(path: &Path) -> FsResult<PathBuf> {
    use std::path::Component;

    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => normalized.push(part),
            Component::CurDir | Component::RootDir => {}
            Component::ParentDir | Component::Prefix(_) => {
                return Err(FsError::PathOutsideRoot(path.to_path_buf()));
            }
        }
    }
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_normalize_relative() {
        assert_eq!(
            normalize_relative(Path::new("./views/a.html")).unwrap(),
            PathBuf::from("views/a.html")
        );
        assert_eq!(
            normalize_relative(Path::new("/views")).unwrap(),
            PathBuf::from("views")
        );
        assert_eq!(normalize_relative(Path::new(".")).unwrap(), PathBuf::new());
        assert!(matches!(
            normalize_relative(Path::new("views/../../etc")),
            Err(FsError::PathOutsideRoot(_))
        ));
    }

    #[test]
    fn test_from_io_maps_not_found() {
        let err = FsError::from_io(
            Path::new("missing"),
            io::Error::new(io::ErrorKind::NotFound, "gone"),
        );
        assert!(err.is_not_found());

        let err = FsError::from_io(
            Path::new("locked"),
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(!err.is_not_found());
        assert!(err.to_string().contains("locked"));
    }
}
