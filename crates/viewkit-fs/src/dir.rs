/*
 * dir.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Native content source rooted at a directory on disk.
 */

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::traits::{ContentFs, DirEntry, EntryKind, FsError, FsResult, normalize_relative};

/// Content source backed by a directory on the local filesystem.
///
/// All paths are resolved against `root`; paths containing `..` are rejected.
#[derive(Debug, Clone)]
pub struct DirFs {
    root: PathBuf,
}

impl DirFs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The directory this source is rooted at.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &Path) -> FsResult<PathBuf> {
        Ok(self.root.join(normalize_relative(path)?))
    }

    fn relative(&self, full: &Path) -> FsResult<PathBuf> {
        full.strip_prefix(&self.root)
            .map(Path::to_path_buf)
            .map_err(|_| FsError::PathOutsideRoot(full.to_path_buf()))
    }
}

fn kind_of(file_type: std::fs::FileType) -> EntryKind {
    if file_type.is_dir() {
        EntryKind::Directory
    } else {
        EntryKind::File
    }
}

impl ContentFs for DirFs {
    fn metadata(&self, path: &Path) -> FsResult<EntryKind> {
        let full = self.resolve(path)?;
        let metadata = std::fs::metadata(&full).map_err(|e| FsError::from_io(path, e))?;
        Ok(kind_of(metadata.file_type()))
    }

    fn read_dir(&self, path: &Path) -> FsResult<Vec<DirEntry>> {
        let relative = normalize_relative(path)?;
        let full = self.root.join(&relative);
        let mut entries = Vec::new();
        for entry in std::fs::read_dir(&full).map_err(|e| FsError::from_io(path, e))? {
            let entry = entry.map_err(|e| FsError::from_io(path, e))?;
            // Follow symlinks so linked template directories behave like real ones
            let metadata =
                std::fs::metadata(entry.path()).map_err(|e| FsError::from_io(&entry.path(), e))?;
            entries.push(DirEntry::new(
                relative.join(entry.file_name()),
                kind_of(metadata.file_type()),
            ));
        }
        entries.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));
        Ok(entries)
    }

    fn read_to_string(&self, path: &Path) -> FsResult<String> {
        let full = self.resolve(path)?;
        let bytes = std::fs::read(&full).map_err(|e| FsError::from_io(path, e))?;
        String::from_utf8(bytes).map_err(|_| FsError::InvalidUtf8(path.to_path_buf()))
    }

    fn walk_paths(&self, root: &Path) -> FsResult<Vec<DirEntry>> {
        let start = self.resolve(root)?;
        let mut out = Vec::new();
        for entry in WalkDir::new(&start)
            .min_depth(1)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(&start).to_path_buf();
                FsError::from_io(&path, e.into())
            })?;
            out.push(DirEntry::new(
                self.relative(entry.path())?,
                kind_of(entry.file_type()),
            ));
        }
        tracing::trace!(root = %root.display(), entries = out.len(), "Walked directory");
        Ok(out)
    }
}
