/*
 * viewkit-fs
 * Copyright (c) 2025 Posit, PBC
 *
 * Filesystem capability consumed by the viewkit template registry.
 *
 * Content sources are read through the `ContentFs` trait so that the same
 * discovery code works against a real directory (`DirFs`) or an in-memory
 * tree (`MemoryFs`). All paths handed to a `ContentFs` are relative to the
 * root of that content source and use `/` as separator.
 *
 * Traversal is split from per-file work: `ContentFs::walk_paths` lists a
 * subtree, and `walk` feeds that listing to a `Visitor`.
 */

mod dir;
mod memory;
mod traits;

pub use dir::DirFs;
pub use memory::MemoryFs;
pub use traits::{ContentFs, DirEntry, EntryKind, FsError, FsResult, Visitor, walk};
