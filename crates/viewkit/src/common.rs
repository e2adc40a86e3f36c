/*
 * common.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Builds the common base: one template group holding every layout and
//! partial from every content source.
//!
//! For each source with a `partials/` directory, every partial file is parsed
//! together with the source's `layouts/*<ext>` files (layouts are not
//! searched recursively). Sources are processed in [`SourceId`] order and a
//! later definition of a name replaces an earlier one.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use glob::{MatchOptions, Pattern};
use viewkit_fs::{ContentFs, EntryKind, Visitor, walk};
use viewkit_template::{FuncMap, TemplateError, TemplateGroup};

use crate::error::{LoadError, WalkError};
use crate::source::{ContentSources, SourceId};

pub const LAYOUTS_DIR: &str = "layouts";
pub const PARTIALS_DIR: &str = "partials";

/// Name of the common base group.
pub const COMMON_GROUP_NAME: &str = "_common_";

/// Build the common base for `sources`, bound to `funcs`.
pub fn build_common_base(
    sources: &ContentSources,
    funcs: &Arc<FuncMap>,
    extension: &str,
) -> Result<TemplateGroup, LoadError> {
    let mut base = TemplateGroup::new(COMMON_GROUP_NAME).with_functions(Arc::clone(funcs));

    for (source_id, fs) in sources.iter() {
        let partials_dir = Path::new(PARTIALS_DIR);
        if !directory_exists(fs, source_id, partials_dir)? {
            tracing::debug!(source = %source_id, dir = PARTIALS_DIR, "directory missing, skipping");
            continue;
        }

        let layouts = layout_files(fs, source_id, extension)?;
        let mut visitor = PartialVisitor {
            source_id,
            fs,
            extension,
            layouts: &layouts,
            base: &mut base,
            partials: 0,
        };
        walk(fs, partials_dir, &mut visitor)
            .map_err(|e| e.into_load_error(source_id, partials_dir))?;

        tracing::debug!(
            source = %source_id,
            layouts = layouts.len(),
            partials = visitor.partials,
            "loaded common templates"
        );
    }

    Ok(base)
}

struct PartialVisitor<'a> {
    source_id: &'a SourceId,
    fs: &'a dyn ContentFs,
    extension: &'a str,
    layouts: &'a [PathBuf],
    base: &'a mut TemplateGroup,
    partials: usize,
}

impl Visitor for PartialVisitor<'_> {
    type Error = WalkError;

    fn visit(&mut self, path: &Path, kind: EntryKind) -> Result<(), WalkError> {
        if kind != EntryKind::File || !has_extension(path, self.extension) {
            return Ok(());
        }
        for layout in self.layouts {
            parse_file(self.base, self.fs, self.source_id, layout)?;
        }
        parse_file(self.base, self.fs, self.source_id, path)?;
        self.partials += 1;
        tracing::debug!(source = %self.source_id, path = %path.display(), "parsed partial");
        Ok(())
    }
}

/// Files matching `layouts/*<extension>`, sorted by name. A missing
/// `layouts/` directory yields no files.
fn layout_files(fs: &dyn ContentFs, source_id: &SourceId, extension: &str) -> Result<Vec<PathBuf>, LoadError> {
    let layouts_dir = Path::new(LAYOUTS_DIR);
    if !directory_exists(fs, source_id, layouts_dir)? {
        tracing::debug!(source = %source_id, dir = LAYOUTS_DIR, "directory missing, skipping");
        return Ok(Vec::new());
    }

    let pattern = layout_pattern(extension);
    let options = MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: true,
    };
    let entries = fs.read_dir(layouts_dir).map_err(|source| LoadError::SourceAccess {
        source_id: source_id.clone(),
        path: layouts_dir.to_path_buf(),
        source,
    })?;

    Ok(entries
        .into_iter()
        .filter(|entry| entry.kind == EntryKind::File)
        .filter(|entry| {
            pattern
                .as_ref()
                .is_some_and(|p| p.matches_with(entry.file_name(), options))
        })
        .map(|entry| entry.path)
        .collect())
}

/// `*<extension>`, with the extension matched literally.
fn layout_pattern(extension: &str) -> Option<Pattern> {
    Pattern::new(&format!("*{}", Pattern::escape(extension))).ok()
}

pub(crate) fn has_extension(path: &Path, extension: &str) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(extension))
}

/// True if `dir` is a directory of the source. A missing path is not an
/// error; any other failure to stat it is.
pub(crate) fn directory_exists(fs: &dyn ContentFs, source_id: &SourceId, dir: &Path) -> Result<bool, LoadError> {
    match fs.metadata(dir) {
        Ok(kind) => Ok(kind == EntryKind::Directory),
        Err(e) if e.is_not_found() => Ok(false),
        Err(source) => Err(LoadError::SourceAccess {
            source_id: source_id.clone(),
            path: dir.to_path_buf(),
            source,
        }),
    }
}

/// Parse one file of a source into `group`.
pub(crate) fn parse_file(
    group: &mut TemplateGroup,
    fs: &dyn ContentFs,
    source_id: &SourceId,
    path: &Path,
) -> Result<(), LoadError> {
    match group.parse_fs(fs, &[path]) {
        Ok(_) => Ok(()),
        Err(TemplateError::Read { path, source }) => Err(LoadError::SourceAccess {
            source_id: source_id.clone(),
            path,
            source,
        }),
        Err(source) => Err(LoadError::Parse {
            source_id: source_id.clone(),
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use viewkit_fs::MemoryFs;
    use viewkit_template::TemplateValue;

    fn build(sources: &ContentSources) -> Result<TemplateGroup, LoadError> {
        build_common_base(sources, &Arc::new(FuncMap::new()), ".html")
    }

    #[test]
    fn test_layouts_and_partials_share_one_group() {
        let sources = ContentSources::new().with(
            SourceId::Root,
            MemoryFs::with_files([
                ("layouts/base.html", r#"[{{template "header" .}}]"#),
                ("layouts/nested/ignored.html", r#"{{define "nested"}}x{{end}}"#),
                ("layouts/notes.txt", "not a template"),
                ("partials/header.html", r#"{{define "header"}}H{{end}}"#),
                ("partials/nav/menu.html", r#"{{define "menu"}}M{{end}}"#),
            ]),
        );
        let base = build(&sources).unwrap();

        assert_eq!(
            base.template_names(),
            vec!["base.html", "header", "header.html", "menu", "menu.html"]
        );
        assert_eq!(
            base.execute_template("base.html", &TemplateValue::Null).unwrap(),
            "[H]"
        );
    }

    #[test]
    fn test_source_without_partials_contributes_nothing() {
        let sources = ContentSources::new().with(
            SourceId::Root,
            MemoryFs::with_files([("layouts/base.html", "layout"), ("views/home.html", "home")]),
        );
        let base = build(&sources).unwrap();
        assert!(base.template_names().is_empty());
    }

    #[test]
    fn test_later_source_wins() {
        let sources = ContentSources::new()
            .with(
                "b-theme",
                MemoryFs::with_files([("partials/footer.html", r#"{{define "footer"}}b{{end}}"#)]),
            )
            .with(
                "a-theme",
                MemoryFs::with_files([("partials/footer.html", r#"{{define "footer"}}a{{end}}"#)]),
            )
            .with(
                SourceId::Root,
                MemoryFs::with_files([("partials/footer.html", r#"{{define "footer"}}root{{end}}"#)]),
            );
        let base = build(&sources).unwrap();
        assert_eq!(
            base.execute_template("footer", &TemplateValue::Null).unwrap(),
            "b"
        );
    }

    #[test]
    fn test_parse_error_names_the_file() {
        let sources = ContentSources::new().with(
            "theme",
            MemoryFs::with_files([("partials/broken.html", "{{if .X}}")]),
        );
        let err = build(&sources).unwrap_err();
        match err {
            LoadError::Parse { source_id, path, .. } => {
                assert_eq!(source_id, SourceId::named("theme"));
                assert_eq!(path, PathBuf::from("partials/broken.html"));
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_layout_pattern_is_literal() {
        let pattern = layout_pattern(".[x].html").unwrap();
        assert!(pattern.matches("base.[x].html"));
        assert!(!pattern.matches("base.x.html"));
        assert!(has_extension(Path::new("partials/a.html"), ".html"));
        assert!(!has_extension(Path::new("partials/a.htm"), ".html"));
    }
}
