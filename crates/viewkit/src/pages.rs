/*
 * pages.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Compiles every page under each source's `views/` directory.
//!
//! Each page gets its own clone of the common base with the page file
//! parsed into it and set as the entry template. Clones share parsed trees
//! but not their namespaces, so a page redefining `content` or `header`
//! only affects itself.
//!
//! A page file whose name is only the extension (`views/.html`) has no
//! identifier. It fails the whole compilation with
//! [`LoadError::PathResolution`] like any other unreadable page, so the
//! previously published registry stays in place until the file is removed.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use viewkit_fs::{ContentFs, EntryKind, Visitor, walk};
use viewkit_template::{TemplateGroup, TemplateResult, TemplateValue};

use crate::common::{directory_exists, has_extension, parse_file};
use crate::error::{LoadError, WalkError};
use crate::identifier::page_id;
use crate::source::{ContentSources, SourceId};

pub const VIEWS_DIR: &str = "views";

/// A page ready to render: the common base plus the page's own template.
#[derive(Debug, Clone)]
pub struct CompiledPage {
    id: String,
    source_id: SourceId,
    path: PathBuf,
    group: TemplateGroup,
}

impl CompiledPage {
    /// The registry key, e.g. `docs/intro` or `blog:post`.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn source_id(&self) -> &SourceId {
        &self.source_id
    }

    /// Path of the page file within its source.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The page's template group.
    pub fn group(&self) -> &TemplateGroup {
        &self.group
    }

    /// Names of every template the page can reach, sorted.
    pub fn template_names(&self) -> Vec<&str> {
        self.group.template_names()
    }

    /// Execute the page template.
    pub fn render(&self, data: &TemplateValue) -> TemplateResult<String> {
        self.group.execute(data)
    }

    /// Execute another template from the page's namespace, such as a single
    /// partial.
    pub fn render_template(&self, name: &str, data: &TemplateValue) -> TemplateResult<String> {
        self.group.execute_template(name, data)
    }
}

/// Compile every page of every source into a fresh map keyed by page id.
///
/// A page whose id was already produced by an earlier source replaces it.
pub fn compile_pages(
    sources: &ContentSources,
    base: &TemplateGroup,
    extension: &str,
) -> Result<HashMap<String, Arc<CompiledPage>>, LoadError> {
    let mut pages = HashMap::new();

    for (source_id, fs) in sources.iter() {
        let views_dir = Path::new(VIEWS_DIR);
        if !directory_exists(fs, source_id, views_dir)? {
            tracing::debug!(source = %source_id, dir = VIEWS_DIR, "directory missing, skipping");
            continue;
        }

        let mut compiler = PageCompiler {
            source_id,
            fs,
            extension,
            base,
            pages: &mut pages,
            compiled: 0,
        };
        walk(fs, views_dir, &mut compiler).map_err(|e| e.into_load_error(source_id, views_dir))?;
        tracing::debug!(source = %source_id, pages = compiler.compiled, "compiled pages");
    }

    Ok(pages)
}

struct PageCompiler<'a> {
    source_id: &'a SourceId,
    fs: &'a dyn ContentFs,
    extension: &'a str,
    base: &'a TemplateGroup,
    pages: &'a mut HashMap<String, Arc<CompiledPage>>,
    compiled: usize,
}

impl PageCompiler<'_> {
    fn compile(&self, id: String, path: &Path) -> Result<CompiledPage, LoadError> {
        let mut group = self.base.clone();
        parse_file(&mut group, self.fs, self.source_id, path)?;

        let entry = path.file_name().map_or_else(
            || path.display().to_string(),
            |name| name.to_string_lossy().into_owned(),
        );
        group.set_entry(entry);

        Ok(CompiledPage {
            id,
            source_id: self.source_id.clone(),
            path: path.to_path_buf(),
            group,
        })
    }
}

impl Visitor for PageCompiler<'_> {
    type Error = WalkError;

    fn visit(&mut self, path: &Path, kind: EntryKind) -> Result<(), WalkError> {
        if kind != EntryKind::File || !has_extension(path, self.extension) {
            return Ok(());
        }

        let id = page_id(self.source_id, Path::new(VIEWS_DIR), path, self.extension).ok_or_else(
            || LoadError::PathResolution {
                source_id: self.source_id.clone(),
                path: path.to_path_buf(),
            },
        )?;

        let page = self.compile(id.clone(), path)?;
        tracing::debug!(
            source = %self.source_id,
            page = %id,
            path = %path.display(),
            templates = page.group.template_names().len(),
            "compiled page"
        );

        if let Some(previous) = self.pages.insert(id, Arc::new(page)) {
            tracing::warn!(
                page = %previous.id,
                replaced = %previous.path.display(),
                previous_source = %previous.source_id,
                source = %self.source_id,
                "page identifier registered twice, keeping the later page"
            );
        }
        self.compiled += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::build_common_base;
    use pretty_assertions::assert_eq;
    use viewkit_fs::MemoryFs;
    use viewkit_template::FuncMap;

    fn compile(sources: &ContentSources) -> HashMap<String, Arc<CompiledPage>> {
        let funcs = Arc::new(FuncMap::new());
        let base = build_common_base(sources, &funcs, ".html").unwrap();
        compile_pages(sources, &base, ".html").unwrap()
    }

    fn sorted_ids(pages: &HashMap<String, Arc<CompiledPage>>) -> Vec<&str> {
        let mut ids: Vec<&str> = pages.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    #[test]
    fn test_one_entry_per_view() {
        let sources = ContentSources::new()
            .with(
                SourceId::Root,
                MemoryFs::with_files([
                    ("views/index.html", "home"),
                    ("views/docs/intro.html", "intro"),
                    ("views/docs/notes.md", "ignored"),
                ]),
            )
            .with("blog", MemoryFs::with_files([("views/post.html", "post")]));

        let pages = compile(&sources);
        assert_eq!(sorted_ids(&pages), vec!["blog:post", "docs/intro", "index"]);

        let intro = &pages["docs/intro"];
        assert_eq!(intro.source_id(), &SourceId::Root);
        assert_eq!(intro.path(), Path::new("views/docs/intro.html"));
        assert_eq!(intro.group().entry(), "intro.html");
        assert_eq!(intro.render(&TemplateValue::Null).unwrap(), "intro");
    }

    #[test]
    fn test_render_single_template_from_page() {
        let sources = ContentSources::new().with(
            SourceId::Root,
            MemoryFs::with_files([
                ("partials/greeting.html", r#"{{define "greeting"}}hi {{.}}{{end}}"#),
                ("views/home.html", r#"[{{template "greeting" .}}]"#),
            ]),
        );
        let pages = compile(&sources);
        let home = &pages["home"];
        let data = TemplateValue::from("ada");
        assert_eq!(home.render(&data).unwrap(), "[hi ada]");
        assert_eq!(home.render_template("greeting", &data).unwrap(), "hi ada");
        assert!(home.render_template("missing", &data).is_err());
    }

    #[test]
    fn test_same_file_name_in_different_folders() {
        let sources = ContentSources::new().with(
            SourceId::Root,
            MemoryFs::with_files([("views/a/index.html", "a"), ("views/b/index.html", "b")]),
        );
        let pages = compile(&sources);
        assert_eq!(pages["a/index"].render(&TemplateValue::Null).unwrap(), "a");
        assert_eq!(pages["b/index"].render(&TemplateValue::Null).unwrap(), "b");
    }

    #[test]
    fn test_page_parse_error() {
        let sources = ContentSources::new().with(
            SourceId::Root,
            MemoryFs::with_files([("views/ok.html", "ok"), ("views/zz.html", "{{end}}")]),
        );
        let funcs = Arc::new(FuncMap::new());
        let base = build_common_base(&sources, &funcs, ".html").unwrap();
        let err = compile_pages(&sources, &base, ".html").unwrap_err();
        assert!(matches!(err, LoadError::Parse { ref path, .. } if path == Path::new("views/zz.html")));
    }

    #[test]
    fn test_source_without_views() {
        let sources = ContentSources::new().with(
            SourceId::Root,
            MemoryFs::with_files([("partials/p.html", r#"{{define "p"}}p{{end}}"#)]),
        );
        assert!(compile(&sources).is_empty());
    }
}
