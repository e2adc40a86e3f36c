/*
 * integration_tests.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Integration tests for viewkit-template using test fixtures.
 */

use pretty_assertions::assert_eq;
use std::sync::Arc;
use viewkit_fs::DirFs;
use viewkit_template::{FuncMap, TemplateError, TemplateGroup, TemplateValue};

/// Helper to get a filesystem rooted at the test fixtures
fn fixtures() -> DirFs {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    DirFs::new(std::path::Path::new(manifest_dir).join("test-fixtures"))
}

fn article_data() -> TemplateValue {
    TemplateValue::from(serde_json::json!({
        "Site": "Docs",
        "Title": "Intro",
        "Paragraphs": ["one", "two"]
    }))
}

fn base_group() -> TemplateGroup {
    let mut group = TemplateGroup::new("common");
    group
        .parse_fs(&fixtures(), &["base.html", "header.html"])
        .expect("fixtures parse");
    group
}

#[test]
fn test_layout_with_overridden_blocks() {
    let mut page = base_group();
    page.parse_fs(&fixtures(), &["article.html"]).unwrap();
    page.set_entry("base.html");

    let result = page.execute(&article_data()).unwrap();
    assert_eq!(
        result,
        "<html>\n<head><title>Intro</title></head>\n<body>\n<header>Docs</header>\n\
         <article>\n  <p>one</p>\n  <p>two</p>\n</article>\n\n</body>\n</html>\n"
    );
}

#[test]
fn test_layout_block_defaults() {
    let mut group = base_group();
    group.set_entry("base.html");

    let result = group.execute(&article_data()).unwrap();
    assert_eq!(
        result,
        "<html>\n<head><title>Untitled</title></head>\n<body>\n<header>Docs</header>no content\n</body>\n</html>\n"
    );
}

#[test]
fn test_clones_do_not_see_each_other() {
    let base = base_group();

    let mut first = base.clone();
    first
        .parse_str("first", r#"{{define "content"}}first page{{end}}"#)
        .unwrap();
    first.set_entry("base.html");

    let mut second = base.clone();
    second
        .parse_str("second", r#"{{define "content"}}second page{{end}}"#)
        .unwrap();
    second.set_entry("base.html");

    let data = article_data();
    let first_out = first.execute(&data).unwrap();
    let second_out = second.execute(&data).unwrap();
    assert!(first_out.contains("first page"));
    assert!(!first_out.contains("second page"));
    assert!(second_out.contains("second page"));

    // Re-parsing one clone after the fact leaves the other untouched
    first
        .parse_str("first", r#"{{define "header"}}<nav/>{{end}}"#)
        .unwrap();
    assert!(first.execute(&data).unwrap().contains("<nav/>"));
    assert_eq!(second.execute(&data).unwrap(), second_out);
    assert!(
        base.execute_template("header", &data)
            .unwrap()
            .contains("<header>Docs</header>")
    );
}

#[test]
fn test_parse_error_location() {
    let mut group = base_group();
    let err = group.parse_fs(&fixtures(), &["broken.html"]).unwrap_err();
    match err {
        TemplateError::Parse { name, .. } => assert_eq!(name, "broken.html"),
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn test_functions_bound_before_parse() {
    let funcs = Arc::new(FuncMap::new().with("shout", |args| {
        let text = args.last().map(TemplateValue::render).unwrap_or_default();
        Ok(TemplateValue::String(text.to_uppercase()))
    }));

    // Unbound function names are rejected while parsing
    let mut unbound = TemplateGroup::new("t");
    assert!(matches!(
        unbound.parse_str("t", "{{ .Site | shout }}"),
        Err(TemplateError::Parse { .. })
    ));

    let mut group = TemplateGroup::new("t").with_functions(funcs);
    group.parse_str("t", "{{ .Site | shout }}!").unwrap();
    assert_eq!(group.execute(&article_data()).unwrap(), "DOCS!");
}

#[test]
fn test_serialize_data() {
    #[derive(serde::Serialize)]
    struct Page<'a> {
        title: &'a str,
        tags: Vec<&'a str>,
    }

    let data = TemplateValue::from_serialize(&Page {
        title: "Notes",
        tags: vec!["rust", "templates"],
    })
    .unwrap();

    let mut group = TemplateGroup::new("t");
    group
        .parse_str("t", r#"{{.title}}:{{range .tags}} #{{.}}{{end}} ({{len .tags}})"#)
        .unwrap();
    assert_eq!(group.execute(&data).unwrap(), "Notes: #rust #templates (2)");
}
