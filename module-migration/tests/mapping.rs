use module_migration::mapping::{read_header, ColumnSelector};
use module_migration::{load_mapping, ContentRewriter, InclusionPolicy, Replacer, RewriteError};
use std::collections::BTreeMap;
use std::fs;
use tempfile::TempDir;

#[test]
fn longest_match_wins() {
    let mapping = BTreeMap::from([
        ("a/b".to_string(), "x".to_string()),
        ("a/b/c".to_string(), "y".to_string()),
    ]);
    let replacer = Replacer::new(&mapping).unwrap();

    assert_eq!(replacer.replace("a/b/c/d"), "y/d");
    assert_eq!(replacer.replace("a/b/z"), "x/z");
    assert_eq!(replacer.replace("import a/b/c and a/b"), "import y and x");
}

#[test]
fn header_names_select_columns() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("mapping.csv");
    fs::write(&path, "old,new\nu1,u2\n").unwrap();

    let header = read_header(&path, b',').unwrap();
    assert_eq!(header, vec!["old".to_string(), "new".to_string()]);
    assert_eq!(ColumnSelector::parse("old").resolve(&path, &header).unwrap(), 0);
    assert_eq!(ColumnSelector::parse("new").resolve(&path, &header).unwrap(), 1);
    assert_eq!(ColumnSelector::parse("1").resolve(&path, &header).unwrap(), 1);
    assert!(ColumnSelector::parse("target").resolve(&path, &header).is_err());
}

#[test]
fn mapping_fills_remote_and_module_tables() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("mapping.csv");
    fs::write(
        &path,
        "new;old\nhttps://git.example.com/platform/lib;git@github.com:acme/lib.git\n;\n",
    )
    .unwrap();

    let tables = load_mapping(&path, 1, 0, b';').unwrap();

    assert_eq!(tables.remote_urls.len(), 1);
    assert_eq!(
        tables.module_paths.get("github.com/acme/lib"),
        Some(&"git.example.com/platform/lib".to_string())
    );
    assert!(tables
        .remote_targets
        .contains("https://git.example.com/platform/lib"));
}

#[test]
fn go_files_only_change_import_literals() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("main.go");
    let source = r#"package main

import "github.com/acme/lib"

var doc = "github.com/acme/lib"

// github.com/acme/lib
func main() { lib.Run(doc) }
"#;
    fs::write(&path, source).unwrap();

    let mapping = BTreeMap::from([(
        "github.com/acme/lib".to_string(),
        "git.example.com/platform/lib".to_string(),
    )]);
    let replacer = Replacer::new(&mapping).unwrap();
    let rewriter = ContentRewriter::new(InclusionPolicy::default());

    assert!(rewriter.rewrite_file(&path, &replacer).unwrap());
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        source.replacen(
            r#"import "github.com/acme/lib""#,
            r#"import "git.example.com/platform/lib""#,
            1
        )
    );
}

#[test]
fn broken_go_file_is_reported_and_left_alone() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("broken.go");
    let source = "package main\n\nimport \"github.com/acme/lib\"\n\nfunc main( {\n";
    fs::write(&path, source).unwrap();

    let mapping = BTreeMap::from([(
        "github.com/acme/lib".to_string(),
        "git.example.com/platform/lib".to_string(),
    )]);
    let replacer = Replacer::new(&mapping).unwrap();
    let result = ContentRewriter::new(InclusionPolicy::default()).rewrite_file(&path, &replacer);

    assert!(matches!(result, Err(RewriteError::Parse { .. })));
    assert_eq!(fs::read_to_string(&path).unwrap(), source);
}
