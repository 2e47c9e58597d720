//! Smoke test: the scaffolded component renders its greeting
//!
//! The text query gates the assertion: if the component stops rendering
//! the expected text, these tests fail.

use std::fs;

use weft_lib::cli::scaffold;
use weft_lib::harness;

#[test]
fn app_renders_hello_world() {
    let dir = tempfile::tempdir().unwrap();
    scaffold(dir.path(), "demo").unwrap();

    let result = harness::render(dir.path().join("src/App.svelte")).unwrap();

    // Exactly one matching text node, case-insensitively
    let matches = result.query_all_by_text("hello world").unwrap();
    assert_eq!(matches.len(), 1);

    let text = result.get_by_text("hello world").unwrap();
    assert!(result.contains_text_node(&text));
}

#[test]
fn removing_the_greeting_makes_the_check_fail() {
    let dir = tempfile::tempdir().unwrap();
    scaffold(dir.path(), "demo").unwrap();

    // Same component, greeting replaced
    let app = dir.path().join("src/App.svelte");
    let source = fs::read_to_string(&app).unwrap();
    fs::write(&app, source.replace("Hello World!", "Goodbye!")).unwrap();

    let result = harness::render(&app).unwrap();
    assert!(result.get_by_text("hello world").is_err());
    assert!(result.query_all_by_text("hello world").unwrap().is_empty());
}
