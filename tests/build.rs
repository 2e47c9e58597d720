//! End-to-end build tests over the scaffolded application

use std::fs;
use std::path::Path;

use pretty_assertions::assert_eq;

use weft_lib::bundler::Bundler;
use weft_lib::cli::scaffold;
use weft_lib::config::{Mode, ProjectConfig, ResolvedConfig};

async fn build_scaffold(dir: &Path, mode: Mode) {
    scaffold(dir, "demo").unwrap();
    build(dir, mode).await;
}

async fn build(dir: &Path, mode: Mode) {
    let project = ProjectConfig::load(dir.join("weft.toml")).unwrap();
    let config = ResolvedConfig::resolve(&project, mode).unwrap();
    let bundler = Bundler::new(config).unwrap();
    bundler.build().await.unwrap();
}

#[tokio::test]
async fn development_build_emits_sourcemapped_bundle_with_injected_styles() {
    let dir = tempfile::tempdir().unwrap();
    build_scaffold(dir.path(), Mode::Development).await;

    let public = dir.path().join("public");
    let bundle = fs::read_to_string(public.join("bundle.js")).unwrap();

    // Source-mapped output
    assert!(public.join("bundle.js.map").is_file());
    assert!(bundle.contains("//# sourceMappingURL=bundle.js.map"));

    let map: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(public.join("bundle.js.map")).unwrap()).unwrap();
    assert_eq!(map["version"], 3);
    let sources: Vec<&str> = map["sources"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s.as_str().unwrap())
        .collect();
    assert!(sources.contains(&"src/main.js"));
    assert!(sources.contains(&"src/App.svelte"));

    // Styles are injected at runtime, not extracted
    assert!(bundle.contains("document.createElement('style')"));
    assert!(!public.join("bundle.css").is_file());

    // The component template made it into the bundle
    assert!(bundle.contains("Hello World!"));

    // Module syntax was lowered to the runtime's require shape
    assert!(bundle.contains("var App = require(\"src/App.svelte\");"));
    assert!(bundle.contains("require(\"src/global.css\");"));
    assert!(!bundle.contains("import App"));

    // Unminified output keeps module banners
    assert!(bundle.contains("// Module: src/App.svelte"));
}

#[tokio::test]
async fn production_build_extracts_minified_css_and_omits_sourcemaps() {
    let dir = tempfile::tempdir().unwrap();
    build_scaffold(dir.path(), Mode::Production).await;

    let public = dir.path().join("public");
    let bundle = fs::read_to_string(public.join("bundle.js")).unwrap();

    // No source maps in production
    assert!(!public.join("bundle.js.map").is_file());
    assert!(!bundle.contains("sourceMappingURL"));

    // CSS extracted to its own minified file, component styles and the
    // global stylesheet both included
    let css = fs::read_to_string(public.join("bundle.css")).unwrap();
    assert!(css.contains("#ff3e00"));
    assert!(css.contains("#fafafa"));
    assert!(!css.contains('\n'));

    // Nothing injects styles from JS
    assert!(!bundle.contains("document.createElement('style')"));

    // Minified bundle drops comments
    assert!(!bundle.contains("// Module:"));
    assert!(bundle.contains("Hello World!"));
}

#[tokio::test]
async fn dynamic_import_emits_numbered_chunk() {
    let dir = tempfile::tempdir().unwrap();
    scaffold(dir.path(), "demo").unwrap();

    fs::write(
        dir.path().join("src/lazy.js"),
        "module.exports = { loaded: true };\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("src/main.js"),
        "import App from './App.svelte';\nimport './global.css';\n\nApp.mount(document.body);\nimport('./lazy.js');\n",
    )
    .unwrap();

    build(dir.path(), Mode::Development).await;

    let public = dir.path().join("public");
    let bundle = fs::read_to_string(public.join("bundle.js")).unwrap();
    let chunk = fs::read_to_string(public.join("bundle.1.js")).unwrap();

    // The entry rewrites the dynamic import to a runtime chunk load
    assert!(bundle.contains("__weft_import__(\"bundle.1.js\", \"src/lazy.js\")"));
    assert!(!bundle.contains("import('./lazy.js')"));

    // The chunk registers the lazy module but does not execute an entry
    assert!(chunk.contains("__weft_modules__[\"src/lazy.js\"]"));
    assert!(!chunk.contains("// Execute entry point"));
}

#[tokio::test]
async fn manifest_lists_emitted_files_with_hashes() {
    let dir = tempfile::tempdir().unwrap();
    build_scaffold(dir.path(), Mode::Production).await;

    let manifest: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(dir.path().join("public/manifest.json")).unwrap(),
    )
    .unwrap();

    let object = manifest.as_object().unwrap();
    assert!(object.contains_key("bundle.js"));
    assert!(object.contains_key("bundle.css"));
    assert_eq!(object["bundle.js"].as_str().unwrap().len(), 16);
}

#[tokio::test]
async fn rebuilding_is_deterministic() {
    let dir = tempfile::tempdir().unwrap();
    build_scaffold(dir.path(), Mode::Production).await;
    let first = fs::read_to_string(dir.path().join("public/bundle.js")).unwrap();

    build(dir.path(), Mode::Production).await;
    let second = fs::read_to_string(dir.path().join("public/bundle.js")).unwrap();

    assert_eq!(first, second);
}
