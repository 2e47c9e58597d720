//! Render harness
//!
//! Mounts a component into an isolated in-memory DOM container and
//! exposes text queries over the result. This is the substrate for
//! smoke tests: render, query for expected text, assert.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::dom::{parse_fragment, Document, Element};
use crate::transform::split_component;

/// The result of rendering a component
#[derive(Debug)]
pub struct RenderResult {
    document: Document,
}

impl RenderResult {
    /// The document the component was mounted into
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Find the single text node matching a case-insensitive pattern
    ///
    /// Errors when no node matches or when the match is ambiguous, so a
    /// plain `?` on the result is a real assertion: a missing text node
    /// fails the caller.
    pub fn get_by_text(&self, pattern: &str) -> Result<String> {
        let matches = self.document.query_all_by_text(pattern)?;
        match matches.len() {
            0 => anyhow::bail!("No text node matching /{}/i was rendered", pattern),
            1 => Ok(matches[0].to_string()),
            n => anyhow::bail!("{} text nodes match /{}/i, expected exactly one", n, pattern),
        }
    }

    /// All text nodes matching a case-insensitive pattern
    pub fn query_all_by_text(&self, pattern: &str) -> Result<Vec<&str>> {
        self.document.query_all_by_text(pattern)
    }

    /// Whether the mounted document contains a text node with exactly
    /// this content
    pub fn contains_text_node(&self, text: &str) -> bool {
        self.document.contains_text_node(text)
    }
}

/// Render a component file into a fresh document
///
/// The component is compiled in isolation: its markup is mounted into a
/// container element appended to an otherwise empty document body.
/// Scripts and styles are ignored here; rendering a static fragment
/// needs neither.
pub fn render<P: AsRef<Path>>(component_path: P) -> Result<RenderResult> {
    let path = component_path.as_ref();
    let source = fs::read_to_string(path)
        .with_context(|| format!("Failed to read component: {}", path.display()))?;

    render_source(&source)
        .with_context(|| format!("Failed to render component: {}", path.display()))
}

/// Render component source into a fresh document
pub fn render_source(source: &str) -> Result<RenderResult> {
    let parts = split_component(source)?;

    let mut container = Element::new("div");
    container.children = parse_fragment(&parts.markup)?;

    let mut document = Document::new();
    document.append_container(container);

    Ok(RenderResult { document })
}

#[cfg(test)]
mod tests {
    use super::*;

    const HELLO: &str = "<script>\nlet greeting = 'Hello';\n</script>\n\n<style>\nh1 { color: #ff3e00; }\n</style>\n\n<h1>Hello World!</h1>\n";

    #[test]
    fn test_renders_hello_world_text() {
        let result = render_source(HELLO).unwrap();

        // Exactly one matching text node, present in the document
        let matches = result.query_all_by_text("hello world").unwrap();
        assert_eq!(matches.len(), 1);

        let text = result.get_by_text("hello world").unwrap();
        assert!(result.contains_text_node(&text));
    }

    #[test]
    fn test_missing_text_fails_the_query() {
        // The query must gate the assertion: a component without the
        // expected text makes get_by_text error out.
        let result = render_source("<h1>Goodbye!</h1>").unwrap();
        assert!(result.get_by_text("hello world").is_err());
    }

    #[test]
    fn test_ambiguous_match_is_an_error() {
        let result = render_source("<p>Hello World</p><p>hello world</p>").unwrap();
        assert!(result.get_by_text("hello world").is_err());
        assert_eq!(result.query_all_by_text("hello world").unwrap().len(), 2);
    }

    #[test]
    fn test_render_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("App.svelte");
        fs::write(&path, HELLO).unwrap();

        let result = render(&path).unwrap();
        assert!(result.get_by_text("hello world").is_ok());
    }
}
