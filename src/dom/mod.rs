//! Minimal DOM tree
//!
//! Just enough of a document model to mount compiled component markup
//! and query it: elements, text nodes, and a fragment parser. Queries
//! walk text nodes, which is all the render harness needs.

use anyhow::Result;
use regex::Regex;

/// Elements that never have children or closing tags
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// A node in the tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// An element with a tag, attributes, and children
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    /// Create an empty element
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Collect all text node contents beneath this element, in document
    /// order
    pub fn text_nodes(&self) -> Vec<&str> {
        let mut out = Vec::new();
        collect_text(&self.children, &mut out);
        out
    }

    /// Whether any text node beneath this element equals the given text
    pub fn contains_text_node(&self, text: &str) -> bool {
        self.text_nodes().iter().any(|t| *t == text)
    }
}

fn collect_text<'a>(nodes: &'a [Node], out: &mut Vec<&'a str>) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push(text.as_str()),
            Node::Element(el) => collect_text(&el.children, out),
        }
    }
}

/// A document: a body element holding mounted containers
#[derive(Debug, Clone)]
pub struct Document {
    pub body: Element,
}

impl Document {
    /// Create an empty document
    pub fn new() -> Self {
        Self {
            body: Element::new("body"),
        }
    }

    /// Append a container element to the body and return its index
    pub fn append_container(&mut self, container: Element) -> usize {
        self.body.children.push(Node::Element(container));
        self.body.children.len() - 1
    }

    /// Whether the document contains a text node with exactly this text
    pub fn contains_text_node(&self, text: &str) -> bool {
        self.body.contains_text_node(text)
    }

    /// All text nodes matching a pattern, case-insensitively
    pub fn query_all_by_text(&self, pattern: &str) -> Result<Vec<&str>> {
        let regex = Regex::new(&format!("(?i){}", pattern))?;
        Ok(self
            .body
            .text_nodes()
            .into_iter()
            .filter(|text| regex.is_match(text))
            .collect())
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse an HTML fragment into a list of nodes
pub fn parse_fragment(markup: &str) -> Result<Vec<Node>> {
    let mut parser = FragmentParser {
        input: markup.as_bytes(),
        pos: 0,
    };
    let nodes = parser.parse_nodes(None)?;
    Ok(nodes)
}

struct FragmentParser<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> FragmentParser<'a> {
    /// Parse sibling nodes until EOF or the closing tag of `parent`
    fn parse_nodes(&mut self, parent: Option<&str>) -> Result<Vec<Node>> {
        let mut nodes = Vec::new();

        loop {
            if self.pos >= self.input.len() {
                if let Some(tag) = parent {
                    anyhow::bail!("Unclosed element <{}>", tag);
                }
                break;
            }

            if self.starts_with("<!--") {
                self.skip_comment()?;
                continue;
            }

            if self.starts_with("</") {
                let close = self.read_closing_tag()?;
                match parent {
                    Some(tag) if tag.eq_ignore_ascii_case(&close) => return Ok(nodes),
                    Some(tag) => {
                        anyhow::bail!("Mismatched closing tag </{}> inside <{}>", close, tag)
                    }
                    None => anyhow::bail!("Unexpected closing tag </{}>", close),
                }
            }

            if self.starts_with("<") {
                nodes.push(Node::Element(self.parse_element()?));
                continue;
            }

            if let Some(text) = self.read_text() {
                nodes.push(Node::Text(text));
            }
        }

        Ok(nodes)
    }

    fn parse_element(&mut self) -> Result<Element> {
        self.pos += 1; // consume '<'
        let tag = self.read_name();
        if tag.is_empty() {
            anyhow::bail!("Malformed tag at byte {}", self.pos);
        }

        let mut element = Element::new(&tag.to_lowercase());
        let self_closing = self.read_attrs(&mut element)?;

        if self_closing || VOID_ELEMENTS.contains(&element.tag.as_str()) {
            return Ok(element);
        }

        element.children = self.parse_nodes(Some(&element.tag))?;
        Ok(element)
    }

    /// Read attributes up to and including '>'; returns true for '/>'
    fn read_attrs(&mut self, element: &mut Element) -> Result<bool> {
        loop {
            self.skip_whitespace();

            match self.peek() {
                None => anyhow::bail!("Unterminated tag <{}>", element.tag),
                Some(b'>') => {
                    self.pos += 1;
                    return Ok(false);
                }
                Some(b'/') => {
                    self.pos += 1;
                    if self.peek() == Some(b'>') {
                        self.pos += 1;
                        return Ok(true);
                    }
                    anyhow::bail!("Stray '/' in tag <{}>", element.tag);
                }
                Some(_) => {
                    let name = self.read_name();
                    if name.is_empty() {
                        anyhow::bail!("Malformed attribute in tag <{}>", element.tag);
                    }
                    let mut value = String::new();
                    self.skip_whitespace();
                    if self.peek() == Some(b'=') {
                        self.pos += 1;
                        self.skip_whitespace();
                        value = self.read_attr_value()?;
                    }
                    element.attrs.push((name.to_lowercase(), value));
                }
            }
        }
    }

    fn read_attr_value(&mut self) -> Result<String> {
        match self.peek() {
            Some(quote @ (b'"' | b'\'')) => {
                self.pos += 1;
                let start = self.pos;
                while self.peek().map(|c| c != quote).unwrap_or(false) {
                    self.pos += 1;
                }
                if self.peek().is_none() {
                    anyhow::bail!("Unterminated attribute value");
                }
                let value = self.slice(start, self.pos);
                self.pos += 1;
                Ok(value)
            }
            _ => {
                let start = self.pos;
                while self
                    .peek()
                    .map(|c| !c.is_ascii_whitespace() && c != b'>')
                    .unwrap_or(false)
                {
                    self.pos += 1;
                }
                Ok(self.slice(start, self.pos))
            }
        }
    }

    fn read_closing_tag(&mut self) -> Result<String> {
        self.pos += 2; // consume '</'
        let name = self.read_name();
        self.skip_whitespace();
        if self.peek() != Some(b'>') {
            anyhow::bail!("Malformed closing tag </{}>", name);
        }
        self.pos += 1;
        Ok(name.to_lowercase())
    }

    /// Read a text run up to the next tag; collapses to None when the
    /// run is only whitespace
    fn read_text(&mut self) -> Option<String> {
        let start = self.pos;
        while self.peek().map(|c| c != b'<').unwrap_or(false) {
            self.pos += 1;
        }
        let raw = self.slice(start, self.pos);
        let text = decode_entities(raw.trim());
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }

    fn skip_comment(&mut self) -> Result<()> {
        let end = self.remaining().find("-->");
        match end {
            Some(offset) => {
                self.pos += offset + 3;
                Ok(())
            }
            None => anyhow::bail!("Unterminated comment"),
        }
    }

    fn read_name(&mut self) -> String {
        let start = self.pos;
        while self
            .peek()
            .map(|c| c.is_ascii_alphanumeric() || c == b'-' || c == b'_' || c == b':')
            .unwrap_or(false)
        {
            self.pos += 1;
        }
        self.slice(start, self.pos)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().map(|c| c.is_ascii_whitespace()).unwrap_or(false) {
            self.pos += 1;
        }
    }

    fn starts_with(&self, prefix: &str) -> bool {
        self.remaining().starts_with(prefix)
    }

    fn remaining(&self) -> &str {
        std::str::from_utf8(&self.input[self.pos..]).unwrap_or("")
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn slice(&self, start: usize, end: usize) -> String {
        String::from_utf8_lossy(&self.input[start..end]).to_string()
    }
}

fn decode_entities(text: &str) -> String {
    text.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_fragment() {
        let nodes = parse_fragment("<h1>Hello World!</h1>").unwrap();
        assert_eq!(nodes.len(), 1);

        match &nodes[0] {
            Node::Element(el) => {
                assert_eq!(el.tag, "h1");
                assert_eq!(el.children, vec![Node::Text("Hello World!".to_string())]);
            }
            Node::Text(_) => panic!("expected element"),
        }
    }

    #[test]
    fn test_parse_nested_and_attrs() {
        let nodes =
            parse_fragment(r#"<div class="wrap"><p>one</p><p>two</p></div>"#).unwrap();

        match &nodes[0] {
            Node::Element(el) => {
                assert_eq!(el.attrs, vec![("class".to_string(), "wrap".to_string())]);
                assert_eq!(el.children.len(), 2);
                assert_eq!(el.text_nodes(), vec!["one", "two"]);
            }
            Node::Text(_) => panic!("expected element"),
        }
    }

    #[test]
    fn test_parse_void_and_self_closing() {
        let nodes = parse_fragment("<img src=\"x.png\"><br/><span>hi</span>").unwrap();
        assert_eq!(nodes.len(), 3);
    }

    #[test]
    fn test_comments_skipped() {
        let nodes = parse_fragment("<!-- note --><p>text</p>").unwrap();
        assert_eq!(nodes.len(), 1);
    }

    #[test]
    fn test_entities_decoded() {
        let nodes = parse_fragment("<p>a &amp; b</p>").unwrap();
        match &nodes[0] {
            Node::Element(el) => assert_eq!(el.text_nodes(), vec!["a & b"]),
            Node::Text(_) => panic!("expected element"),
        }
    }

    #[test]
    fn test_unclosed_element_rejected() {
        assert!(parse_fragment("<div><p>text</div>").is_err());
        assert!(parse_fragment("<div>").is_err());
    }

    #[test]
    fn test_query_all_by_text_is_case_insensitive() {
        let mut doc = Document::new();
        let mut container = Element::new("div");
        container.children = parse_fragment("<h1>Hello World!</h1><p>other</p>").unwrap();
        doc.append_container(container);

        let matches = doc.query_all_by_text("hello world").unwrap();
        assert_eq!(matches, vec!["Hello World!"]);
        assert!(doc.query_all_by_text("absent").unwrap().is_empty());
    }

    #[test]
    fn test_contains_text_node() {
        let mut doc = Document::new();
        let mut container = Element::new("div");
        container.children = parse_fragment("<h1>Hello World!</h1>").unwrap();
        doc.append_container(container);

        assert!(doc.contains_text_node("Hello World!"));
        assert!(!doc.contains_text_node("Hello"));
    }
}
