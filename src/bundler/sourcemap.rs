//! Source map generation
//!
//! Emits version-3 source maps with line-granularity mappings: each
//! generated line maps to a line of the module it was copied from.
//! Runtime and wrapper lines stay unmapped.

use serde_json::json;

const BASE64_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// Incremental source map builder
#[derive(Debug, Default)]
pub struct SourceMapBuilder {
    sources: Vec<String>,
    contents: Vec<String>,
    /// One entry per generated line: (source index, original line)
    lines: Vec<Option<(usize, usize)>>,
}

impl SourceMapBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source file, returning its index
    pub fn add_source(&mut self, path: String, content: String) -> usize {
        self.sources.push(path);
        self.contents.push(content);
        self.sources.len() - 1
    }

    /// Record that the next generated line maps to a source line
    pub fn add_mapped_line(&mut self, source: usize, original_line: usize) {
        self.lines.push(Some((source, original_line)));
    }

    /// Record a generated line with no source counterpart
    pub fn add_unmapped_line(&mut self) {
        self.lines.push(None);
    }

    /// Serialize to source map JSON
    pub fn build(&self, file: &str) -> String {
        json!({
            "version": 3,
            "file": file,
            "sources": self.sources,
            "sourcesContent": self.contents,
            "names": [],
            "mappings": self.encode_mappings(),
        })
        .to_string()
    }

    fn encode_mappings(&self) -> String {
        let mut mappings = String::new();
        let mut prev_source: i64 = 0;
        let mut prev_line: i64 = 0;

        for (i, line) in self.lines.iter().enumerate() {
            if i > 0 {
                mappings.push(';');
            }

            if let Some((source, original_line)) = line {
                let source = *source as i64;
                let original_line = *original_line as i64;

                // Segment: generated column, source delta, line delta,
                // original column. Columns are always zero at line
                // granularity.
                mappings.push_str(&encode_vlq(0));
                mappings.push_str(&encode_vlq(source - prev_source));
                mappings.push_str(&encode_vlq(original_line - prev_line));
                mappings.push_str(&encode_vlq(0));

                prev_source = source;
                prev_line = original_line;
            }
        }

        mappings
    }
}

/// Encode a value as base64 VLQ
fn encode_vlq(value: i64) -> String {
    let mut out = String::new();
    let mut vlq = if value < 0 {
        ((-value as u64) << 1) | 1
    } else {
        (value as u64) << 1
    };

    loop {
        let mut digit = (vlq & 0x1f) as usize;
        vlq >>= 5;
        if vlq > 0 {
            digit |= 0x20;
        }
        out.push(BASE64_CHARS[digit] as char);
        if vlq == 0 {
            break;
        }
    }

    out
}
