//! Chunk assignment
//!
//! An entry chunk is emitted per entry point; every dynamically imported
//! module subtree becomes a numbered async chunk loaded on demand.

use super::ModuleId;
use crate::config::OutputNames;

/// Type of chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkKind {
    /// Entry point chunk - loaded immediately
    Entry,
    /// Async chunk - loaded on demand via dynamic import
    Async,
}

/// A chunk is a group of modules that will be bundled together
#[derive(Debug, Clone)]
pub struct Chunk {
    /// Numeric chunk id; 0 for entry chunks
    pub id: u32,

    /// Chunk name (entry name, or the id for async chunks)
    pub name: String,

    /// Type of chunk
    pub kind: ChunkKind,

    /// Module IDs included in this chunk
    pub module_ids: Vec<ModuleId>,
}

impl Chunk {
    /// Create a new entry chunk
    pub fn entry(name: String, module_ids: Vec<ModuleId>) -> Self {
        Self {
            id: 0,
            name,
            kind: ChunkKind::Entry,
            module_ids,
        }
    }

    /// Create a new async chunk
    pub fn async_chunk(id: u32, module_ids: Vec<ModuleId>) -> Self {
        Self {
            id,
            name: id.to_string(),
            kind: ChunkKind::Async,
            module_ids,
        }
    }

    /// Output filename for this chunk
    pub fn filename(&self, names: &OutputNames) -> String {
        match self.kind {
            ChunkKind::Entry => names.js_for(&self.name),
            ChunkKind::Async => names.js_chunk_for(self.id),
        }
    }

    /// Whether this is an entry chunk
    pub fn is_entry(&self) -> bool {
        matches!(self.kind, ChunkKind::Entry)
    }

    /// Check if chunk is empty
    pub fn is_empty(&self) -> bool {
        self.module_ids.is_empty()
    }

    /// Number of modules in chunk
    pub fn len(&self) -> usize {
        self.module_ids.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> OutputNames {
        OutputNames {
            js: "[name].js".to_string(),
            js_chunk: "bundle.[id].js".to_string(),
            css: "[name].css".to_string(),
            css_chunk: "bundle.[name].css".to_string(),
        }
    }

    #[test]
    fn test_chunk_filenames() {
        let entry = Chunk::entry("bundle".to_string(), vec![0, 1]);
        assert_eq!(entry.filename(&names()), "bundle.js");
        assert!(entry.is_entry());

        let lazy = Chunk::async_chunk(2, vec![3]);
        assert_eq!(lazy.filename(&names()), "bundle.2.js");
        assert_eq!(lazy.name, "2");
        assert!(!lazy.is_entry());
    }
}
