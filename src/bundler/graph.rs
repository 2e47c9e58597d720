//! Module graph data structures

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};

/// Unique identifier for a module
pub type ModuleId = usize;

/// Types of modules the bundler can handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleType {
    JavaScript,
    /// Single-file component
    Component,
    Css,
    Json,
    Unknown,
}

impl ModuleType {
    /// Determine module type from file extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "js" | "mjs" | "cjs" => ModuleType::JavaScript,
            "svelte" => ModuleType::Component,
            "css" => ModuleType::Css,
            "json" => ModuleType::Json,
            _ => ModuleType::Unknown,
        }
    }

    /// Check if import specifiers can appear in this module's source
    pub fn is_js_like(&self) -> bool {
        matches!(self, ModuleType::JavaScript | ModuleType::Component)
    }
}

/// A module in the dependency graph
#[derive(Debug, Clone)]
pub struct Module {
    /// Absolute path to the module
    pub path: PathBuf,

    /// Original source code
    pub source: String,

    /// Module type
    pub module_type: ModuleType,

    /// Whether this is an entry point
    pub is_entry: bool,

    /// Static import specifiers found in this module
    pub dependencies: Vec<String>,

    /// Dynamic import() specifiers, which seed async chunks
    pub dynamic_dependencies: Vec<String>,

    /// Transformed code (after the loader chain has run)
    pub transformed: Option<String>,

    /// Stylesheet content routed to the extraction plugin, if any
    pub emitted_css: Option<String>,
}

impl Module {
    /// Detect module type from path
    pub fn detect_type(path: &Path) -> ModuleType {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(ModuleType::from_extension)
            .unwrap_or(ModuleType::Unknown)
    }
}

/// The module dependency graph
#[derive(Debug, Default)]
pub struct ModuleGraph {
    /// All modules indexed by their ID
    modules: HashMap<ModuleId, Module>,

    /// Map from path to module ID
    path_to_id: HashMap<PathBuf, ModuleId>,

    /// Static dependency edges: module ID -> set of dependency IDs
    edges: HashMap<ModuleId, HashSet<ModuleId>>,

    /// Dynamic import edges, kept separate for chunk assignment
    dynamic_edges: HashMap<ModuleId, HashSet<ModuleId>>,

    /// Next available module ID
    next_id: ModuleId,
}

impl ModuleGraph {
    /// Create a new empty module graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a module to the graph
    pub fn add_module(&mut self, module: Module) -> ModuleId {
        let path = module.path.clone();

        if let Some(&id) = self.path_to_id.get(&path) {
            return id;
        }

        let id = self.next_id;
        self.next_id += 1;

        self.path_to_id.insert(path, id);
        self.modules.insert(id, module);
        self.edges.insert(id, HashSet::new());
        self.dynamic_edges.insert(id, HashSet::new());

        id
    }

    /// Add a static dependency edge between modules
    pub fn add_dependency(&mut self, from: ModuleId, to: ModuleId) {
        if let Some(deps) = self.edges.get_mut(&from) {
            deps.insert(to);
        }
    }

    /// Add a dynamic import edge between modules
    pub fn add_dynamic_dependency(&mut self, from: ModuleId, to: ModuleId) {
        if let Some(deps) = self.dynamic_edges.get_mut(&from) {
            deps.insert(to);
        }
    }

    /// Get module ID from path
    pub fn get_module_id(&self, path: &Path) -> Option<ModuleId> {
        self.path_to_id.get(path).copied()
    }

    /// Get a module by ID
    pub fn get_module(&self, id: ModuleId) -> Option<&Module> {
        self.modules.get(&id)
    }

    /// Get a mutable reference to a module
    pub fn get_module_mut(&mut self, id: ModuleId) -> Option<&mut Module> {
        self.modules.get_mut(&id)
    }

    /// Get all module IDs
    pub fn all_module_ids(&self) -> Vec<ModuleId> {
        let mut ids: Vec<ModuleId> = self.modules.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Get all modules statically reachable from a given module (BFS,
    /// dynamic edges excluded)
    pub fn get_reachable_modules(&self, start: ModuleId) -> Vec<ModuleId> {
        let mut visited = HashSet::new();
        let mut result = Vec::new();
        let mut queue = VecDeque::new();

        queue.push_back(start);
        visited.insert(start);

        while let Some(id) = queue.pop_front() {
            result.push(id);

            if let Some(deps) = self.edges.get(&id) {
                let mut deps: Vec<ModuleId> = deps.iter().copied().collect();
                deps.sort_unstable();
                for dep_id in deps {
                    if visited.insert(dep_id) {
                        queue.push_back(dep_id);
                    }
                }
            }
        }

        result
    }

    /// All modules that are the target of a dynamic import, in insertion
    /// order of their IDs
    pub fn dynamic_import_targets(&self) -> Vec<ModuleId> {
        let mut targets: Vec<ModuleId> = self
            .dynamic_edges
            .values()
            .flat_map(|deps| deps.iter().copied())
            .collect();
        targets.sort_unstable();
        targets.dedup();
        targets
    }

    /// Total number of modules
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Check if graph is empty
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module(path: &str, ty: ModuleType, is_entry: bool) -> Module {
        Module {
            path: PathBuf::from(path),
            source: String::new(),
            module_type: ty,
            is_entry,
            dependencies: vec![],
            dynamic_dependencies: vec![],
            transformed: None,
            emitted_css: None,
        }
    }

    #[test]
    fn test_module_type_detection() {
        assert_eq!(ModuleType::from_extension("js"), ModuleType::JavaScript);
        assert_eq!(ModuleType::from_extension("mjs"), ModuleType::JavaScript);
        assert_eq!(ModuleType::from_extension("svelte"), ModuleType::Component);
        assert_eq!(ModuleType::from_extension("css"), ModuleType::Css);
        assert_eq!(ModuleType::from_extension("json"), ModuleType::Json);
        assert_eq!(ModuleType::from_extension("wasm"), ModuleType::Unknown);
    }

    #[test]
    fn test_add_module_dedupes_by_path() {
        let mut graph = ModuleGraph::new();

        let a = graph.add_module(module("/app/main.js", ModuleType::JavaScript, true));
        let b = graph.add_module(module("/app/main.js", ModuleType::JavaScript, true));

        assert_eq!(a, b);
        assert_eq!(graph.len(), 1);
        assert_eq!(graph.get_module_id(Path::new("/app/main.js")), Some(a));
    }

    #[test]
    fn test_reachability_ignores_dynamic_edges() {
        let mut graph = ModuleGraph::new();

        let main = graph.add_module(module("/app/main.js", ModuleType::JavaScript, true));
        let app = graph.add_module(module("/app/App.svelte", ModuleType::Component, false));
        let lazy = graph.add_module(module("/app/lazy.js", ModuleType::JavaScript, false));

        graph.add_dependency(main, app);
        graph.add_dynamic_dependency(main, lazy);

        let reachable = graph.get_reachable_modules(main);
        assert_eq!(reachable, vec![main, app]);
        assert_eq!(graph.dynamic_import_targets(), vec![lazy]);
    }
}
