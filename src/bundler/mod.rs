//! Core bundler implementation
//!
//! Walks the module graph from the configured entry points, runs every
//! module through its loader chain, groups modules into chunks, and
//! emits the output bundles plus the assets produced by the plugin
//! pipeline.

mod chunk;
mod graph;
mod lower;
mod sourcemap;

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::config::ResolvedConfig;
use crate::plugins::{Assets, CssChunk, CssExtractPlugin, CssMinimizerPlugin, PluginManager};
use crate::resolver::Resolver;
use crate::transform::Transformer;
use crate::utils;

pub use chunk::{Chunk, ChunkKind};
pub use graph::{Module, ModuleGraph, ModuleId, ModuleType};
pub use sourcemap::SourceMapBuilder;

/// Result of a build operation
#[derive(Debug)]
pub struct BuildResult {
    /// Generated bundles
    pub bundles: Vec<BundleInfo>,

    /// Asset manifest: output filename -> content hash
    pub manifest: BTreeMap<String, String>,
}

/// Information about a generated output file
#[derive(Debug)]
pub struct BundleInfo {
    /// Output file path
    pub output_path: PathBuf,

    /// Size in bytes
    pub size: usize,

    /// Source map path (if generated)
    pub sourcemap_path: Option<PathBuf>,
}

/// The main bundler
pub struct Bundler {
    /// Resolved build configuration
    config: Arc<ResolvedConfig>,

    /// Canonicalized project root, used for stable module keys
    root: PathBuf,

    /// Module resolver
    resolver: Resolver,

    /// Code transformer
    transformer: Transformer,

    /// Output-processing plugins
    plugins: PluginManager,

    /// Module graph
    graph: Arc<RwLock<ModuleGraph>>,
}

impl Bundler {
    /// Create a new bundler instance
    pub fn new(config: ResolvedConfig) -> Result<Self> {
        let config = Arc::new(config);
        let root = fs::canonicalize(&config.root).unwrap_or_else(|_| config.root.clone());
        let resolver = Resolver::new(config.clone());
        let transformer = Transformer::new(config.clone());

        let mut plugins = PluginManager::new(config.root.clone());
        if config.optimization.css_minimizer {
            plugins.register(Arc::new(CssExtractPlugin::new(config.names.clone())));
            plugins.register(Arc::new(CssMinimizerPlugin));
        }

        Ok(Self {
            config,
            root,
            resolver,
            transformer,
            plugins,
            graph: Arc::new(RwLock::new(ModuleGraph::new())),
        })
    }

    /// Build the project
    pub async fn build(&self) -> Result<BuildResult> {
        let start = Instant::now();

        self.plugins.run_build_start().await?;

        info!("Building module graph...");
        self.build_module_graph().await?;

        info!("Transforming modules...");
        self.transform_modules()?;

        info!("Generating chunks...");
        let (chunks, async_targets) = self.generate_chunks()?;

        info!("Writing bundles...");
        fs::create_dir_all(&self.config.out_dir).context("Failed to create output directory")?;

        let mut bundles = Vec::new();
        for chunk in &chunks {
            if chunk.is_empty() {
                continue;
            }
            bundles.push(self.write_chunk(chunk, &async_targets)?);
        }

        let css_files = self.emit_stylesheets(&chunks).await?;

        let manifest = self.write_manifest(&bundles, &css_files)?;

        self.plugins.run_build_end().await?;

        debug!("Build completed in {:?}", start.elapsed());

        Ok(BuildResult { bundles, manifest })
    }

    /// Build the module graph by traversing from entry points
    async fn build_module_graph(&self) -> Result<()> {
        for (name, path) in &self.config.entries {
            debug!("Processing entry: {} -> {}", name, path.display());
            self.process_module(path, true).await?;
        }

        Ok(())
    }

    /// Process a single module and its dependencies
    ///
    /// Uses Box::pin for async recursion to avoid infinite type size issues
    async fn process_module(&self, path: &Path, is_entry: bool) -> Result<ModuleId> {
        let canonical_path = fs::canonicalize(path)
            .with_context(|| format!("Failed to resolve module path: {}", path.display()))?;

        {
            let graph = self.graph.read();
            if let Some(id) = graph.get_module_id(&canonical_path) {
                return Ok(id);
            }
        }

        let source = fs::read_to_string(&canonical_path)
            .with_context(|| format!("Failed to read module: {}", canonical_path.display()))?;

        let module_type = Module::detect_type(&canonical_path);
        let extracted = self.resolver.extract_imports(&source, &module_type);

        let module = Module {
            path: canonical_path.clone(),
            source,
            module_type,
            is_entry,
            dependencies: extracted.imports.clone(),
            dynamic_dependencies: extracted.dynamic_imports.clone(),
            transformed: None,
            emitted_css: None,
        };

        let module_id = {
            let mut graph = self.graph.write();
            graph.add_module(module)
        };

        for dep in &extracted.imports {
            if let Some(resolved) = self.resolver.resolve(dep, &canonical_path)? {
                let dep_id = Box::pin(self.process_module(&resolved, false)).await?;
                self.graph.write().add_dependency(module_id, dep_id);
            }
        }

        for dep in &extracted.dynamic_imports {
            if let Some(resolved) = self.resolver.resolve(dep, &canonical_path)? {
                let dep_id = Box::pin(self.process_module(&resolved, false)).await?;
                self.graph.write().add_dynamic_dependency(module_id, dep_id);
            }
        }

        Ok(module_id)
    }

    /// Run every module through its loader chain
    fn transform_modules(&self) -> Result<()> {
        let module_ids = self.graph.read().all_module_ids();

        for id in module_ids {
            let (source, path, module_type) = {
                let graph = self.graph.read();
                let module = graph.get_module(id).context("Module vanished from graph")?;
                (
                    module.source.clone(),
                    module.path.clone(),
                    module.module_type.clone(),
                )
            };

            let output = self.transformer.transform(&source, &path, &module_type)?;

            let mut graph = self.graph.write();
            if let Some(module) = graph.get_module_mut(id) {
                module.transformed = Some(output.code);
                module.emitted_css = output.emitted_css;
            }
        }

        Ok(())
    }

    /// Group modules into an entry chunk per entry point plus a numbered
    /// async chunk per dynamic import target
    fn generate_chunks(&self) -> Result<(Vec<Chunk>, HashMap<ModuleId, u32>)> {
        let graph = self.graph.read();

        let mut chunks = Vec::new();
        let mut entry_modules = HashSet::new();

        for (name, path) in &self.config.entries {
            let canonical_path = fs::canonicalize(path)?;

            if let Some(entry_id) = graph.get_module_id(&canonical_path) {
                let module_ids = graph.get_reachable_modules(entry_id);
                entry_modules.extend(module_ids.iter().copied());
                chunks.push(Chunk::entry(name.clone(), module_ids));
            }
        }

        let mut async_targets = HashMap::new();
        let mut next_id: u32 = 1;

        for target in graph.dynamic_import_targets() {
            let module_ids: Vec<ModuleId> = graph
                .get_reachable_modules(target)
                .into_iter()
                .filter(|id| !entry_modules.contains(id))
                .collect();

            async_targets.insert(target, next_id);
            chunks.push(Chunk::async_chunk(next_id, module_ids));
            next_id += 1;
        }

        Ok((chunks, async_targets))
    }

    /// Assemble and write one chunk
    fn write_chunk(
        &self,
        chunk: &Chunk,
        async_targets: &HashMap<ModuleId, u32>,
    ) -> Result<BundleInfo> {
        let filename = chunk.filename(&self.config.names);
        let sourcemap_enabled = self.config.devtool.is_some() && !self.config.optimization.minify;

        let graph = self.graph.read();
        let mut out = String::new();
        let mut map = sourcemap_enabled.then(SourceMapBuilder::new);

        if chunk.is_entry() {
            push_unmapped(&mut out, &mut map, RUNTIME_HEADER);
        } else {
            push_unmapped(
                &mut out,
                &mut map,
                "var __weft_modules__ = window.__weft_modules__;\n",
            );
        }

        for &module_id in &chunk.module_ids {
            let module = graph
                .get_module(module_id)
                .context("Module vanished from graph")?;

            let key = self.module_key(&module.path);
            let code = module.transformed.as_ref().unwrap_or(&module.source);
            let code = self.rewrite_dynamic_imports(module, code, &graph, async_targets)?;
            let code = lower::lower_module_syntax(&code, &self.import_keys(module)?)?;

            push_unmapped(
                &mut out,
                &mut map,
                &format!(
                    "\n// Module: {}\n__weft_modules__[\"{}\"] = function(module, exports, require) {{\n",
                    key, key
                ),
            );

            if let Some(builder) = map.as_mut() {
                let source_index =
                    builder.add_source(key.clone(), module.source.clone());
                let original_lines = module.source.lines().count().max(1);
                for (i, line) in code.lines().enumerate() {
                    out.push_str(line);
                    out.push('\n');
                    builder.add_mapped_line(source_index, i.min(original_lines - 1));
                }
            } else {
                out.push_str(&code);
                if !code.ends_with('\n') {
                    out.push('\n');
                }
            }

            push_unmapped(&mut out, &mut map, "};\n");
        }

        if chunk.is_entry() {
            if let Some(&entry_id) = chunk.module_ids.first() {
                let entry = graph
                    .get_module(entry_id)
                    .context("Entry module vanished from graph")?;
                push_unmapped(
                    &mut out,
                    &mut map,
                    &format!(
                        "\n// Execute entry point\n__weft_require__(\"{}\");\n",
                        self.module_key(&entry.path)
                    ),
                );
            }
        }

        let mut final_code = if self.config.optimization.minify {
            minify_code(&out)
        } else {
            out
        };

        let output_path = self.config.out_dir.join(&filename);
        let mut sourcemap_path = None;

        if let Some(builder) = map {
            let map_filename = format!("{}.map", filename);
            final_code.push_str(&format!("//# sourceMappingURL={}\n", map_filename));

            let map_path = self.config.out_dir.join(&map_filename);
            fs::write(&map_path, builder.build(&filename))
                .with_context(|| format!("Failed to write source map: {}", map_path.display()))?;
            sourcemap_path = Some(map_path);
        }

        fs::write(&output_path, &final_code)
            .with_context(|| format!("Failed to write bundle: {}", output_path.display()))?;

        Ok(BundleInfo {
            output_path,
            size: final_code.len(),
            sourcemap_path,
        })
    }

    /// Replace dynamic import() calls with runtime chunk loads
    fn rewrite_dynamic_imports(
        &self,
        module: &Module,
        code: &str,
        graph: &ModuleGraph,
        async_targets: &HashMap<ModuleId, u32>,
    ) -> Result<String> {
        if module.dynamic_dependencies.is_empty() {
            return Ok(code.to_string());
        }

        let mut rewritten = code.to_string();

        for spec in &module.dynamic_dependencies {
            let resolved = match self.resolver.resolve(spec, &module.path)? {
                Some(path) => fs::canonicalize(&path)?,
                None => continue,
            };

            let target_id = graph
                .get_module_id(&resolved)
                .context("Dynamic import target missing from graph")?;
            let chunk_id = async_targets
                .get(&target_id)
                .context("Dynamic import target has no chunk")?;

            let replacement = format!(
                "__weft_import__(\"{}\", \"{}\")",
                self.config.names.js_chunk_for(*chunk_id),
                self.module_key(&resolved)
            );

            for quote in ['"', '\''] {
                let call = format!("import({q}{spec}{q})", q = quote, spec = spec);
                rewritten = rewritten.replace(&call, &replacement);
                let spaced = format!("import({q}{spec}{q} )", q = quote, spec = spec);
                rewritten = rewritten.replace(&spaced, &replacement);
            }
        }

        Ok(rewritten)
    }

    /// Collect per-chunk CSS, run the plugin pipeline, and write the
    /// resulting assets
    async fn emit_stylesheets(&self, chunks: &[Chunk]) -> Result<Vec<(String, String)>> {
        let mut assets = Assets::default();

        {
            let graph = self.graph.read();
            for chunk in chunks {
                let css: Vec<String> = chunk
                    .module_ids
                    .iter()
                    .filter_map(|&id| graph.get_module(id).and_then(|m| m.emitted_css.clone()))
                    .collect();

                if css.is_empty() {
                    continue;
                }

                assets.css_chunks.push(CssChunk {
                    name: chunk.name.clone(),
                    entry: chunk.is_entry(),
                    source: css.join("\n"),
                });
            }
        }

        self.plugins.process_assets(&mut assets).await?;

        let mut written = Vec::new();
        for file in &assets.files {
            let path = self.config.out_dir.join(&file.filename);
            fs::write(&path, &file.contents)
                .with_context(|| format!("Failed to write asset: {}", path.display()))?;
            written.push((file.filename.clone(), file.contents.clone()));
        }

        Ok(written)
    }

    /// Write the asset manifest and return it
    fn write_manifest(
        &self,
        bundles: &[BundleInfo],
        css_files: &[(String, String)],
    ) -> Result<BTreeMap<String, String>> {
        let mut manifest = BTreeMap::new();

        for bundle in bundles {
            if let Some(filename) = bundle.output_path.file_name() {
                let contents = fs::read(&bundle.output_path)?;
                manifest.insert(
                    filename.to_string_lossy().to_string(),
                    utils::hash_content(&contents),
                );
            }
        }

        for (filename, contents) in css_files {
            manifest.insert(filename.clone(), utils::hash_content(contents.as_bytes()));
        }

        let manifest_path = self.config.out_dir.join("manifest.json");
        let manifest_json = serde_json::to_string_pretty(&manifest)?;
        fs::write(&manifest_path, manifest_json).context("Failed to write manifest.json")?;

        Ok(manifest)
    }

    /// Map a module's import specifiers to module keys for lowering
    ///
    /// External specifiers map to themselves; the runtime hands back an
    /// empty exports object for keys it does not know.
    fn import_keys(&self, module: &Module) -> Result<HashMap<String, String>> {
        let mut keys = HashMap::new();

        for spec in &module.dependencies {
            let key = match self.resolver.resolve(spec, &module.path)? {
                Some(path) => {
                    let canonical = fs::canonicalize(&path)?;
                    self.module_key(&canonical)
                }
                None => spec.clone(),
            };
            keys.insert(spec.clone(), key);
        }

        Ok(keys)
    }

    /// Stable module key: path relative to the project root
    fn module_key(&self, path: &Path) -> String {
        utils::relative_path(&self.root, path).unwrap_or_else(|| path.display().to_string())
    }
}

/// Append text to the output, marking its lines unmapped
fn push_unmapped(out: &mut String, map: &mut Option<SourceMapBuilder>, text: &str) {
    for line in text.lines() {
        out.push_str(line);
        out.push('\n');
        if let Some(builder) = map.as_mut() {
            builder.add_unmapped_line();
        }
    }
}

const RUNTIME_HEADER: &str = r#"// Weft runtime
(function() {
  var modules = window.__weft_modules__ = window.__weft_modules__ || {};
  var cache = {};

  function require(moduleId) {
    if (cache[moduleId]) {
      return cache[moduleId].exports;
    }

    var module = { exports: {} };
    cache[moduleId] = module;

    var moduleFn = modules[moduleId];
    if (moduleFn) {
      moduleFn(module, module.exports, require);
    }

    return module.exports;
  }

  function importChunk(src, moduleId) {
    return new Promise(function (resolve, reject) {
      if (modules[moduleId]) {
        resolve(require(moduleId));
        return;
      }
      var script = document.createElement('script');
      script.src = src;
      script.onload = function () { resolve(require(moduleId)); };
      script.onerror = function () { reject(new Error('Failed to load chunk ' + src)); };
      document.head.appendChild(script);
    });
  }

  window.__weft_require__ = require;
  window.__weft_import__ = importChunk;
})();
"#;

/// Whitespace-and-comment JavaScript minifier
///
/// String and template literal contents are preserved; comments are
/// dropped; whitespace runs collapse to a single space, or a newline
/// when the run contained one.
fn minify_code(code: &str) -> String {
    #[derive(PartialEq)]
    enum State {
        Code,
        Str(char),
        LineComment,
        BlockComment,
    }

    let mut result = String::with_capacity(code.len());
    let mut state = State::Code;
    let mut prev = ' ';
    let mut chars = code.chars().peekable();

    while let Some(c) = chars.next() {
        match state {
            State::LineComment => {
                if c == '\n' {
                    state = State::Code;
                    if !result.ends_with('\n') {
                        result.push('\n');
                    }
                }
            }
            State::BlockComment => {
                if prev == '*' && c == '/' {
                    state = State::Code;
                }
                prev = c;
            }
            State::Str(quote) => {
                result.push(c);
                if c == quote && prev != '\\' {
                    state = State::Code;
                }
                prev = c;
            }
            State::Code => {
                if c == '"' || c == '\'' || c == '`' {
                    state = State::Str(c);
                    result.push(c);
                    prev = c;
                    continue;
                }

                if c == '/' {
                    match chars.peek() {
                        Some('/') => {
                            chars.next();
                            state = State::LineComment;
                            continue;
                        }
                        Some('*') => {
                            chars.next();
                            prev = ' ';
                            state = State::BlockComment;
                            continue;
                        }
                        _ => {}
                    }
                }

                if c.is_whitespace() {
                    if c == '\n' && result.ends_with(' ') {
                        result.pop();
                        result.push('\n');
                    } else if !result.ends_with(' ') && !result.ends_with('\n') {
                        result.push(if c == '\n' { '\n' } else { ' ' });
                    }
                } else {
                    result.push(c);
                }

                prev = c;
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minify_strips_comments() {
        let code = "// header\nvar a = 1; /* note */ var b = 2;\n";
        let min = minify_code(code);
        assert!(!min.contains("header"));
        assert!(!min.contains("note"));
        assert!(min.contains("var a = 1;"));
        assert!(min.contains("var b = 2;"));
    }

    #[test]
    fn test_minify_preserves_strings() {
        let code = "var s = \"  spaced  // not a comment  \";";
        let min = minify_code(code);
        assert!(min.contains("\"  spaced  // not a comment  \""));
    }

    #[test]
    fn test_minify_collapses_whitespace() {
        let code = "var    a


        = 1;";
        let min = minify_code(code);
        assert_eq!(min, "var a\n= 1;");
    }
}
