//! Module resolution
//!
//! Handles extracting import specifiers from source code and resolving
//! them to actual file paths. Resolution order for extensionless imports
//! is fixed by the configured extension list; the framework package is
//! aliased to one pinned on-disk location so only a single copy of its
//! runtime is ever bundled.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::bundler::ModuleType;
use crate::config::ResolvedConfig;

/// Regex patterns for extracting imports
static IMPORT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?:import|export)\s+(?:(?:\w+\s*,\s*\{[^}]*\}|\{[^}]*\}|\*\s+as\s+\w+|\w+)\s+from\s+)?["']([^"']+)["']|require\s*\(\s*["']([^"']+)["']\s*\)"#).unwrap()
});

static DYNAMIC_IMPORT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"import\s*\(\s*["']([^"']+)["']\s*\)"#).unwrap()
});

/// Import specifiers extracted from a module's source
#[derive(Debug, Default, Clone)]
pub struct ExtractedImports {
    /// Static import/export/require specifiers
    pub imports: Vec<String>,

    /// Dynamic import() specifiers
    pub dynamic_imports: Vec<String>,
}

/// Module resolver
pub struct Resolver {
    config: Arc<ResolvedConfig>,
}

impl Resolver {
    /// Create a new resolver
    pub fn new(config: Arc<ResolvedConfig>) -> Self {
        Self { config }
    }

    /// Extract import specifiers from source code
    ///
    /// Component sources are scanned whole; their imports live inside
    /// script blocks, which the regex reaches without preprocessing.
    pub fn extract_imports(&self, source: &str, module_type: &ModuleType) -> ExtractedImports {
        if !module_type.is_js_like() {
            return ExtractedImports::default();
        }

        let mut extracted = ExtractedImports::default();

        for cap in DYNAMIC_IMPORT_REGEX.captures_iter(source) {
            if let Some(specifier) = cap.get(1) {
                let spec = specifier.as_str().to_string();
                if !extracted.dynamic_imports.contains(&spec) {
                    extracted.dynamic_imports.push(spec);
                }
            }
        }

        for cap in IMPORT_REGEX.captures_iter(source) {
            if let Some(specifier) = cap.get(1).or_else(|| cap.get(2)) {
                let spec = specifier.as_str().to_string();
                if !extracted.imports.contains(&spec)
                    && !extracted.dynamic_imports.contains(&spec)
                {
                    extracted.imports.push(spec);
                }
            }
        }

        debug!(
            "Found {} static and {} dynamic imports",
            extracted.imports.len(),
            extracted.dynamic_imports.len()
        );

        extracted
    }

    /// Resolve an import specifier to an absolute file path
    ///
    /// Returns `Ok(None)` for bare specifiers that are not aliased; those
    /// are treated as external. Relative specifiers that cannot be
    /// resolved are an error.
    pub fn resolve(&self, specifier: &str, from: &Path) -> Result<Option<PathBuf>> {
        debug!("Resolving '{}' from '{}'", specifier, from.display());

        // Alias table is consulted first so the pinned framework copy
        // always wins over any other resolution path.
        for (key, target) in &self.config.resolve.alias {
            if specifier == key {
                let resolved = self.resolve_package_entry(target)?;
                return Ok(Some(resolved));
            }
            if let Some(subpath) = specifier.strip_prefix(&format!("{}/", key)) {
                let resolved = self.resolve_relative(&format!("./{}", subpath), target)?;
                return Ok(Some(resolved));
            }
        }

        if !specifier.starts_with('.') && !specifier.starts_with('/') {
            debug!("Treating bare specifier as external: {}", specifier);
            return Ok(None);
        }

        let base_dir = from.parent().unwrap_or(Path::new("."));
        let resolved = self
            .resolve_relative(specifier, base_dir)
            .with_context(|| {
                format!("Cannot resolve import '{}' from {}", specifier, from.display())
            })?;

        debug!("Resolved to: {}", resolved.display());

        Ok(Some(resolved))
    }

    /// Resolve a relative import against a base directory
    fn resolve_relative(&self, specifier: &str, base_dir: &Path) -> Result<PathBuf> {
        let target = base_dir.join(specifier);

        // Exact path first
        if target.is_file() {
            return Ok(target);
        }

        // Then the fixed extension priority order
        for ext in &self.config.resolve.extensions {
            let candidate = PathBuf::from(format!("{}.{}", target.display(), ext));
            if candidate.is_file() {
                return Ok(candidate);
            }
        }

        // Then as a directory with an index file
        if target.is_dir() {
            for ext in &self.config.resolve.extensions {
                let index = target.join(format!("index.{}", ext));
                if index.is_file() {
                    return Ok(index);
                }
            }
        }

        anyhow::bail!("No file found for '{}'", specifier)
    }

    /// Resolve the entry file of a pinned package directory
    ///
    /// Consults package.json fields in the configured main_fields order,
    /// falling back to index resolution inside the package directory.
    fn resolve_package_entry(&self, package_dir: &Path) -> Result<PathBuf> {
        let package_json = package_dir.join("package.json");

        if package_json.is_file() {
            let content = fs::read_to_string(&package_json)
                .with_context(|| format!("Failed to read {}", package_json.display()))?;
            let pkg: serde_json::Value = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse {}", package_json.display()))?;

            for field in &self.config.resolve.main_fields {
                if let Some(entry) = pkg.get(field).and_then(|v| v.as_str()) {
                    if let Ok(resolved) = self.resolve_relative(entry, package_dir) {
                        return Ok(resolved);
                    }
                }
            }
        }

        self.resolve_relative("./index", package_dir)
            .with_context(|| {
                format!(
                    "No entry found for pinned package at {}",
                    package_dir.display()
                )
            })
    }
}
