//! Configuration schema definitions

use serde::{Deserialize, Serialize};

/// Project metadata configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectMeta {
    /// Project name
    pub name: String,

    /// Project version
    #[serde(default = "default_version")]
    pub version: String,
}

fn default_version() -> String {
    "0.1.0".to_string()
}

/// Output configuration
///
/// Filename fields are templates: `[name]` is replaced with the entry or
/// chunk name, `[id]` with the numeric chunk id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output directory
    #[serde(default = "default_output_dir")]
    pub dir: String,

    /// Entry bundle filename template
    #[serde(default = "default_filename")]
    pub filename: String,

    /// Async chunk filename template
    #[serde(default = "default_chunk_filename")]
    pub chunk_filename: String,

    /// Extracted stylesheet filename template
    #[serde(default = "default_css_filename")]
    pub css_filename: String,

    /// Extracted stylesheet filename template for async chunks
    #[serde(default = "default_css_chunk_filename")]
    pub css_chunk_filename: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            filename: default_filename(),
            chunk_filename: default_chunk_filename(),
            css_filename: default_css_filename(),
            css_chunk_filename: default_css_chunk_filename(),
        }
    }
}

fn default_output_dir() -> String {
    "public".to_string()
}

fn default_filename() -> String {
    "[name].js".to_string()
}

fn default_chunk_filename() -> String {
    "bundle.[id].js".to_string()
}

fn default_css_filename() -> String {
    "[name].css".to_string()
}

fn default_css_chunk_filename() -> String {
    "bundle.[name].css".to_string()
}

/// Module resolution configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveConfig {
    /// File extensions tried, in priority order, for extensionless imports
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Name of the component framework package
    #[serde(default = "default_framework")]
    pub framework: String,

    /// Pinned on-disk location of the framework package, relative to the
    /// project root. When unset, `node_modules/<framework>` is probed.
    /// Pinning guarantees a single copy of the framework runtime ends up
    /// in the bundle.
    #[serde(default)]
    pub framework_dir: Option<String>,

    /// package.json fields consulted, in order, when resolving the
    /// framework package entry
    #[serde(default = "default_main_fields")]
    pub main_fields: Vec<String>,
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            framework: default_framework(),
            framework_dir: None,
            main_fields: default_main_fields(),
        }
    }
}

fn default_extensions() -> Vec<String> {
    vec!["mjs".to_string(), "js".to_string(), "svelte".to_string()]
}

fn default_framework() -> String {
    "svelte".to_string()
}

fn default_main_fields() -> Vec<String> {
    vec![
        "svelte".to_string(),
        "browser".to_string(),
        "module".to_string(),
        "main".to_string(),
    ]
}
