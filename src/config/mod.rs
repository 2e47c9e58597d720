//! Configuration handling for Weft
//!
//! Parses and manages weft.toml project files. The project file is the
//! declarative half of configuration; the build mode is supplied
//! separately and the two are combined by [`ResolvedConfig::resolve`].

mod resolved;
mod schema;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub use resolved::*;
pub use schema::*;

/// Main project configuration structure, parsed from weft.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project metadata
    pub project: ProjectMeta,

    /// Entry points for bundling, name -> relative path
    #[serde(default = "default_entries")]
    pub entry: BTreeMap<String, String>,

    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,

    /// Module resolution configuration
    #[serde(default)]
    pub resolve: ResolveConfig,

    /// Root directory (computed from config file location)
    #[serde(skip)]
    pub root: PathBuf,
}

fn default_entries() -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    map.insert("bundle".to_string(), "src/main.js".to_string());
    map
}

impl ProjectConfig {
    /// Load configuration from a file path
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let canonical_path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()?.join(path)
        };

        let content = fs::read_to_string(&canonical_path)
            .with_context(|| format!("Failed to read config file: {}", canonical_path.display()))?;

        let mut config: ProjectConfig =
            toml::from_str(&content).with_context(|| "Failed to parse weft.toml")?;

        // Root directory is the directory containing the config file
        config.root = canonical_path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        if config.entry.is_empty() {
            anyhow::bail!("At least one entry point must be specified in weft.toml");
        }

        Ok(config)
    }

    /// Create a default configuration rooted at the given directory
    pub fn default_config(root: PathBuf) -> Self {
        Self {
            project: ProjectMeta {
                name: "my-app".to_string(),
                version: "0.1.0".to_string(),
            },
            entry: default_entries(),
            output: OutputConfig::default(),
            resolve: ResolveConfig::default(),
            root,
        }
    }

    /// Get the absolute output directory path
    pub fn output_dir(&self) -> PathBuf {
        self.root.join(&self.output.dir)
    }

    /// Get all entry point paths
    pub fn all_entries(&self) -> Vec<(String, PathBuf)> {
        self.entry
            .iter()
            .map(|(name, path)| (name.clone(), self.root.join(path)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_minimal_config() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("weft.toml");
        fs::write(
            &config_path,
            r#"
[project]
name = "demo"

[entry]
bundle = "src/main.js"
"#,
        )
        .unwrap();

        let config = ProjectConfig::load(&config_path).unwrap();
        assert_eq!(config.project.name, "demo");
        assert_eq!(config.entry.get("bundle").unwrap(), "src/main.js");
        assert_eq!(config.root, dir.path());
        // Schema defaults fill the rest
        assert_eq!(config.output.dir, "public");
        assert_eq!(config.resolve.extensions, vec!["mjs", "js", "svelte"]);
    }

    #[test]
    fn test_empty_entry_map_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("weft.toml");
        fs::write(
            &config_path,
            r#"
[project]
name = "demo"

[entry]
"#,
        )
        .unwrap();

        assert!(ProjectConfig::load(&config_path).is_err());
    }
}
