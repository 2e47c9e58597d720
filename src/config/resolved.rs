//! Resolved build configuration
//!
//! [`ResolvedConfig::resolve`] combines a [`ProjectConfig`] with an
//! explicit [`Mode`] into a fully-typed configuration: resolution rules,
//! per-file-type loader chains, plugin selection, and output naming. The
//! result is validated before the bundler ever sees it.

use std::fmt;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::bundler::ModuleType;
use crate::config::ProjectConfig;

/// Build mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Development,
    Production,
}

impl Mode {
    /// Interpret the mode input. This is the only place the value is
    /// interpreted: `"production"` selects production, anything else
    /// (including absence) falls back to development.
    pub fn from_flag(value: Option<&str>) -> Self {
        match value {
            Some("production") => Mode::Production,
            Some(other) => {
                if other != "development" {
                    tracing::debug!("Unrecognized mode '{}', using development", other);
                }
                Mode::Development
            }
            None => Mode::Development,
        }
    }

    pub fn is_production(self) -> bool {
        matches!(self, Mode::Production)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Development => write!(f, "development"),
            Mode::Production => write!(f, "production"),
        }
    }
}

/// Script transpilation settings for component preprocessing
///
/// The target is modern module-capable environments, so no syntax
/// down-leveling happens; `modules: false` leaves import/export intact
/// for the bundler to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranspileOptions {
    /// Target environments that support native ES modules
    pub esmodules: bool,
    /// Loose-mode semantics
    pub loose: bool,
    /// Whether to transform module syntax (the bundler does this instead)
    pub modules: bool,
}

impl Default for TranspileOptions {
    fn default() -> Self {
        Self {
            esmodules: true,
            loose: true,
            modules: false,
        }
    }
}

/// A single step in a loader chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoaderStep {
    /// Extract and transpile component script blocks
    Preprocess(TranspileOptions),
    /// Compile component markup into a module
    CompileComponent,
    /// Parse CSS with module semantics
    CssParse { import_loaders: u8 },
    /// lightningcss post-processing pass
    CssTransform,
    /// Terminal step: wrap styles in runtime-injection code
    StyleInject,
    /// Terminal step: hand styles to the extraction plugin
    CssExtract,
    /// Convert JSON into a module
    JsonModule,
}

/// A transformation rule: an ordered loader chain keyed by module type
#[derive(Debug, Clone)]
pub struct Rule {
    pub test: ModuleType,
    pub steps: Vec<LoaderStep>,
}

/// Source map emission setting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Devtool {
    SourceMap,
}

/// Optimization switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Optimization {
    /// Minify emitted JavaScript
    pub minify: bool,
    /// Run the CSS minimizer plugin over extracted stylesheets
    pub css_minimizer: bool,
}

/// Module resolution rules
#[derive(Debug, Clone)]
pub struct ResolveRules {
    /// Extension priority order for extensionless imports
    pub extensions: Vec<String>,
    /// Specifier aliases, each pinning a package to one on-disk path
    pub alias: Vec<(String, PathBuf)>,
    /// package.json fields consulted for package entry resolution
    pub main_fields: Vec<String>,
}

/// Output filename templates, pre-validated
#[derive(Debug, Clone)]
pub struct OutputNames {
    pub js: String,
    pub js_chunk: String,
    pub css: String,
    pub css_chunk: String,
}

impl OutputNames {
    pub fn js_for(&self, name: &str) -> String {
        self.js.replace("[name]", name)
    }

    pub fn js_chunk_for(&self, id: u32) -> String {
        self.js_chunk.replace("[id]", &id.to_string())
    }

    pub fn css_for(&self, name: &str) -> String {
        self.css.replace("[name]", name)
    }

    pub fn css_chunk_for(&self, name: &str) -> String {
        self.css_chunk.replace("[name]", name)
    }
}

/// Fully-resolved build configuration
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Project root directory
    pub root: PathBuf,
    /// Build mode the configuration was resolved for
    pub mode: Mode,
    /// Resolved entry points
    pub entries: Vec<(String, PathBuf)>,
    /// Absolute output directory
    pub out_dir: PathBuf,
    /// Output filename templates
    pub names: OutputNames,
    /// Module resolution rules
    pub resolve: ResolveRules,
    /// Transformation rules, first match wins
    pub rules: Vec<Rule>,
    /// Optimization switches
    pub optimization: Optimization,
    /// Source map setting, None in production
    pub devtool: Option<Devtool>,
}

impl ResolvedConfig {
    /// Build and validate the configuration for the given mode
    pub fn resolve(project: &ProjectConfig, mode: Mode) -> Result<Self> {
        let prod = mode.is_production();

        let mut alias = Vec::new();
        match &project.resolve.framework_dir {
            Some(dir) => {
                let path = project.root.join(dir);
                if !path.is_dir() {
                    anyhow::bail!(
                        "Pinned framework directory does not exist: {}",
                        path.display()
                    );
                }
                alias.push((project.resolve.framework.clone(), path));
            }
            None => {
                // Probe the conventional location; absence just means no alias
                let path = project
                    .root
                    .join("node_modules")
                    .join(&project.resolve.framework);
                if path.is_dir() {
                    alias.push((project.resolve.framework.clone(), path));
                }
            }
        }

        let style_terminal = if prod {
            LoaderStep::CssExtract
        } else {
            LoaderStep::StyleInject
        };

        let rules = vec![
            Rule {
                test: ModuleType::Component,
                steps: vec![
                    LoaderStep::Preprocess(TranspileOptions::default()),
                    LoaderStep::CompileComponent,
                ],
            },
            Rule {
                test: ModuleType::Css,
                steps: vec![
                    LoaderStep::CssParse { import_loaders: 1 },
                    LoaderStep::CssTransform,
                    style_terminal,
                ],
            },
            Rule {
                test: ModuleType::Json,
                steps: vec![LoaderStep::JsonModule],
            },
        ];

        let config = Self {
            root: project.root.clone(),
            mode,
            entries: project.all_entries(),
            out_dir: project.output_dir(),
            names: OutputNames {
                js: project.output.filename.clone(),
                js_chunk: project.output.chunk_filename.clone(),
                css: project.output.css_filename.clone(),
                css_chunk: project.output.css_chunk_filename.clone(),
            },
            resolve: ResolveRules {
                extensions: project.resolve.extensions.clone(),
                alias,
                main_fields: project.resolve.main_fields.clone(),
            },
            rules,
            optimization: Optimization {
                minify: prod,
                css_minimizer: prod,
            },
            devtool: if prod { None } else { Some(Devtool::SourceMap) },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        for (name, path) in &self.entries {
            if !path.is_file() {
                anyhow::bail!(
                    "Entry '{}' points to non-existent file: {}",
                    name,
                    path.display()
                );
            }
        }

        if self.resolve.extensions.is_empty() {
            anyhow::bail!("Resolution extension list must not be empty");
        }

        if !self.names.js.contains("[name]") {
            anyhow::bail!("output.filename template must contain [name]");
        }
        if !self.names.js_chunk.contains("[id]") {
            anyhow::bail!("output.chunk_filename template must contain [id]");
        }
        if !self.names.css.contains("[name]") {
            anyhow::bail!("output.css_filename template must contain [name]");
        }
        if !self.names.css_chunk.contains("[name]") {
            anyhow::bail!("output.css_chunk_filename template must contain [name]");
        }

        self.out_dir
            .parent()
            .context("Output directory has no parent")?;

        Ok(())
    }

    /// Find the transformation rule for a module type
    pub fn rule_for(&self, ty: &ModuleType) -> Option<&Rule> {
        self.rules.iter().find(|rule| &rule.test == ty)
    }
}
