//! Plugin system for Weft
//!
//! Output-processing plugins run after module transformation: they turn
//! collected per-chunk CSS into stylesheet assets and post-process the
//! assets before anything is written to disk.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use lightningcss::printer::PrinterOptions;
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, StyleSheet};

use crate::config::OutputNames;

/// Plugin hook context
pub struct PluginContext {
    /// Project root directory
    pub root: PathBuf,
}

/// CSS collected for one chunk during transformation
#[derive(Debug, Clone)]
pub struct CssChunk {
    /// Chunk name (entry name, or the async chunk id as a string)
    pub name: String,

    /// Whether this chunk is an entry chunk
    pub entry: bool,

    /// Concatenated CSS of the chunk's modules
    pub source: String,
}

/// A finished output file, ready to be written
#[derive(Debug, Clone)]
pub struct AssetFile {
    pub filename: String,
    pub contents: String,
}

/// The mutable asset state plugins operate on
#[derive(Debug, Default)]
pub struct Assets {
    /// Raw collected CSS, consumed by the extraction plugin
    pub css_chunks: Vec<CssChunk>,

    /// Files to be written to the output directory
    pub files: Vec<AssetFile>,
}

/// Plugin trait - implement this to create a Weft plugin
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Plugin name for logging and debugging
    fn name(&self) -> &str;

    /// Called when the build starts
    async fn build_start(&self, _ctx: &PluginContext) -> Result<()> {
        Ok(())
    }

    /// Called when the build ends
    async fn build_end(&self, _ctx: &PluginContext) -> Result<()> {
        Ok(())
    }

    /// Process the asset state before emission
    async fn process_assets(&self, _assets: &mut Assets, _ctx: &PluginContext) -> Result<()> {
        Ok(())
    }
}

/// Plugin manager
pub struct PluginManager {
    plugins: Vec<Arc<dyn Plugin>>,
    context: PluginContext,
}

impl PluginManager {
    /// Create a new plugin manager
    pub fn new(root: PathBuf) -> Self {
        Self {
            plugins: Vec::new(),
            context: PluginContext { root },
        }
    }

    /// Register a plugin
    pub fn register(&mut self, plugin: Arc<dyn Plugin>) {
        self.plugins.push(plugin);
    }

    /// Number of registered plugins
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Whether any plugins are registered
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Run build_start hooks
    pub async fn run_build_start(&self) -> Result<()> {
        for plugin in &self.plugins {
            plugin.build_start(&self.context).await?;
        }
        Ok(())
    }

    /// Run build_end hooks
    pub async fn run_build_end(&self) -> Result<()> {
        for plugin in &self.plugins {
            plugin.build_end(&self.context).await?;
        }
        Ok(())
    }

    /// Run process_assets hooks in registration order
    pub async fn process_assets(&self, assets: &mut Assets) -> Result<()> {
        for plugin in &self.plugins {
            plugin.process_assets(assets, &self.context).await?;
        }
        Ok(())
    }
}

/// Extracts collected CSS into stylesheet assets
///
/// The entry chunk's CSS becomes `<name>.css`; each async chunk with
/// styles gets its own file from the chunk template.
pub struct CssExtractPlugin {
    names: OutputNames,
}

impl CssExtractPlugin {
    pub fn new(names: OutputNames) -> Self {
        Self { names }
    }
}

#[async_trait]
impl Plugin for CssExtractPlugin {
    fn name(&self) -> &str {
        "css-extract"
    }

    async fn process_assets(&self, assets: &mut Assets, _ctx: &PluginContext) -> Result<()> {
        for chunk in assets.css_chunks.drain(..) {
            if chunk.source.trim().is_empty() {
                continue;
            }

            let filename = if chunk.entry {
                self.names.css_for(&chunk.name)
            } else {
                self.names.css_chunk_for(&chunk.name)
            };

            assets.files.push(AssetFile {
                filename,
                contents: chunk.source,
            });
        }

        Ok(())
    }
}

/// Minifies extracted stylesheet assets with lightningcss
pub struct CssMinimizerPlugin;

#[async_trait]
impl Plugin for CssMinimizerPlugin {
    fn name(&self) -> &str {
        "css-minimizer"
    }

    async fn process_assets(&self, assets: &mut Assets, _ctx: &PluginContext) -> Result<()> {
        for file in assets.files.iter_mut() {
            if !file.filename.ends_with(".css") {
                continue;
            }

            let minified = {
                let mut stylesheet = StyleSheet::parse(
                    &file.contents,
                    ParserOptions {
                        filename: file.filename.clone(),
                        ..ParserOptions::default()
                    },
                )
                .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", file.filename, e))?;

                stylesheet
                    .minify(MinifyOptions::default())
                    .map_err(|e| anyhow::anyhow!("Failed to minify {}: {}", file.filename, e))?;

                stylesheet
                    .to_css(PrinterOptions {
                        minify: true,
                        ..PrinterOptions::default()
                    })
                    .map_err(|e| anyhow::anyhow!("Failed to print {}: {}", file.filename, e))?
                    .code
            };

            file.contents = minified;
        }

        Ok(())
    }
}
