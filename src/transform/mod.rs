//! Code transformation
//!
//! Drives the per-file-type loader chains declared in the resolved
//! configuration: component preprocessing and compilation, the CSS
//! pipeline, and JSON module conversion.

mod component;
mod style;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;

use crate::bundler::ModuleType;
use crate::config::{LoaderStep, ResolvedConfig};

pub use component::{split_component, ComponentParts, ScriptLang};
pub use style::StyleOutput;

/// Result of running a module through its loader chain
#[derive(Debug, Clone)]
pub struct TransformOutput {
    /// Transformed module code
    pub code: String,

    /// Stylesheet content destined for the extraction plugin, if the
    /// chain ended in CssExtract
    pub emitted_css: Option<String>,
}

impl TransformOutput {
    fn code_only(code: String) -> Self {
        Self {
            code,
            emitted_css: None,
        }
    }
}

/// Code transformer
pub struct Transformer {
    config: Arc<ResolvedConfig>,
}

impl Transformer {
    /// Create a new transformer
    pub fn new(config: Arc<ResolvedConfig>) -> Self {
        Self { config }
    }

    /// Transform source code based on module type
    pub fn transform(
        &self,
        source: &str,
        path: &Path,
        module_type: &ModuleType,
    ) -> Result<TransformOutput> {
        match self.config.rule_for(module_type) {
            Some(rule) => match module_type {
                ModuleType::Component => self.transform_component(source, path, &rule.steps),
                ModuleType::Css => self.transform_css(source, path, &rule.steps),
                ModuleType::Json => self.transform_json(source, path),
                _ => Ok(TransformOutput::code_only(source.to_string())),
            },
            // Plain scripts have no chain: the transpile target is
            // modern modules, so they pass through untouched.
            None => Ok(TransformOutput::code_only(source.to_string())),
        }
    }

    /// Run a component through preprocessing and compilation
    fn transform_component(
        &self,
        source: &str,
        path: &Path,
        steps: &[LoaderStep],
    ) -> Result<TransformOutput> {
        debug!("Compiling component: {}", path.display());

        let parts = component::split_component(source)
            .with_context(|| format!("Failed to parse component {}", path.display()))?;

        let mut script = String::new();
        let mut compiled = None;

        for step in steps {
            match step {
                LoaderStep::Preprocess(options) => {
                    script = component::preprocess_scripts(&parts, *options)?;
                }
                LoaderStep::CompileComponent => {
                    compiled = Some(component::compile(&parts, &script));
                }
                other => anyhow::bail!(
                    "Loader step {:?} is not valid in a component chain",
                    other
                ),
            }
        }

        let mut code =
            compiled.context("Component chain is missing a compile step")?;

        // Component styles share the stylesheet pipeline (emit-css
        // semantics); in development they are appended as injection
        // code, in production they flow to the extraction plugin.
        let mut emitted_css = None;
        if let Some(style_source) = &parts.style {
            let css_steps = self
                .config
                .rule_for(&ModuleType::Css)
                .map(|rule| rule.steps.as_slice())
                .context("No stylesheet rule configured for component styles")?;

            match style::process(style_source, path, css_steps)? {
                StyleOutput::Inject { code: inject } => {
                    code.push('\n');
                    code.push_str(&inject);
                }
                StyleOutput::Extract { css } => {
                    emitted_css = Some(css);
                }
            }
        }

        Ok(TransformOutput { code, emitted_css })
    }

    /// Run a stylesheet through the CSS chain
    fn transform_css(
        &self,
        source: &str,
        path: &Path,
        steps: &[LoaderStep],
    ) -> Result<TransformOutput> {
        debug!("Transforming CSS: {}", path.display());

        match style::process(source, path, steps)? {
            StyleOutput::Inject { code } => Ok(TransformOutput::code_only(code)),
            StyleOutput::Extract { css } => Ok(TransformOutput {
                // The module itself becomes an empty stub; its content
                // lives in the extracted stylesheet.
                code: "module.exports = {};".to_string(),
                emitted_css: Some(css),
            }),
        }
    }

    /// Transform JSON to a JS module
    fn transform_json(&self, source: &str, path: &Path) -> Result<TransformOutput> {
        debug!("Transforming JSON: {}", path.display());

        serde_json::from_str::<serde_json::Value>(source)
            .with_context(|| format!("Invalid JSON in {}", path.display()))?;

        Ok(TransformOutput::code_only(format!(
            "module.exports = {};",
            source
        )))
    }
}
