//! Stylesheet loader chain
//!
//! Runs CSS through lightningcss and hands it to one of two terminal
//! steps: runtime style injection (development) or extraction to a
//! stylesheet asset (production).

use std::path::Path;

use anyhow::Result;
use lightningcss::printer::PrinterOptions;
use lightningcss::stylesheet::{ParserOptions, StyleSheet};

use crate::config::LoaderStep;

/// Terminal result of the stylesheet chain
#[derive(Debug, Clone)]
pub enum StyleOutput {
    /// JS that injects the styles into the document at runtime
    Inject { code: String },
    /// Processed CSS destined for the extraction plugin
    Extract { css: String },
}

/// Run a stylesheet through an ordered loader chain
pub fn process(source: &str, path: &Path, steps: &[LoaderStep]) -> Result<StyleOutput> {
    let mut css = source.to_string();
    let mut terminal = None;

    for step in steps {
        match step {
            LoaderStep::CssParse { .. } => {
                // Parse for validation; diagnostics carry the filename.
                parse(&css, path)?;
            }
            LoaderStep::CssTransform => {
                css = reprint(&css, path)?;
            }
            LoaderStep::StyleInject => {
                terminal = Some(StyleOutput::Inject {
                    code: inject_wrapper(&css),
                });
            }
            LoaderStep::CssExtract => {
                terminal = Some(StyleOutput::Extract { css: css.clone() });
            }
            other => anyhow::bail!(
                "Loader step {:?} is not valid in a stylesheet chain",
                other
            ),
        }
    }

    terminal.ok_or_else(|| anyhow::anyhow!("Stylesheet chain has no terminal step"))
}

fn parser_options(path: &Path) -> ParserOptions {
    ParserOptions {
        filename: path.display().to_string(),
        ..ParserOptions::default()
    }
}

fn parse(source: &str, path: &Path) -> Result<()> {
    StyleSheet::parse(source, parser_options(path))
        .map_err(|e| anyhow::anyhow!("Failed to parse CSS {}: {}", path.display(), e))?;
    Ok(())
}

/// Normalizing print pass, not minified; minification is the
/// minimizer plugin's job.
fn reprint(source: &str, path: &Path) -> Result<String> {
    let stylesheet = StyleSheet::parse(source, parser_options(path))
        .map_err(|e| anyhow::anyhow!("Failed to parse CSS {}: {}", path.display(), e))?;

    let output = stylesheet
        .to_css(PrinterOptions::default())
        .map_err(|e| anyhow::anyhow!("Failed to print CSS {}: {}", path.display(), e))?;

    Ok(output.code)
}

/// Wrap CSS in code that appends a style element at runtime, giving the
/// development bundle live styles without a separate stylesheet file.
fn inject_wrapper(css: &str) -> String {
    let escaped = css
        .replace('\\', "\\\\")
        .replace('`', "\\`")
        .replace("${", "\\${");

    format!(
        r#"(function() {{
  var style = document.createElement('style');
  style.textContent = `{}`;
  document.head.appendChild(style);
}})();
module.exports = {{}};
"#,
        escaped
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn dev_steps() -> Vec<LoaderStep> {
        vec![
            LoaderStep::CssParse { import_loaders: 1 },
            LoaderStep::CssTransform,
            LoaderStep::StyleInject,
        ]
    }

    fn prod_steps() -> Vec<LoaderStep> {
        vec![
            LoaderStep::CssParse { import_loaders: 1 },
            LoaderStep::CssTransform,
            LoaderStep::CssExtract,
        ]
    }

    #[test]
    fn test_inject_terminal_wraps_css() {
        let out = process(
            "body { color: red; }",
            &PathBuf::from("test.css"),
            &dev_steps(),
        )
        .unwrap();

        match out {
            StyleOutput::Inject { code } => {
                assert!(code.contains("document.createElement('style')"));
                assert!(code.contains("color"));
                assert!(code.ends_with("module.exports = {};\n"));
            }
            StyleOutput::Extract { .. } => panic!("expected injection"),
        }
    }

    #[test]
    fn test_extract_terminal_returns_css() {
        let out = process(
            "body { color: red; }",
            &PathBuf::from("test.css"),
            &prod_steps(),
        )
        .unwrap();

        match out {
            StyleOutput::Extract { css } => {
                assert!(css.contains("color"));
                assert!(!css.contains("document"));
            }
            StyleOutput::Inject { .. } => panic!("expected extraction"),
        }
    }

    #[test]
    fn test_invalid_css_rejected() {
        let result = process("body { color: }", &PathBuf::from("bad.css"), &prod_steps());
        assert!(result.is_err());
    }

    #[test]
    fn test_backticks_escaped_for_injection() {
        let out = process(
            "div::after { content: '`'; }",
            &PathBuf::from("test.css"),
            &dev_steps(),
        )
        .unwrap();

        match out {
            StyleOutput::Inject { code } => assert!(code.contains("\\`")),
            StyleOutput::Extract { .. } => panic!("expected injection"),
        }
    }
}
