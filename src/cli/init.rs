//! Project initialization command
//!
//! Scaffolds the demo application: a static Hello World component, its
//! entry module, a global stylesheet, and the project configuration.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

/// Initialize a new project
#[derive(Args, Debug)]
pub struct InitCommand {
    /// Project name / directory
    #[arg(default_value = ".")]
    pub name: String,
}

impl InitCommand {
    pub async fn execute(&self) -> Result<()> {
        let project_dir = Path::new(&self.name);
        let project_name = if self.name == "." {
            "my-app"
        } else {
            self.name.as_str()
        };

        eprintln!("{} Initializing new project...\n", "→".blue());

        if self.name != "." {
            fs::create_dir_all(project_dir).context("Failed to create project directory")?;
        }

        scaffold(project_dir, project_name)?;

        for file in [
            "weft.toml",
            "src/main.js",
            "src/App.svelte",
            "src/global.css",
            "index.html",
        ] {
            eprintln!("  {} Created {}", "✓".green(), file.cyan());
        }

        eprintln!("\n{} Project initialized successfully!\n", "✓".green().bold());

        eprintln!("  Next steps:");
        if self.name != "." {
            eprintln!("    {} cd {}", "→".dimmed(), self.name.cyan());
        }
        eprintln!("    {} weft build", "→".dimmed());
        eprintln!();

        Ok(())
    }
}

/// Write the scaffold files into a directory
pub fn scaffold(project_dir: &Path, name: &str) -> Result<()> {
    let src_dir = project_dir.join("src");
    fs::create_dir_all(&src_dir).context("Failed to create src directory")?;

    fs::write(project_dir.join("weft.toml"), config_template(name))
        .context("Failed to write weft.toml")?;
    fs::write(src_dir.join("main.js"), MAIN_JS).context("Failed to write src/main.js")?;
    fs::write(src_dir.join("App.svelte"), APP_COMPONENT)
        .context("Failed to write src/App.svelte")?;
    fs::write(src_dir.join("global.css"), GLOBAL_CSS)
        .context("Failed to write src/global.css")?;
    fs::write(project_dir.join("index.html"), index_html_template(name))
        .context("Failed to write index.html")?;

    Ok(())
}

fn config_template(name: &str) -> String {
    format!(
        r#"# Weft project configuration

[project]
name = "{}"
version = "0.1.0"

[entry]
bundle = "src/main.js"

[output]
dir = "public"
"#,
        name
    )
}

const MAIN_JS: &str = r#"import App from './App.svelte';
import './global.css';

App.mount(document.body);
"#;

const APP_COMPONENT: &str = r#"<style>
h1 {
  color: #ff3e00;
  text-align: center;
  font-family: sans-serif;
}
</style>

<h1>Hello World!</h1>
"#;

const GLOBAL_CSS: &str = r#"html, body {
  margin: 0;
  padding: 0;
}

body {
  background-color: #fafafa;
}
"#;

fn index_html_template(name: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width,initial-scale=1">
  <title>{}</title>
  <link rel="stylesheet" href="public/bundle.css">
</head>
<body>
  <script src="public/bundle.js"></script>
</body>
</html>
"#,
        name
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaffold_writes_all_files() {
        let dir = tempfile::tempdir().unwrap();
        scaffold(dir.path(), "demo").unwrap();

        assert!(dir.path().join("weft.toml").is_file());
        assert!(dir.path().join("src/main.js").is_file());
        assert!(dir.path().join("src/App.svelte").is_file());
        assert!(dir.path().join("src/global.css").is_file());
        assert!(dir.path().join("index.html").is_file());

        let config = fs::read_to_string(dir.path().join("weft.toml")).unwrap();
        assert!(config.contains("name = \"demo\""));
    }

    #[test]
    fn test_scaffolded_component_renders_hello_world() {
        let dir = tempfile::tempdir().unwrap();
        scaffold(dir.path(), "demo").unwrap();

        let result = crate::harness::render(dir.path().join("src/App.svelte")).unwrap();
        assert_eq!(result.query_all_by_text("hello world").unwrap().len(), 1);
    }
}
