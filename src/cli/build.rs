//! Build command implementation

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use tracing::info;

use crate::bundler::Bundler;
use crate::config::{Mode, ProjectConfig, ResolvedConfig};
use crate::utils;

/// Bundle the project
#[derive(Args, Debug)]
pub struct BuildCommand {
    /// Build mode: "production", or anything else for development.
    /// Falls back to the NODE_ENV environment variable when omitted.
    #[arg(short, long, env = "NODE_ENV")]
    pub mode: Option<String>,

    /// Output directory override
    #[arg(short, long)]
    pub outdir: Option<PathBuf>,
}

impl BuildCommand {
    pub async fn execute(&self, config_path: &str) -> Result<()> {
        let start = Instant::now();

        info!("Loading configuration from {}", config_path);
        let mut project = ProjectConfig::load(config_path)?;

        if let Some(outdir) = &self.outdir {
            project.output.dir = outdir.display().to_string();
        }

        // Flag and environment are interpreted here, once; the pipeline
        // only ever sees the resolved Mode.
        let mode = Mode::from_flag(self.mode.as_deref());
        let config = ResolvedConfig::resolve(&project, mode)?;

        eprintln!("{} Building in {} mode...", "→".blue(), mode.to_string().cyan());

        let bundler = Bundler::new(config)?;
        let result = bundler.build().await?;

        eprintln!(
            "\n{} Built {} bundle(s) in {}\n",
            "✓".green().bold(),
            result.bundles.len(),
            utils::format_duration(start.elapsed())
        );

        for bundle in &result.bundles {
            eprintln!(
                "  {} {} {}",
                "•".dimmed(),
                bundle.output_path.display().to_string().cyan(),
                utils::format_size(bundle.size).dimmed()
            );
            if let Some(map) = &bundle.sourcemap_path {
                eprintln!(
                    "  {} {}",
                    "•".dimmed(),
                    map.display().to_string().dimmed()
                );
            }
        }

        eprintln!();

        Ok(())
    }
}
