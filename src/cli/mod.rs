//! Command-line interface for Weft
//!
//! Provides the main CLI structure using clap with subcommands for:
//! - `build`: Bundle the project for the selected mode
//! - `init`: Project scaffolding

mod build;
mod init;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;

pub use build::BuildCommand;
pub use init::{scaffold, InitCommand};

/// Weft - a minimal build tool for single-file components
#[derive(Parser, Debug)]
#[command(name = "weft")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to weft.toml config file
    #[arg(short, long, global = true, default_value = "weft.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Bundle the project
    Build(BuildCommand),

    /// Initialize a new project
    Init(InitCommand),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<()> {
        print_banner();

        match &self.command {
            Commands::Build(cmd) => cmd.execute(&self.config).await,
            Commands::Init(cmd) => cmd.execute().await,
        }
    }
}

/// Print the Weft banner
fn print_banner() {
    eprintln!(
        "\n{} {} {}\n",
        "🧵".cyan(),
        "Weft".bold().cyan(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
}
