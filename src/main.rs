//! Weft - a minimal build tool for single-file components
//!
//! Compiles Svelte-style component sources into a browser-loadable
//! bundle: script-block preprocessing, a CSS pipeline with extraction
//! and minification in production, source maps in development, and a
//! render harness for smoke-testing components.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod bundler;
mod cli;
mod config;
mod dom;
mod harness;
mod plugins;
mod resolver;
mod transform;
mod utils;

pub use bundler::Bundler;
pub use cli::Cli;
pub use config::{Mode, ProjectConfig, ResolvedConfig};

/// Initialize the logging/tracing system
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("weft=debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("weft=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    cli.execute().await
}
