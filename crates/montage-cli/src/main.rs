//! Montage CLI - Command-line interface for montage effect graphs.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "montage")]
#[command(author, version, about = "Montage effect graph CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the effect types graphs can instantiate
    Types(commands::types::TypesArgs),

    /// Validate a patch file and print its graph
    Inspect(commands::inspect::InspectArgs),

    /// Build a patch and render it frame by frame
    Render(commands::render::RenderArgs),

    /// Write the demo patch to a file
    New(commands::new::NewArgs),
}

fn main() -> anyhow::Result<()> {
    // Diagnostics go to stderr; stdout carries command output.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Types(args) => commands::types::run(args),
        Commands::Inspect(args) => commands::inspect::run(args),
        Commands::Render(args) => commands::render::run(args),
        Commands::New(args) => commands::new::run(args),
    }
}
