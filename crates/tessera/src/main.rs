//! # tessera
//!
//! Command-line front end of the tessera template compiler.
//!
//! Logging goes to stderr and is filtered by the `TESSERA_LOG` environment
//! variable (`TESSERA_LOG=debug tessera compile ...`).

mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tessera")]
#[command(about = "Template compiler for interactive and server rendering", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile template files into render functions
    Compile(commands::compile::CompileArgs),
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("TESSERA_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Compile(args) => commands::compile::run(args),
    }
}
