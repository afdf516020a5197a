//! tilesource CLI - drive a geometry source from the command line
//!
//! `simulate` runs a synthetic provider against a recording renderer and
//! prints the resulting counters. `bounds` converts between tiles and
//! geographic bounds.

mod commands;
mod error;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tilesource::logging::{init_logging, LoggingConfig};

use crate::error::CliError;

#[derive(Parser)]
#[command(name = "tilesource")]
#[command(version, about = "Background geometry fetching for map tiles", long_about = None)]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Also write logs to tilesource.log in this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a synthetic fetch workload and print source metrics
    Simulate(commands::simulate::SimulateArgs),
    /// Print the geographic bounds of a tile
    Bounds(commands::bounds::BoundsArgs),
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        e.exit();
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let mut logging = LoggingConfig::default();
    if cli.verbose {
        logging = logging.with_default_filter("debug");
    }
    if let Some(dir) = cli.log_dir {
        logging = logging.with_directory(dir);
    }
    let _guard = init_logging(&logging).map_err(CliError::LoggingInit)?;

    match cli.command {
        Commands::Simulate(args) => commands::simulate::run(args),
        Commands::Bounds(args) => commands::bounds::run(args),
    }
}
