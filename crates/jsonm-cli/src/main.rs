//! # jsonm CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use jsonm_cli::check::{run_check, CheckArgs};
use jsonm_cli::generate::{run_generate, GenerateArgs};
use jsonm_cli::list::{run_list, ListArgs};
use jsonm_cli::resolve::{run_resolve, ResolveArgs};

/// Check JSON payloads against a directory of JSON Schema documents.
#[derive(Parser, Debug)]
#[command(name = "jsonm", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Directory holding schema documents. Overrides the config file and
    /// JSONM_SCHEMA_ROOT.
    #[arg(long, global = true)]
    schema_root: Option<PathBuf>,

    /// Path to a YAML or JSON configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check a payload against a named schema.
    Check(CheckArgs),

    /// List every schema document under the schema root.
    List(ListArgs),

    /// Resolve a $ref string to the schema node it names.
    Resolve(ResolveArgs),

    /// Generate a schema from an example payload.
    Generate(GenerateArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = match jsonm_cli::resolve_config(cli.config.as_deref(), cli.schema_root.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{e:#}");
            return ExitCode::from(2);
        }
    };
    tracing::debug!(schema_root = %config.schema_root.display(), "resolved configuration");

    let result = match cli.command {
        Commands::Check(args) => run_check(&args, &config),
        Commands::List(args) => run_list(&args, &config),
        Commands::Resolve(args) => run_resolve(&args, &config),
        Commands::Generate(args) => run_generate(&args, &config),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(2)
        }
    }
}
