//! # oficio CLI entry point
//!
//! Parses command-line arguments, installs logging, loads the engine
//! configuration, and dispatches to the subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use oficio_cli::check_config::{run_check_config, CheckConfigArgs};
use oficio_cli::deadline::{run_deadline, DeadlineArgs};
use oficio_cli::decide::{run_decide, DecideArgs};
use oficio_cli::status::{run_status, StatusArgs};
use oficio_cli::{load_config, resolve_config};

/// Compliance decision engine for regulatory oficios.
///
/// Reconciles extracted fields across document renditions, classifies the
/// request, and tracks its legal deadline.
#[derive(Parser, Debug)]
#[command(name = "oficio", version, about, long_about = None)]
struct Cli {
    /// Path to the engine configuration.
    #[arg(long, env = "OFICIO_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Decide one case or a batch of cases from a JSON file.
    Decide(DecideArgs),

    /// Compute the deadline for an intake date and term.
    Deadline(DeadlineArgs),

    /// Evaluate the SLA status of a file at an instant.
    Status(StatusArgs),

    /// Load and validate the configuration.
    CheckConfig(CheckConfigArgs),
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let source = resolve_config(cli.config.as_deref());
    let config = match load_config(&source) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{e:#}");
            return ExitCode::from(1);
        }
    };

    let result = match cli.command {
        Commands::Decide(args) => run_decide(&args, config),
        Commands::Deadline(args) => run_deadline(&args, &config),
        Commands::Status(args) => run_status(&args, &config),
        Commands::CheckConfig(args) => run_check_config(&args, &config, &source),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
