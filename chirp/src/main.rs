//! chirp - sound notifications for editor hook events.
//!
//! This binary installs and removes chirp's hook entries in the editor's
//! `settings.json`, and reports whether they are present.

#![forbid(unsafe_code)]

mod commands;

use chirp_common::{ChirpConfig, LoggingGuards, init_logging};
use clap::{Args, Parser, Subcommand};
use std::process::ExitCode;
use std::time::Duration;
use tracing::warn;

#[derive(Parser)]
#[command(name = "chirp")]
#[command(author, version, about = "Chirp - sound hooks for your editor")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// How long to wait for the settings lock (e.g. "500ms", "10s")
    #[arg(long, global = true, value_parser = humantime::parse_duration)]
    lock_timeout: Option<Duration>,

    /// Command to register in hooks instead of this binary's path
    #[arg(long, global = true)]
    exec_path: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Register chirp's hooks in the editor settings
    Install(WorkflowArgs),

    /// Remove chirp's hooks from the editor settings
    Uninstall(WorkflowArgs),

    /// Show whether chirp's hooks are installed
    Status(ScopeArgs),
}

#[derive(Args)]
struct ScopeArgs {
    /// Which settings file to use: "user" or "project"
    #[arg(long, default_value = "user")]
    scope: String,
}

#[derive(Args)]
struct WorkflowArgs {
    #[command(flatten)]
    target: ScopeArgs,

    /// Report what would change without writing anything
    #[arg(long)]
    dry_run: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let (config, env_errors) = ChirpConfig::from_env();
    let _logging_guards = match setup_logging(&config, cli.verbose) {
        Ok(guards) => guards,
        Err(e) => {
            eprintln!("error: failed to initialize logging: {e:#}");
            return ExitCode::FAILURE;
        }
    };
    for error in &env_errors {
        warn!(%error, "ignoring invalid environment value");
    }

    let config = config.with_overrides(cli.lock_timeout, cli.exec_path.clone());
    let result = match &cli.command {
        Commands::Install(args) => {
            commands::install(&args.target.scope, args.dry_run, &config, cli.json)
        }
        Commands::Uninstall(args) => {
            commands::uninstall(&args.target.scope, args.dry_run, &config, cli.json)
        }
        Commands::Status(args) => commands::status(&args.scope, &config, cli.json),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            commands::report_error(&err, cli.json);
            ExitCode::FAILURE
        }
    }
}

fn setup_logging(config: &ChirpConfig, verbose: bool) -> anyhow::Result<LoggingGuards> {
    let mut log_config = config.log_config().with_stderr();
    if verbose {
        log_config = log_config.with_level("debug");
    }
    init_logging(&log_config)
}
