// crates/notify-cli/src/main.rs
// ============================================================================
// Module: Notify CLI Entry Point
// Description: Command dispatcher for the notification server.
// Purpose: Serve push traffic and inspect configuration from one binary.
// Dependencies: clap, notify-cli, notify-config, thiserror, tokio
// ============================================================================

//! ## Overview
//! `notify serve` runs the server until Ctrl-C or SIGTERM. `notify config
//! validate` loads and validates a config file; `notify config show` prints
//! the effective configuration as YAML.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use notify_cli::logging::init_tracing;
use notify_cli::serve;
use notify_config::NotifyConfig;
use notify_server::shutdown_signal;
use thiserror::Error;
use tracing::error;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "notify", version, about = "Push notification server")]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the notification server.
    Serve(ConfigArg),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Load and validate a config file.
    Validate(ConfigArg),
    /// Print the effective configuration as YAML.
    Show(ConfigArg),
}

/// Shared `--config` argument.
#[derive(Args, Debug)]
struct ConfigArg {
    /// Config file path (defaults to `NOTIFY_CONFIG` or notify.toml).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Serve(arg) => command_serve(arg).await,
        Commands::Config {
            command: ConfigCommand::Validate(arg),
        } => command_config_validate(&arg),
        Commands::Config {
            command: ConfigCommand::Show(arg),
        } => command_config_show(&arg),
    }
}

// ============================================================================
// SECTION: Commands
// ============================================================================

async fn command_serve(arg: ConfigArg) -> CliResult<ExitCode> {
    let config = load_config(&arg)?;
    init_tracing(&config.log).map_err(CliError::new)?;
    if let Err(err) = serve::run(config, shutdown_signal()).await {
        error!(error = %err, "notification server failed");
        return Err(CliError::new(format!("serve failed: {err}")));
    }
    Ok(ExitCode::SUCCESS)
}

fn command_config_validate(arg: &ConfigArg) -> CliResult<ExitCode> {
    load_config(arg)?;
    write_stdout_line("config ok").map_err(|err| CliError::new(output_error(&err)))?;
    Ok(ExitCode::SUCCESS)
}

fn command_config_show(arg: &ConfigArg) -> CliResult<ExitCode> {
    let config = load_config(arg)?;
    let yaml = config.to_yaml().map_err(|err| CliError::new(err.to_string()))?;
    let mut stdout = std::io::stdout();
    stdout.write_all(yaml.as_bytes()).map_err(|err| CliError::new(output_error(&err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn load_config(arg: &ConfigArg) -> CliResult<NotifyConfig> {
    NotifyConfig::load(arg.config.as_deref())
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))
}

fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

fn output_error(error: &std::io::Error) -> String {
    format!("failed to write output: {error}")
}

fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
