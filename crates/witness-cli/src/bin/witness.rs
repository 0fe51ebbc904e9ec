//! Witness CLI Binary
//!
//! Generates protocol witnesses for Swift declarations marked with
//! `@Witness` (on protocols) or `@Witnessed` (on concrete types).
//!
//! # Usage
//!
//! ```bash
//! # Expand a file in place of stdout
//! witness expand Sources/Clock.swift
//!
//! # Expand several files into a directory, defaulting to class witnesses
//! witness expand Sources/*.swift --output Generated --target class
//!
//! # Expand a pre-decoded declaration
//! witness expand --json clock.json
//!
//! # Inspect what the front-end decoded
//! witness parse Sources/Clock.swift --pretty
//! ```

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::info;
use witness_cli::{
    cli::WitnessConfig,
    commands::{
        self, completions::CompletionsArgs, expand::ExpandArgs, parse::ParseArgs,
    },
    diagnostics::setup_error_reporting,
    Result,
};

#[derive(Parser)]
#[command(
    name = "witness",
    version = env!("CARGO_PKG_VERSION"),
    about = "Protocol witness generator for Swift",
    long_about = r#"
Generates witness types for Swift protocols and concrete types: a value (or
final class) that stores one closure per requirement and conforms by
forwarding to them.

EXAMPLES:
    witness expand Clock.swift               # Print the expanded source
    witness expand *.swift -o Generated      # Write each expansion to a directory
    witness parse Clock.swift --pretty       # Show the decoded declarations
    "#
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (use multiple times for increased verbosity)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Set log level (overrides --verbose/--quiet)
    #[arg(long, global = true, value_enum)]
    log: Option<LogLevel>,

    /// Set log output format
    #[arg(long, global = true, value_enum, default_value = "pretty")]
    log_format: LogFormat,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Working directory
    #[arg(short = 'C', long, global = true)]
    directory: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogFormat {
    Pretty,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Expand attached declarations and print or write the result
    Expand(ExpandArgs),

    /// Decode a Swift file and dump its declarations as JSON
    Parse(ParseArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up error reporting
    setup_error_reporting()?;

    // Configure logging
    setup_logging(cli.verbose, cli.quiet, cli.log, cli.log_format)?;

    // Change working directory if specified
    if let Some(dir) = &cli.directory {
        std::env::set_current_dir(dir).map_err(witness_cli::CliError::Io)?;
    }

    // Load configuration
    let config = WitnessConfig::load(cli.config.as_deref())?;

    // Execute command
    let result = match cli.command {
        Commands::Expand(args) => commands::expand_command(args, &config).await,
        Commands::Parse(args) => commands::parse_command(args, &config).await,
        Commands::Completions(args) => commands::completions_command(args, Cli::command()).await,
    };

    match result {
        Ok(_) => {
            if cli.verbose > 0 {
                info!("Command completed successfully");
            }
            Ok(())
        }
        Err(e) => {
            use tracing::error;
            if !witness_cli::diagnostics::render_cli_error(&e) {
                error!("{}", e);
            }
            if cli.verbose > 0 {
                error!(?e, "detailed error context");
            }
            std::process::exit(1);
        }
    }
}

fn setup_logging(
    verbose: u8,
    quiet: bool,
    log_level: Option<LogLevel>,
    log_format: LogFormat,
) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if let Some(level) = log_level {
        EnvFilter::new(match level {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        })
    } else if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    // Logs go to stderr; stdout carries generated source.
    let formatter = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_timer(tracing_subscriber::fmt::time::uptime())
        .with_level(true);

    match log_format {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(formatter)
                .with(filter)
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(formatter.json())
                .with(filter)
                .init();
        }
    }

    Ok(())
}
