pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use booksum_core::config::{AppConfig, LoadOptions, LogFormat};
use clap::{Parser, Subcommand};
use tracing::Level;

#[derive(Debug, Parser)]
#[command(
    name = "booksum",
    about = "Booking totals operator CLI",
    long_about = "Ask booking questions in plain language, inspect configuration, and evaluate query parsers.",
    after_help = "Examples:\n  booksum ask \"Show me bookings in November 2024 in USD\"\n  booksum doctor --json\n  booksum eval --dataset cases.json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Answer a booking query end to end and print the JSON result")]
    Ask {
        #[arg(help = "Free-text query, e.g. \"bookings in March 2023 in GBP\"")]
        query: String,
    },
    #[command(about = "Inspect effective configuration values with source attribution and redaction")]
    Config,
    #[command(about = "Validate configuration and report interpreter mode and FX availability")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Score the configured query parser against a labelled dataset")]
    Eval {
        #[arg(long, help = "JSON file with [{query, expected}] cases; defaults to the built-in set")]
        dataset: Option<PathBuf>,
    },
}

/// Diagnostics go to stderr so stdout stays a single JSON document.
fn init_logging() {
    let (level, format) = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            (config.logging.level.parse::<Level>().unwrap_or(Level::WARN), config.logging.format)
        }
        Err(_) => (Level::WARN, LogFormat::Compact),
    };

    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(level)
        .with_writer(std::io::stderr);
    let _ = match format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    let result = match cli.command {
        Command::Ask { query } => commands::ask::run(&query),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
        Command::Eval { dataset } => commands::eval::run(dataset.as_deref()),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
