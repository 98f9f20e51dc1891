pub mod commands;
pub mod render;

use cartsim_core::config::{AppConfig, LogFormat};
use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "cartsim",
    about = "Shopping cart simulator CLI",
    long_about = "Generate random carts from the product catalog, review them, enter shipping \
                  details and ask the quote backend for the cheapest courier.",
    after_help = "Examples:\n  cartsim shop\n  cartsim demo --name Ana --street \"Av. Grecia 10\" \
                  --commune Nunoa --phone \"+56 9 2222 3333\"\n  cartsim doctor --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Start an interactive shopping session on stdin/stdout")]
    Shop {
        #[arg(long, help = "Seed the cart generator for a reproducible session")]
        seed: Option<u64>,
    },
    #[command(about = "Run generate, checkout, shipping and quote once with the given details")]
    Demo {
        #[arg(long)]
        name: String,
        #[arg(long)]
        street: String,
        #[arg(long)]
        commune: String,
        #[arg(long)]
        phone: String,
        #[arg(long, help = "Seed the cart generator for a reproducible run")]
        seed: Option<u64>,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config and check catalog and quote backend reachability")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Shop { seed } => commands::shop::run(seed),
        Command::Demo { name, street, commune, phone, seed } => {
            commands::demo::run(commands::demo::DemoArgs { name, street, commune, phone, seed })
        }
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => commands::doctor::run(json),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

/// Sends log events to stderr so command output on stdout stays parseable.
/// Only the first call in a process installs a subscriber.
pub fn init_logging(config: &AppConfig) {
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    let _ = match config.logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}
