mod commands;
mod config;
mod replay;
mod script;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{ConfigArgs, ReplayArgs};

/// Tradebook - replay block editor sessions from the command line
#[derive(Parser, Debug)]
#[command(name = "tradebook")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a script of editor events and print the resulting document
    Replay(ReplayArgs),

    /// Print the effective editor configuration
    Config(ConfigArgs),
}

#[tokio::main]
async fn main() {
    // Logs go to stderr; stdout carries the document
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match std::env::current_dir() {
        Ok(cwd) => match cli.command {
            Command::Replay(args) => commands::replay(args, &cwd).await,
            Command::Config(args) => commands::config(args, &cwd),
        },
        Err(err) => Err(anyhow::anyhow!("Cannot get current directory: {}", err)),
    };

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
