use crate::config::{self, ConfigSource, DEFAULT_CONFIG_NAME};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::{Path, PathBuf};

#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Config file (defaults to tradebook.config.json in the current directory)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// Print the effective configuration
pub fn config(args: ConfigArgs, cwd: &Path) -> Result<()> {
    let (config, source) = config::load(cwd, args.config.as_deref())?;

    match source {
        ConfigSource::File(path) => {
            eprintln!("{} {}", "Loaded".green().bold(), path.display());
        }
        ConfigSource::Defaults => {
            eprintln!(
                "{} no {} found, using defaults",
                "⚠️".yellow(),
                DEFAULT_CONFIG_NAME.bright_white()
            );
        }
    }

    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
