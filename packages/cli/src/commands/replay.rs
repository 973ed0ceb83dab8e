use crate::config;
use crate::replay::Replayer;
use crate::script::ReplayScript;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::{Path, PathBuf};

#[derive(Debug, Args)]
pub struct ReplayArgs {
    /// Replay script (JSON)
    pub script: PathBuf,

    /// Config file (defaults to tradebook.config.json in the current directory)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Print the document on a single line
    #[arg(long)]
    pub compact: bool,

    /// Print the full session report instead of the document alone
    #[arg(long)]
    pub report: bool,
}

pub async fn replay(args: ReplayArgs, cwd: &Path) -> Result<()> {
    let (config, _) = config::load(cwd, args.config.as_deref())?;

    let script_path = cwd.join(&args.script);
    let content = tokio::fs::read_to_string(&script_path)
        .await
        .with_context(|| format!("Cannot read script {}", script_path.display()))?;
    let script = ReplayScript::parse(&content)
        .with_context(|| format!("Invalid script {}", script_path.display()))?;

    // Pasted image paths are relative to the script
    let base_dir = script_path.parent().unwrap_or(cwd).to_path_buf();

    eprintln!(
        "{} {} ({} events)",
        "▶ Replaying".bright_blue().bold(),
        args.script.display(),
        script.events.len()
    );

    let mut replayer = Replayer::new(config, &script, base_dir);
    replayer.run(&script.events).await?;

    let output = if args.report {
        render(&replayer.report(), args.compact)?
    } else {
        render(replayer.session().document(), args.compact)?
    };
    println!("{}", output);

    eprintln!(
        "{} {} of {} events changed the editor",
        "✓".green(),
        replayer.changes(),
        script.events.len()
    );
    Ok(())
}

fn render<T: serde::Serialize>(value: &T, compact: bool) -> Result<String> {
    let json = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    Ok(json)
}
