//! CLI mode
//!
//! One-shot commands that reuse the server's storage setup.

use std::path::Path;

use anyhow::{Context, Result, bail};
use colored::Colorize;

use crate::cli::{Commands, ConfigCommands};
use crate::config::{StaticConfig, get_config};
use crate::runtime::lifetime;

const DEFAULT_SAMPLE_PATH: &str = "config.example.toml";

/// Run a CLI command. `Serve` is handled by the caller.
pub async fn run_cli(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Serve => bail!("serve is not a one-shot command"),
        Commands::Stats { json } => stats(json).await,
        Commands::Sweep => sweep().await,
        Commands::Config {
            action: ConfigCommands::Generate { output_path, force },
        } => config_generate(output_path, force),
    }
}

async fn stats(json: bool) -> Result<()> {
    let config = get_config();
    let startup = lifetime::startup::prepare_startup(&config).await?;

    let stats = startup
        .content_service
        .stats()
        .await
        .context("Failed to count stored content")?;

    if json {
        println!("{}", serde_json::to_string(&stats)?);
    } else {
        println!("{} {}", "Files stored:".bold(), stats.files);
        println!("{} {}", "Short URLs stored:".bold(), stats.urls);
    }
    Ok(())
}

async fn sweep() -> Result<()> {
    let config = get_config();
    let startup = lifetime::startup::prepare_startup(&config).await?;

    let report = startup.sweeper.run_once().await;
    let orphans = startup.sweeper.reclaim_orphans().await;

    println!("{}", "Sweep finished".green());
    println!("  file records deleted: {}", report.files_deleted);
    println!("  blobs removed:        {}", report.blobs_removed);
    if report.blob_failures > 0 {
        println!(
            "  {} {}",
            "blob removal failures:".red(),
            report.blob_failures
        );
    }
    println!("  url records deleted:  {}", report.urls_deleted);
    println!("  orphan blobs removed: {}", orphans);
    Ok(())
}

fn config_generate(output_path: Option<String>, force: bool) -> Result<()> {
    let path = output_path.unwrap_or_else(|| DEFAULT_SAMPLE_PATH.to_string());

    if !force && Path::new(&path).exists() {
        bail!("{} already exists (use --force to overwrite)", path);
    }

    StaticConfig::default()
        .save_to_file(&path)
        .map_err(|e| anyhow::anyhow!("Failed to write {}: {}", path, e))?;

    println!(
        "{} {}",
        "Configuration file generated:".green(),
        path.blue()
    );
    println!(
        "  {}",
        "Every key can be overridden with EPHEMERA__SECTION__KEY environment variables".dimmed()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_generate_refuses_to_overwrite() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("sample.toml");
        let path_str = path.to_string_lossy().to_string();

        config_generate(Some(path_str.clone()), false).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("[storage]"));

        assert!(config_generate(Some(path_str.clone()), false).is_err());
        assert!(config_generate(Some(path_str), true).is_ok());
    }
}
