use agentkit::Workspace;
use clap::Parser;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::path::PathBuf;

mod cli;
mod commands;
mod config;

use cli::{Cli, Commands};
use config::{Config, LogLevel};

fn setup_logging(log_level: &LogLevel) -> Result<()> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("agentkit")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("agentkit.log");

    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    // RUST_LOG env var takes precedence over the config file
    let mut builder = env_logger::Builder::new();

    if std::env::var("RUST_LOG").is_ok() {
        builder.parse_default_env();
    } else {
        builder.filter_level(log_level.to_level_filter());
    }

    builder.target(env_logger::Target::Pipe(target)).init();

    info!("Logging initialized, writing to: {}", log_file.display());
    info!(
        "Log level: {} (from {})",
        log_level.as_filter(),
        if std::env::var("RUST_LOG").is_ok() { "RUST_LOG env" } else { "config" }
    );
    Ok(())
}

fn open_workspace(cli: &Cli, config: &Config) -> Result<Workspace> {
    let root = config.workspace_root(cli.root.as_ref());
    info!("Opening workspace at {}", root.display());
    Workspace::open(&root).with_context(|| format!("Failed to open workspace at {}", root.display()))
}

fn run(cli: Cli, config: Config) -> Result<()> {
    if let Commands::Completions { shell } = cli.command {
        return commands::completions::run(shell);
    }

    let workspace = open_workspace(&cli, &config)?;

    match cli.command {
        Commands::Agent { action } => commands::agent::run(action, &workspace),
        Commands::Model { action } => commands::model::run(action, &workspace),
        Commands::Persona { action } => commands::persona::run(action, &workspace),
        Commands::Config { action } => commands::config::run(action, &config, &workspace),
        Commands::Completions { shell } => commands::completions::run(shell),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration before logging, so log messages in Config::load are silent
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    setup_logging(&config.log_level).context("Failed to setup logging")?;

    info!("Starting agentkit with config from: {:?}", cli.config);

    run(cli, config).context("Command failed")?;

    Ok(())
}
