use agentkit::Workspace;
use colored::*;
use eyre::Result;
use serde::Serialize;

use crate::cli::{ConfigAction, OutputFormat};
use crate::config::Config;

pub fn run(action: ConfigAction, config: &Config, workspace: &Workspace) -> Result<()> {
    match action {
        ConfigAction::Show { format } => show(OutputFormat::resolve(format), config, workspace),
        ConfigAction::Get { key } => get(&key, workspace),
    }
}

fn show(format: OutputFormat, config: &Config, workspace: &Workspace) -> Result<()> {
    let settings = workspace.settings();

    #[derive(Serialize)]
    struct ConfigView<'a> {
        cli: &'a Config,
        root: String,
        settings: &'a indexmap::IndexMap<String, serde_yaml::Value>,
    }

    let view = ConfigView {
        cli: config,
        root: workspace.root().display().to_string(),
        settings: &settings.namespaces,
    };

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
        OutputFormat::Yaml => {
            println!("{}", serde_yaml::to_string(&view)?);
        }
        OutputFormat::Text => {
            println!("{}", "agentkit Configuration".bold());
            println!();

            println!("{}:", "cli".cyan());
            println!("  root: {}", workspace.root().display());
            println!("  log_level: {}", config.log_level.as_filter());
            println!();

            println!("{}:", "system".cyan());
            println!("  persona.enabled: {}", settings.system.persona.enabled);
            println!(
                "  persona.name: {}",
                settings.system.persona.name.as_deref().unwrap_or("(none)")
            );
            println!("  debug.mode: {}", settings.system.debug.mode);
            println!("  misc.on_the_fly: {}", settings.system.misc.on_the_fly);
            println!();

            println!("{}:", "storage".cyan());
            println!("  options.enabled: {}", settings.storage.enabled());
            println!();

            println!("{}:", "namespaces".cyan());
            for name in settings.namespaces.keys() {
                println!("  {}", name);
            }
        }
    }

    Ok(())
}

fn get(key: &str, workspace: &Workspace) -> Result<()> {
    let settings = workspace.settings();

    match settings.get(key) {
        Some(serde_yaml::Value::String(s)) => println!("{}", s),
        Some(value) => print!("{}", serde_yaml::to_string(value)?),
        None => eyre::bail!("Unknown settings key: {}", key),
    }

    Ok(())
}
