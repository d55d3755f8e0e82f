use agentkit::Workspace;
use agentkit::context::value_text;
use colored::*;
use eyre::Result;

use crate::cli::{OutputFormat, PersonaAction};

pub fn run(action: PersonaAction, workspace: &Workspace) -> Result<()> {
    match action {
        PersonaAction::List => list(workspace),
        PersonaAction::Show { name, format } => show(&name, OutputFormat::resolve(format), workspace),
    }
}

fn list(workspace: &Workspace) -> Result<()> {
    let store = workspace.personas();
    let names = store.names()?;

    println!("{}", "Personas:".bold());
    if !store.enabled() {
        println!("  {} personas are disabled in settings/system.yaml", "!".yellow());
    }
    for name in names {
        println!("  {} {}", "●".green(), name);
    }
    Ok(())
}

fn show(name: &str, format: OutputFormat, workspace: &Workspace) -> Result<()> {
    let store = workspace.personas();
    let Some(persona) = store.load(name)? else {
        if store.enabled() {
            eyre::bail!("Persona '{}' not found in {}", name, store.dir().display());
        }
        eyre::bail!("Persona '{}' unavailable: personas are disabled in settings/system.yaml", name);
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&persona.fields)?),
        OutputFormat::Yaml => println!("{}", serde_yaml::to_string(&persona.fields)?),
        OutputFormat::Text => {
            println!("{} {}", "Persona:".bold(), persona.name.green().bold());
            println!();
            for (key, value) in &persona.fields {
                println!("  {}: {}", key.cyan(), value_text(value));
            }
        }
    }

    Ok(())
}
