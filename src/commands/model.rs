//! Model library commands

use agentkit::Workspace;
use agentkit::resolve::{ModelOverride, OverrideResolver};
use colored::*;
use eyre::{Context, Result};
use serde::Serialize;

use crate::cli::{ModelAction, OutputFormat};

pub fn run(action: ModelAction, workspace: &Workspace) -> Result<()> {
    match action {
        ModelAction::List { format } => list_models(OutputFormat::resolve(format), workspace),
        ModelAction::Resolve { name, format } => resolve_model(&name, OutputFormat::resolve(format), workspace),
    }
}

fn list_models(format: OutputFormat, workspace: &Workspace) -> Result<()> {
    let settings = workspace.settings();

    #[derive(Serialize)]
    struct ModelSummary<'a> {
        api: &'a str,
        model: &'a str,
        identifier: &'a str,
    }

    let models: Vec<ModelSummary> = settings
        .models
        .models()
        .into_iter()
        .map(|(api, model, identifier)| ModelSummary { api, model, identifier })
        .collect();

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&models)?),
        OutputFormat::Yaml => println!("{}", serde_yaml::to_string(&models)?),
        OutputFormat::Text => {
            println!("{}", "Model Library:".bold());
            println!();
            if models.is_empty() {
                println!("  {} No models in settings/models.yaml", "(none)".dimmed());
            }
            let default = &settings.models.default_model;
            for m in &models {
                let is_default = default.api.as_deref() == Some(m.api) && default.model.as_deref() == Some(m.model);
                let marker = if is_default { "★".yellow() } else { "●".green() };
                println!("  {} {}/{} {}", marker, m.api, m.model.bold(), m.identifier.dimmed());
            }
        }
    }

    Ok(())
}

fn resolve_model(name: &str, format: OutputFormat, workspace: &Workspace) -> Result<()> {
    let loader = workspace
        .loader(name)
        .with_context(|| format!("Failed to load agent '{}'", name))?;
    let library = &loader.snapshot().models;
    let layers: Vec<&ModelOverride> = loader.definition().model_overrides.iter().collect();
    let effective = OverrideResolver::new(library)
        .resolve(&library.default_model, &layers)
        .with_context(|| format!("Failed to resolve model for '{}'", name))?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&effective)?),
        OutputFormat::Yaml => println!("{}", serde_yaml::to_string(&effective)?),
        OutputFormat::Text => {
            println!("{} {}", "Agent:".bold(), name.green().bold());
            println!("{} {}/{} ({})", "Model:".bold(), effective.api, effective.model, effective.identifier.cyan());
            println!("{} {}", "Class:".bold(), effective.class);
            if !effective.params.is_empty() {
                println!("{}", "Params:".bold());
                for (key, value) in &effective.params {
                    println!("  {}: {}", key, agentkit::context::value_text(value));
                }
            }
        }
    }

    Ok(())
}
