//! Agent commands

use agentkit::response::ParsedResponse;
use agentkit::{DefaultHooks, EchoGenerator, RuntimeOverrides, Vars, Workspace};
use colored::*;
use eyre::{Context, Result};
use serde::Serialize;
use serde_yaml::Value;

use crate::cli::{AgentAction, OutputFormat};

pub fn run(action: AgentAction, workspace: &Workspace) -> Result<()> {
    match action {
        AgentAction::List { format } => list_agents(OutputFormat::resolve(format), workspace),
        AgentAction::Render { name, vars, format } => {
            render_agent(&name, &vars, OutputFormat::resolve(format), workspace)
        }
        AgentAction::Run { name, vars, format } => run_agent(&name, &vars, OutputFormat::resolve(format), workspace),
    }
}

/// Parse repeated `KEY=VALUE` arguments. Values are kept as strings.
pub fn parse_vars(pairs: &[String]) -> Result<Vars> {
    let mut vars = Vars::new();
    for pair in pairs {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| eyre::eyre!("Invalid --var '{}': expected KEY=VALUE", pair))?;
        if key.is_empty() {
            eyre::bail!("Invalid --var '{}': empty key", pair);
        }
        vars.insert(key.to_string(), Value::String(value.to_string()));
    }
    Ok(vars)
}

fn list_agents(format: OutputFormat, workspace: &Workspace) -> Result<()> {
    let names = workspace.agent_names().context("Failed to scan prompts directory")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&names)?),
        OutputFormat::Yaml => println!("{}", serde_yaml::to_string(&names)?),
        OutputFormat::Text => {
            println!("{}", "Available Agents:".bold());
            println!();

            if names.is_empty() {
                println!(
                    "  {} No agents found in {}",
                    "(none)".dimmed(),
                    workspace.templates().dir().display()
                );
            } else {
                for name in &names {
                    println!("  {} {}", "●".green(), name.bold());
                }
            }
        }
    }

    Ok(())
}

fn render_agent(name: &str, vars: &[String], format: OutputFormat, workspace: &Workspace) -> Result<()> {
    let overrides = RuntimeOverrides::with_args(parse_vars(vars)?);
    let config = workspace
        .get_agent_config(name, &overrides)
        .with_context(|| format!("Failed to prepare agent '{}'", name))?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&config)?),
        OutputFormat::Yaml => println!("{}", serde_yaml::to_string(&config)?),
        OutputFormat::Text => {
            println!(
                "{} {} {}",
                "Agent:".bold(),
                config.agent.green().bold(),
                format!("({})", config.model.identifier).dimmed()
            );
            println!();
            println!("{}", "[system]".cyan());
            println!("{}", config.prompt.system);
            println!();
            println!("{}", "[user]".cyan());
            println!("{}", config.prompt.user);
        }
    }

    Ok(())
}

fn run_agent(name: &str, vars: &[String], format: OutputFormat, workspace: &Workspace) -> Result<()> {
    let overrides = RuntimeOverrides::with_args(parse_vars(vars)?);
    let mut agent = workspace
        .agent(name, Box::new(EchoGenerator), Box::new(DefaultHooks))
        .with_context(|| format!("Failed to load agent '{}'", name))?;
    let output = agent
        .run(&overrides)
        .with_context(|| format!("Agent '{}' failed", name))?;

    #[derive(Serialize)]
    struct RunSummary<'a> {
        agent: &'a str,
        model: &'a str,
        simulated: bool,
        response: &'a ParsedResponse,
    }

    let summary = RunSummary {
        agent: &output.agent,
        model: &output.model,
        simulated: output.simulated,
        response: &output.parsed,
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        OutputFormat::Yaml => println!("{}", serde_yaml::to_string(&summary)?),
        OutputFormat::Text => {
            let mode = if output.simulated { "simulated" } else { "echo" };
            println!("{} {} {}", "Agent:".bold(), output.agent.green().bold(), format!("({})", mode).dimmed());
            println!();
            match &output.parsed {
                ParsedResponse::Text(text) => println!("{}", text),
                ParsedResponse::Structured(value) => println!("{}", serde_json::to_string_pretty(value)?),
            }
        }
    }

    Ok(())
}
