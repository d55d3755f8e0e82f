//! Agents
//!
//! An agent is a named definition plus the run pipeline around it:
//!
//! 1. refresh sources (only with reload-on-change)
//! 2. `additional_data` hook
//! 3. resolve, render and validate ([`config::AgentConfigLoader::get_agent_config`])
//! 4. `process_prompt` hook
//! 5. model call through a [`Generator`], or the simulated response in debug mode
//! 6. parse per the agent's format hint
//! 7. `build_output` hook

use serde::Serialize;

use crate::context::Vars;
use crate::error::{Error, Result};
use crate::resolve::EffectiveModel;
use crate::response::{ParsedResponse, parse_response};
use crate::template::render::RenderedPrompt;
use crate::template::store::AgentDefinition;
use crate::validate::validate;

pub mod config;

use config::{AgentConfig, AgentConfigLoader, RuntimeOverrides};

/// The model-invocation collaborator
pub trait Generator: Send + Sync {
    fn generate(
        &self,
        prompt: &RenderedPrompt,
        model: &EffectiveModel,
    ) -> std::result::Result<String, Box<dyn std::error::Error + Send + Sync>>;
}

/// Returns the rendered user prompt unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoGenerator;

impl Generator for EchoGenerator {
    fn generate(
        &self,
        prompt: &RenderedPrompt,
        _model: &EffectiveModel,
    ) -> std::result::Result<String, Box<dyn std::error::Error + Send + Sync>> {
        Ok(prompt.user.clone())
    }
}

/// Per-agent customization points. Every method has a pass-through default.
pub trait AgentHooks: Send + Sync {
    /// Extra render variables, between persona and runtime arguments
    fn additional_data(&self, _definition: &AgentDefinition, _args: &Vars) -> Result<Vars> {
        Ok(Vars::new())
    }

    /// Adjust the rendered prompt before the model call; the result is re-validated
    fn process_prompt(&self, prompt: RenderedPrompt, _config: &AgentConfig) -> Result<RenderedPrompt> {
        Ok(prompt)
    }

    fn build_output(&self, output: AgentOutput) -> Result<AgentOutput> {
        Ok(output)
    }
}

/// Hooks that change nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultHooks;

impl AgentHooks for DefaultHooks {}

/// Result of one run
#[derive(Debug, Clone, Serialize)]
pub struct AgentOutput {
    pub agent: String,
    pub model: String,
    pub prompt: RenderedPrompt,
    pub raw: String,
    pub parsed: ParsedResponse,
    pub simulated: bool,
}

pub struct Agent {
    loader: AgentConfigLoader,
    generator: Box<dyn Generator>,
    hooks: Box<dyn AgentHooks>,
}

impl Agent {
    pub fn new(loader: AgentConfigLoader, generator: Box<dyn Generator>, hooks: Box<dyn AgentHooks>) -> Self {
        Self {
            loader,
            generator,
            hooks,
        }
    }

    pub fn name(&self) -> &str {
        self.loader.name()
    }

    pub fn loader(&self) -> &AgentConfigLoader {
        &self.loader
    }

    /// Steps 1-4 of the pipeline, without calling the model
    pub fn prepare(&mut self, overrides: &RuntimeOverrides) -> Result<AgentConfig> {
        self.loader.refresh()?;
        let additional = self.hooks.additional_data(self.loader.definition(), &overrides.args)?;
        let mut config = self.loader.get_agent_config(overrides, &additional)?;

        let prompt = self.hooks.process_prompt(config.prompt.clone(), &config)?;
        validate(&prompt)?;
        config.prompt = prompt;
        Ok(config)
    }

    pub fn run(&mut self, overrides: &RuntimeOverrides) -> Result<AgentOutput> {
        let config = self.prepare(overrides)?;

        let raw = if config.debug {
            log::info!("Agent '{}' in debug mode, using simulated response", config.agent);
            config.simulated_response.clone()
        } else {
            log::info!("Agent '{}' calling {}", config.agent, config.model.identifier);
            self.generator
                .generate(&config.prompt, &config.model)
                .map_err(|source| Error::Generation { source })?
        };

        let parsed = parse_response(&raw, config.parse_response_as)?;
        self.hooks.build_output(AgentOutput {
            agent: config.agent,
            model: config.model.identifier,
            prompt: config.prompt,
            raw,
            parsed,
            simulated: config.debug,
        })
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent").field("name", &self.name()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::SettingsStore;
    use crate::template::store::PromptTemplateStore;
    use serde_yaml::Value;
    use std::fs;
    use std::path::Path;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn setup(system: &str, agent_yaml: &str) -> TempDir {
        let temp = TempDir::new().unwrap();
        write(&temp.path().join("settings/system.yaml"), system);
        write(
            &temp.path().join("settings/models.yaml"),
            "default_model:\n  api: fake\n  model: m\nlibrary:\n  fake:\n    classes:\n      c:\n        models:\n          m:\n            identifier: fake-1\n",
        );
        write(&temp.path().join("prompts/agent.yaml"), agent_yaml);
        temp
    }

    fn build(temp: &TempDir, generator: Box<dyn Generator>, hooks: Box<dyn AgentHooks>) -> Agent {
        let root = temp.path();
        let settings = Arc::new(SettingsStore::open(root.join("settings")).unwrap());
        let loader = AgentConfigLoader::new(
            "agent",
            settings,
            PromptTemplateStore::new(root.join("prompts")),
            root.join("personas"),
        )
        .unwrap();
        Agent::new(loader, generator, hooks)
    }

    fn args(pairs: &[(&str, &str)]) -> RuntimeOverrides {
        RuntimeOverrides::with_args(pairs.iter().map(|(k, v)| (k.to_string(), Value::from(*v))).collect())
    }

    struct CountingGenerator {
        calls: Arc<AtomicUsize>,
        reply: String,
    }

    impl Generator for CountingGenerator {
        fn generate(
            &self,
            _prompt: &RenderedPrompt,
            _model: &EffectiveModel,
        ) -> std::result::Result<String, Box<dyn std::error::Error + Send + Sync>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.reply.clone())
        }
    }

    struct TopicHooks;

    impl AgentHooks for TopicHooks {
        fn additional_data(&self, _definition: &AgentDefinition, _args: &Vars) -> Result<Vars> {
            Ok([("topic".to_string(), Value::from("rust"))].into_iter().collect())
        }

        fn build_output(&self, mut output: AgentOutput) -> Result<AgentOutput> {
            output.raw = output.raw.to_uppercase();
            Ok(output)
        }
    }

    #[test]
    fn test_run_with_echo_generator() {
        let temp = setup("{}", "prompts:\n  system: sys\n  user: \"Echo: {text}\"\n");
        let mut agent = build(&temp, Box::new(EchoGenerator), Box::new(DefaultHooks));
        let output = agent.run(&args(&[("text", "hi")])).unwrap();
        assert_eq!(output.raw, "Echo: hi");
        assert_eq!(output.model, "fake-1");
        assert!(!output.simulated);
    }

    #[test]
    fn test_debug_mode_skips_generator() {
        let temp = setup(
            "debug:\n  mode: true\n  simulated_response: \"{\\\"ok\\\": true}\"\n",
            "prompts:\n  system: sys\n  user: u\nparse_response_as: json\n",
        );
        let calls = Arc::new(AtomicUsize::new(0));
        let generator = CountingGenerator {
            calls: Arc::clone(&calls),
            reply: "ignored".to_string(),
        };
        let mut agent = build(&temp, Box::new(generator), Box::new(DefaultHooks));

        let output = agent.run(&RuntimeOverrides::default()).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(output.simulated);
        assert_eq!(output.parsed, ParsedResponse::Structured(serde_json::json!({"ok": true})));
    }

    #[test]
    fn test_invalid_prompt_never_reaches_generator() {
        let temp = setup("{}", "prompts:\n  system: sys\n  user:\n    s: \"{needed}\"\n");
        let calls = Arc::new(AtomicUsize::new(0));
        let generator = CountingGenerator {
            calls: Arc::clone(&calls),
            reply: "x".to_string(),
        };
        let mut agent = build(&temp, Box::new(generator), Box::new(DefaultHooks));

        assert!(matches!(agent.run(&RuntimeOverrides::default()), Err(Error::Validation { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_hooks_feed_context_and_output() {
        let temp = setup("{}", "prompts:\n  system: sys\n  user: \"About {topic}\"\n");
        let mut agent = build(&temp, Box::new(EchoGenerator), Box::new(TopicHooks));
        assert_eq!(agent.run(&RuntimeOverrides::default()).unwrap().raw, "ABOUT RUST");
        // runtime args still beat hook data
        assert_eq!(agent.run(&args(&[("topic", "go")])).unwrap().raw, "ABOUT GO");
    }

    #[test]
    fn test_generator_failure_is_generation_error() {
        struct Failing;
        impl Generator for Failing {
            fn generate(
                &self,
                _prompt: &RenderedPrompt,
                _model: &EffectiveModel,
            ) -> std::result::Result<String, Box<dyn std::error::Error + Send + Sync>> {
                Err("connection refused".into())
            }
        }

        let temp = setup("{}", "prompts:\n  system: sys\n  user: u\n");
        let mut agent = build(&temp, Box::new(Failing), Box::new(DefaultHooks));
        let err = agent.run(&RuntimeOverrides::default()).unwrap_err();
        assert!(err.to_string().contains("connection refused"));
    }
}
