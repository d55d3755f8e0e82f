//! Workspace layout
//!
//! ```text
//! <root>/
//!   settings/   system.yaml, models.yaml, storage.yaml
//!   personas/   <persona>.yaml
//!   prompts/    **/<agent>.yaml
//! ```

use indexmap::IndexMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::agent::config::{AgentConfig, AgentConfigLoader, RuntimeOverrides};
use crate::agent::{Agent, AgentHooks, Generator};
use crate::context::Vars;
use crate::error::Result;
use crate::persona::PersonaStore;
use crate::settings::{SettingsSnapshot, SettingsStore};
use crate::template::store::PromptTemplateStore;

pub const SETTINGS_DIR: &str = "settings";
pub const PERSONAS_DIR: &str = "personas";
pub const PROMPTS_DIR: &str = "prompts";

type SharedLoader = Arc<Mutex<AgentConfigLoader>>;

/// An opened workspace, shared by every agent built from it
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
    settings: Arc<SettingsStore>,
    templates: PromptTemplateStore,
    /// One loader per agent, created on first use by `get_agent_config`
    loaders: Arc<Mutex<IndexMap<String, SharedLoader>>>,
}

impl Workspace {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let settings = Arc::new(SettingsStore::open(root.join(SETTINGS_DIR))?);
        let templates = PromptTemplateStore::new(root.join(PROMPTS_DIR));
        Ok(Self {
            root,
            settings,
            templates,
            loaders: Arc::new(Mutex::new(IndexMap::new())),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn settings(&self) -> Arc<SettingsSnapshot> {
        self.settings.snapshot()
    }

    pub fn reload(&self) -> Result<Arc<SettingsSnapshot>> {
        self.settings.reload()
    }

    pub fn templates(&self) -> &PromptTemplateStore {
        &self.templates
    }

    pub fn personas(&self) -> PersonaStore {
        PersonaStore::new(self.root.join(PERSONAS_DIR), self.settings().system.persona.enabled)
    }

    pub fn agent_names(&self) -> Result<Vec<String>> {
        self.templates.names()
    }

    /// A new loader with its own copy of the agent's sources
    pub fn loader(&self, agent_name: &str) -> Result<AgentConfigLoader> {
        AgentConfigLoader::new(
            agent_name,
            Arc::clone(&self.settings),
            self.templates.clone(),
            self.root.join(PERSONAS_DIR),
        )
    }

    /// Resolve, render and validate one agent with no hook data.
    ///
    /// The agent's sources are loaded on the first call and kept. Later
    /// calls re-read them only when `misc.on_the_fly` is set.
    pub fn get_agent_config(&self, agent_name: &str, overrides: &RuntimeOverrides) -> Result<AgentConfig> {
        let (loader, cached) = self.shared_loader(agent_name)?;
        let mut loader = loader.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if cached && loader.refresh()? {
            log::debug!("Refreshed sources for agent '{}'", agent_name);
        }
        loader.get_agent_config(overrides, &Vars::new())
    }

    fn shared_loader(&self, agent_name: &str) -> Result<(SharedLoader, bool)> {
        let mut loaders = self.loaders.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(loader) = loaders.get(agent_name) {
            return Ok((Arc::clone(loader), true));
        }
        let loader = Arc::new(Mutex::new(self.loader(agent_name)?));
        loaders.insert(agent_name.to_string(), Arc::clone(&loader));
        Ok((loader, false))
    }

    pub fn agent(&self, agent_name: &str, generator: Box<dyn Generator>, hooks: Box<dyn AgentHooks>) -> Result<Agent> {
        Ok(Agent::new(self.loader(agent_name)?, generator, hooks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{DefaultHooks, EchoGenerator};
    use serde_yaml::Value;
    use std::fs;
    use tempfile::TempDir;

    fn setup() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        for dir in [SETTINGS_DIR, PERSONAS_DIR, PROMPTS_DIR] {
            fs::create_dir_all(root.join(dir)).unwrap();
        }
        fs::write(
            root.join("settings/models.yaml"),
            "default_model:\n  api: a\n  model: m\nlibrary:\n  a:\n    classes:\n      c:\n        models:\n          m:\n            identifier: id-m\n",
        )
        .unwrap();
        fs::write(root.join("prompts/echo.yaml"), "prompts:\n  system: s\n  user: \"{x}\"\n").unwrap();
        fs::write(root.join("personas/p.yaml"), "x: persona\n").unwrap();
        temp
    }

    #[test]
    fn test_open_and_list() {
        let temp = setup();
        let ws = Workspace::open(temp.path()).unwrap();
        assert_eq!(ws.agent_names().unwrap(), vec!["echo"]);
        assert_eq!(ws.personas().names().unwrap(), vec!["p"]);
        assert_eq!(ws.root(), temp.path());
    }

    #[test]
    fn test_get_agent_config() {
        let temp = setup();
        let ws = Workspace::open(temp.path()).unwrap();
        let overrides = RuntimeOverrides::with_args([("x".to_string(), Value::from("hi"))].into_iter().collect());
        let config = ws.get_agent_config("echo", &overrides).unwrap();
        assert_eq!(config.prompt.user, "hi");
        assert_eq!(config.model.identifier, "id-m");
    }

    #[test]
    fn test_agents_share_settings_across_threads() {
        let temp = setup();
        let ws = Workspace::open(temp.path()).unwrap();

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let mut agent = ws.agent("echo", Box::new(EchoGenerator), Box::new(DefaultHooks)).unwrap();
                std::thread::spawn(move || {
                    let overrides =
                        RuntimeOverrides::with_args([("x".to_string(), Value::from(format!("call {i}")))].into_iter().collect());
                    agent.run(&overrides).map(|out| out.raw)
                })
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            assert_eq!(handle.join().unwrap().unwrap(), format!("call {i}"));
        }
    }

    fn models_with(identifier: &str) -> String {
        format!(
            "default_model:\n  api: a\n  model: m\nlibrary:\n  a:\n    classes:\n      c:\n        models:\n          m:\n            identifier: {identifier}\n"
        )
    }

    fn args_x(value: &str) -> RuntimeOverrides {
        RuntimeOverrides::with_args([("x".to_string(), Value::from(value))].into_iter().collect())
    }

    #[test]
    fn test_on_the_fly_picks_up_settings_edits() {
        let temp = setup();
        fs::write(temp.path().join("settings/system.yaml"), "misc:\n  on_the_fly: true\n").unwrap();
        fs::write(temp.path().join("settings/models.yaml"), models_with("old-id")).unwrap();
        let ws = Workspace::open(temp.path()).unwrap();

        assert_eq!(ws.get_agent_config("echo", &args_x("a")).unwrap().model.identifier, "old-id");

        fs::write(temp.path().join("settings/models.yaml"), models_with("new-id")).unwrap();
        fs::write(temp.path().join("prompts/echo.yaml"), "prompts:\n  system: s\n  user: \"now {x}\"\n").unwrap();

        let config = ws.get_agent_config("echo", &args_x("b")).unwrap();
        assert_eq!(config.model.identifier, "new-id");
        assert_eq!(config.prompt.user, "now b");
        assert_eq!(ws.settings().models.find("a", "m").unwrap().identifier, "new-id");
    }

    #[test]
    fn test_without_on_the_fly_sources_load_once() {
        let temp = setup();
        let ws = Workspace::open(temp.path()).unwrap();

        assert_eq!(ws.get_agent_config("echo", &args_x("before")).unwrap().prompt.user, "before");

        fs::write(temp.path().join("prompts/echo.yaml"), "prompts:\n  system: s\n  user: \"changed {x}\"\n").unwrap();
        fs::write(temp.path().join("settings/models.yaml"), models_with("new-id")).unwrap();

        let config = ws.get_agent_config("echo", &args_x("after")).unwrap();
        assert_eq!(config.prompt.user, "after");
        assert_eq!(config.model.identifier, "id-m");
    }

    #[test]
    fn test_failed_first_load_is_not_cached() {
        let temp = setup();
        let ws = Workspace::open(temp.path()).unwrap();
        assert!(ws.get_agent_config("late", &args_x("v")).is_err());

        fs::write(temp.path().join("prompts/late.yaml"), "prompts:\n  system: s\n  user: \"{x}\"\n").unwrap();
        assert_eq!(ws.get_agent_config("late", &args_x("v")).unwrap().prompt.user, "v");
    }

    #[test]
    fn test_get_agent_config_from_many_threads() {
        let temp = setup();
        let ws = Workspace::open(temp.path()).unwrap();

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let ws = ws.clone();
                std::thread::spawn(move || ws.get_agent_config("echo", &args_x(&format!("t{i}"))).map(|c| c.prompt.user))
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            assert_eq!(handle.join().unwrap().unwrap(), format!("t{i}"));
        }
    }
}
